use super::{AdvancementNode, CandidateResolver, LevelRange};
use crate::system::{core::DocumentId, mythcraft::data::Item};

/// The advancements of one item, ordered by the level (or rank) which unlocks them.
#[derive(Clone, Debug)]
pub struct AdvancementChain<'a> {
	item: &'a Item,
	nodes: Vec<AdvancementNode<'a>>,
}

impl<'a> AdvancementChain<'a> {
	/// Advancements without a level requirement come first, then ascending by level.
	/// Advancements sharing a level keep the order they are declared in.
	pub async fn build(item: &'a Item, resolver: &dyn CandidateResolver) -> AdvancementChain<'a> {
		let mut nodes = Vec::with_capacity(item.advancements().len());
		for advancement in item.advancements() {
			nodes.push(AdvancementNode::build(item, advancement, resolver).await);
		}
		nodes.sort_by_key(|node| node.level());
		log::debug!("Built advancement chain for {:?} with {} nodes", item.name, nodes.len());
		Self { item, nodes }
	}

	pub fn item(&self) -> &'a Item {
		self.item
	}

	pub fn nodes(&self) -> &[AdvancementNode<'a>] {
		&self.nodes
	}

	pub fn node(&self, advancement_id: &DocumentId) -> Option<&AdvancementNode<'a>> {
		self.nodes.iter().find(|node| &node.advancement.id == advancement_id)
	}

	/// Nodes unlocked by `range` which have not been resolved yet, in ascending level order.
	pub fn active<'s>(&'s self, range: LevelRange) -> impl Iterator<Item = &'s AdvancementNode<'a>> + 's {
		self.nodes.iter().filter(move |node| node.is_active(&range) && !node.is_resolved())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::system::mythcraft::{
		advancement::{fixtures::*, ChooseN, MapResolver, Selection},
		data::{fixtures::item, ItemType},
	};
	use futures::executor::block_on;

	fn lineage() -> Item {
		item(
			"lineage0000000",
			"Elf",
			ItemType::Lineage,
			vec![
				item_grant("five", Some(5), ChooseN::All, &[]),
				skill_grant("three", Some(3), 1, &["athletics"], &[]),
				skill_grant("innate", None, 1, &["perceiving"], &[]),
				item_grant("fourA", Some(4), ChooseN::All, &[]),
				item_grant("fourB", Some(4), ChooseN::All, &[]),
				item_grant("six", Some(6), ChooseN::All, &[]),
			],
		)
	}

	fn ids<'s, 'a: 's>(nodes: impl Iterator<Item = &'s AdvancementNode<'a>>) -> Vec<&'s str> {
		nodes.map(|node| node.advancement.id.as_str()).collect()
	}

	#[test]
	fn sorted_by_level() {
		let item = lineage();
		let chain = block_on(AdvancementChain::build(&item, &MapResolver::default()));
		assert_eq!(ids(chain.nodes().iter()), vec!["innate", "three", "fourA", "fourB", "five", "six"]);
	}

	#[test]
	fn active_in_half_open_range() {
		let item = lineage();
		let chain = block_on(AdvancementChain::build(&item, &MapResolver::default()));
		assert_eq!(ids(chain.active(LevelRange::between(3, 5))), vec!["fourA", "fourB", "five"]);
		assert_eq!(ids(chain.active(LevelRange::between(2, 5))), vec!["three", "fourA", "fourB", "five"]);
		assert_eq!(ids(chain.active(LevelRange::acquisition(3))), vec!["innate", "three"]);
		assert_eq!(chain.active(LevelRange::between(6, 6)).count(), 0);
	}

	#[test]
	fn level_skip_triggers_every_level() {
		let item = lineage();
		let chain = block_on(AdvancementChain::build(&item, &MapResolver::default()));
		let levels = chain.active(LevelRange::between(1, 10)).filter_map(|node| node.level()).collect::<Vec<_>>();
		assert_eq!(levels, vec![3, 4, 4, 5, 6]);
	}

	#[test]
	fn resolved_nodes_are_skipped() {
		let mut item = lineage();
		let selections = &mut item.flags.mythcraft.advancement.selections;
		selections.insert("three".into(), Selection::Skills([("athletics".into(), 1)].into()));
		selections.insert("fourA".into(), Selection::Items(Default::default()));
		let chain = block_on(AdvancementChain::build(&item, &MapResolver::default()));
		assert_eq!(ids(chain.active(LevelRange::between(2, 5))), vec!["fourB", "five"]);
		assert!(chain.node(&"three".into()).is_some());
		assert!(chain.node(&"seven".into()).is_none());
	}
}
