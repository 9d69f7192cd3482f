use super::{
	Advancement, AdvancementKind, CandidateResolver, Candidate, Choice, ChoiceDialog, ChoiceOptions, ChoiceRequest,
	LevelRange, Selection,
};
use crate::system::mythcraft::{data::Item, SystemConfig};
use std::collections::BTreeMap;

/// One advancement of an item, paired with the candidate documents it may grant.
#[derive(Clone, Debug)]
pub struct AdvancementNode<'a> {
	pub item: &'a Item,
	pub advancement: &'a Advancement,
	/// Resolved item grant candidates, keyed by uuid. Always empty for skill grants.
	choices: BTreeMap<String, Item>,
}

impl<'a> AdvancementNode<'a> {
	pub async fn build(item: &'a Item, advancement: &'a Advancement, resolver: &dyn CandidateResolver) -> Self {
		let mut choices = BTreeMap::new();
		if let AdvancementKind::ItemGrant(grant) = &advancement.kind {
			for reference in &grant.pool {
				match resolver.resolve(&reference.uuid).await {
					Some(candidate) => {
						choices.insert(reference.uuid.clone(), candidate);
					}
					None => {
						log::warn!(
							"Candidate {:?} ({}) of advancement {} on {:?} could not be found",
							reference.name,
							reference.uuid,
							advancement.id,
							item.name
						);
					}
				}
			}
		}
		Self { item, advancement, choices }
	}

	pub fn level(&self) -> Option<u32> {
		self.advancement.level
	}

	pub fn is_choice(&self) -> bool {
		self.advancement.is_choice()
	}

	/// How many items must be chosen, or how many points must be spent.
	pub fn choose_n(&self) -> usize {
		match &self.advancement.kind {
			AdvancementKind::ItemGrant(grant) => {
				let count = grant.choose.count(self.choices.len());
				if count > self.choices.len() {
					log::warn!(
						"Advancement {} on {:?} chooses {count} items but only {} candidates are available",
						self.advancement.id,
						self.item.name,
						self.choices.len()
					);
				}
				count.min(self.choices.len())
			}
			AdvancementKind::Skill(grant) => grant.points as usize,
		}
	}

	pub fn choices(&self) -> &BTreeMap<String, Item> {
		&self.choices
	}

	pub fn is_active(&self, range: &LevelRange) -> bool {
		range.contains(self.level())
	}

	/// Returns true if a selection has been recorded for this advancement, whether or not it is well formed.
	pub fn is_resolved(&self) -> bool {
		self.item.flags.mythcraft.advancement.selections.contains_key(&self.advancement.id)
	}

	/// The recorded selection, if it has the shape this advancement expects.
	pub fn chosen_selection(&self) -> Option<&'a Selection> {
		let selection = self.item.flags.mythcraft.advancement.selections.get(&self.advancement.id)?;
		if !selection.matches(&self.advancement.kind) {
			log::error!(
				"Advancement {} on {:?} is a {} advancement but records a {} selection",
				self.advancement.id,
				self.item.name,
				self.advancement.kind.name(),
				selection.kind_name()
			);
			return None;
		}
		Some(selection)
	}

	pub fn request(
		&self,
		config: &SystemConfig,
		existing: Option<&'a Selection>,
		range: Option<LevelRange>,
	) -> ChoiceRequest<'a> {
		let options = match &self.advancement.kind {
			AdvancementKind::ItemGrant(grant) => ChoiceOptions::Items {
				candidates: grant
					.pool
					.iter()
					.filter(|reference| self.choices.contains_key(&reference.uuid))
					.map(|reference| Candidate {
						uuid: reference.uuid.clone(),
						name: reference.name.clone(),
						img: reference.img.clone(),
					})
					.collect(),
				count: self.choose_n(),
			},
			AdvancementKind::Skill(grant) => ChoiceOptions::Skills {
				points: grant.points,
				skills: grant.eligible(config),
			},
		};
		ChoiceRequest { item: self.item, advancement: self.advancement, options, existing, range }
	}

	/// Asks the player to resolve this advancement.
	///
	/// Returns `None` if the player cancelled. A selection which does not satisfy the advancement
	/// is treated the same as a cancellation.
	pub async fn configure(
		&self,
		dialog: &dyn ChoiceDialog,
		config: &SystemConfig,
		existing: Option<&'a Selection>,
		range: Option<LevelRange>,
	) -> Option<Selection> {
		let request = self.request(config, existing, range);
		let selection = match dialog.configure(&request).await {
			Choice::Selected(selection) => selection,
			Choice::Cancelled => return None,
		};
		let candidates = self.choices.keys().map(String::as_str);
		if let Err(err) = selection.validate(self.advancement, candidates, config) {
			log::warn!(
				"Rejected selection for advancement {} on {:?}: {err}",
				self.advancement.id,
				self.item.name
			);
			return None;
		}
		Some(selection)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::system::mythcraft::{
		advancement::{fixtures::*, ChooseN, MapResolver, ScriptedDialog},
		data::{fixtures::item, ItemType},
	};
	use futures::executor::block_on;

	fn resolver(uuids: &[&str]) -> MapResolver {
		let mut resolver = MapResolver::default();
		for uuid in uuids {
			resolver.insert(*uuid, item(uuid, uuid, ItemType::Weapon, vec![]));
		}
		resolver
	}

	#[test]
	fn unresolved_candidates_clamp_choose() {
		let lineage = item(
			"lineage0000000",
			"Elf",
			ItemType::Lineage,
			vec![item_grant("grant", Some(1), ChooseN::Count(2), &["bow", "missing"])],
		);
		let node = block_on(AdvancementNode::build(&lineage, &lineage.system.advancements[0], &resolver(&["bow"])));
		assert_eq!(node.choices().len(), 1);
		assert_eq!(node.choose_n(), 1);
		let request = node.request(&SystemConfig::default(), None, None);
		let ChoiceOptions::Items { candidates, count } = request.options else {
			panic!("expected item options");
		};
		assert_eq!(count, 1);
		assert_eq!(candidates.iter().map(|c| c.uuid.as_str()).collect::<Vec<_>>(), vec!["bow"]);
	}

	#[test]
	fn skill_nodes_choose_points() {
		let background = item(
			"background0000",
			"Sailor",
			ItemType::Background,
			vec![skill_grant("skills", None, 3, &["athletics"], &[])],
		);
		let node = block_on(AdvancementNode::build(&background, &background.system.advancements[0], &resolver(&[])));
		assert!(node.is_choice());
		assert_eq!(node.choose_n(), 3);
		assert!(node.is_active(&LevelRange::acquisition(1)));
		assert!(!node.is_active(&LevelRange::between(1, 2)));
	}

	#[test]
	fn configure_validates_selection() {
		let config = SystemConfig::default();
		let background = item(
			"background0000",
			"Sailor",
			ItemType::Background,
			vec![skill_grant("skills", None, 3, &["athletics", "perceiving"], &[])],
		);
		let node = block_on(AdvancementNode::build(&background, &background.system.advancements[0], &resolver(&[])));

		let accepted = Selection::Skills([("athletics".into(), 2), ("perceiving".into(), 1)].into());
		let dialog = ScriptedDialog::default().with_answer("skills", accepted.clone());
		assert_eq!(block_on(node.configure(&dialog, &config, None, None)), Some(accepted));

		let rejected = Selection::Skills([("athletics".into(), 4)].into());
		let dialog = ScriptedDialog::default().with_answer("skills", rejected);
		assert_eq!(block_on(node.configure(&dialog, &config, None, None)), None);

		assert_eq!(block_on(node.configure(&ScriptedDialog::default(), &config, None, None)), None);
	}

	#[test]
	fn malformed_selection_is_resolved_but_not_chosen() {
		let mut lineage = item(
			"lineage0000000",
			"Elf",
			ItemType::Lineage,
			vec![item_grant("grant", None, ChooseN::Count(1), &["bow"])],
		);
		lineage
			.flags
			.mythcraft
			.advancement
			.selections
			.insert("grant".into(), Selection::Skills([("athletics".into(), 1)].into()));
		let node = block_on(AdvancementNode::build(&lineage, &lineage.system.advancements[0], &resolver(&["bow"])));
		assert!(node.is_resolved());
		assert_eq!(node.chosen_selection(), None);
	}
}
