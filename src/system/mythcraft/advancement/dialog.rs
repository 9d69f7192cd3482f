use super::{Advancement, LevelRange, Selection, SkillOption};
use crate::{
	system::{core::DocumentId, mythcraft::data::Item},
	utility::PinFutureLifetime,
};
use std::{collections::BTreeMap, sync::Mutex};

/// The player's answer to a [`ChoiceRequest`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Choice {
	Selected(Selection),
	Cancelled,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Candidate {
	pub uuid: String,
	pub name: String,
	pub img: Option<String>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ChoiceOptions {
	/// Pick exactly `count` of the candidates.
	Items { candidates: Vec<Candidate>, count: usize },
	/// Spend exactly `points` among the skills, each up to its own maximum.
	Skills { points: u32, skills: Vec<SkillOption> },
}

/// Everything a choice dialog needs to present one advancement to the player.
#[derive(Clone, Debug)]
pub struct ChoiceRequest<'a> {
	pub item: &'a Item,
	pub advancement: &'a Advancement,
	pub options: ChoiceOptions,
	/// The selection recorded previously, when reconfiguring.
	pub existing: Option<&'a Selection>,
	pub range: Option<LevelRange>,
}

/// Presents advancement choices to the player and waits for their answer.
pub trait ChoiceDialog: Send + Sync {
	fn configure<'this>(&'this self, request: &'this ChoiceRequest<'this>) -> PinFutureLifetime<'this, Choice>;
}

/// Looks up the documents that item grant candidates refer to.
pub trait CandidateResolver: Send + Sync {
	fn resolve<'this>(&'this self, uuid: &'this str) -> PinFutureLifetime<'this, Option<Item>>;
}

/// Resolves candidates from a fixed table of uuid to item.
#[derive(Clone, Debug, Default)]
pub struct MapResolver(BTreeMap<String, Item>);

impl MapResolver {
	pub fn insert(&mut self, uuid: impl Into<String>, item: Item) {
		self.0.insert(uuid.into(), item);
	}
}

impl From<BTreeMap<String, Item>> for MapResolver {
	fn from(items: BTreeMap<String, Item>) -> Self {
		Self(items)
	}
}

impl CandidateResolver for MapResolver {
	fn resolve<'this>(&'this self, uuid: &'this str) -> PinFutureLifetime<'this, Option<Item>> {
		Box::pin(async move { self.0.get(uuid).cloned() })
	}
}

/// Answers choice requests from a prepared script instead of asking a player.
///
/// Answers are keyed by `<itemId>/<advancementId>` or by advancement id alone, the former taking
/// precedence. A request with no scripted answer is cancelled.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
	answers: BTreeMap<String, Selection>,
	asked: Mutex<Vec<(DocumentId, DocumentId)>>,
}

impl ScriptedDialog {
	pub fn new(answers: BTreeMap<String, Selection>) -> Self {
		Self { answers, asked: Mutex::new(Vec::new()) }
	}

	pub fn with_answer(mut self, key: impl Into<String>, selection: Selection) -> Self {
		self.answers.insert(key.into(), selection);
		self
	}

	/// The `(item id, advancement id)` of every request, in the order they were asked.
	pub fn asked(&self) -> Vec<(DocumentId, DocumentId)> {
		match self.asked.lock() {
			Ok(asked) => asked.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	fn answer(&self, item: &DocumentId, advancement: &DocumentId) -> Option<&Selection> {
		self.answers
			.get(&format!("{item}/{advancement}"))
			.or_else(|| self.answers.get(advancement.as_str()))
	}
}

impl ChoiceDialog for ScriptedDialog {
	fn configure<'this>(&'this self, request: &'this ChoiceRequest<'this>) -> PinFutureLifetime<'this, Choice> {
		Box::pin(async move {
			let key = (request.item.id.clone(), request.advancement.id.clone());
			match self.asked.lock() {
				Ok(mut asked) => asked.push(key),
				Err(poisoned) => poisoned.into_inner().push(key),
			}
			match self.answer(&request.item.id, &request.advancement.id) {
				Some(selection) => Choice::Selected(selection.clone()),
				None => {
					log::debug!(target: "dialog", "No scripted answer for {}, cancelling", request.advancement.id);
					Choice::Cancelled
				}
			}
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::system::mythcraft::{
		advancement::{fixtures::item_grant, ChooseN},
		data::{fixtures::item, ItemType},
	};
	use futures::executor::block_on;

	#[test]
	fn scripted_answers_prefer_item_scope() {
		let grant = item_grant("grant", None, ChooseN::Count(1), &["a", "b"]);
		let lineage = item("lineage0000000", "Elf", ItemType::Lineage, vec![grant.clone()]);
		let dialog = ScriptedDialog::default()
			.with_answer("grant", Selection::Items(["a".into()].into()))
			.with_answer("lineage0000000/grant", Selection::Items(["b".into()].into()));
		let request = ChoiceRequest {
			item: &lineage,
			advancement: &grant,
			options: ChoiceOptions::Items { candidates: vec![], count: 1 },
			existing: None,
			range: None,
		};
		assert_eq!(block_on(dialog.configure(&request)), Choice::Selected(Selection::Items(["b".into()].into())));

		let other = item("background0000", "Sailor", ItemType::Background, vec![grant.clone()]);
		let request = ChoiceRequest { item: &other, ..request };
		assert_eq!(block_on(dialog.configure(&request)), Choice::Selected(Selection::Items(["a".into()].into())));
		assert_eq!(dialog.asked().len(), 2);
	}

	#[test]
	fn missing_answer_cancels() {
		let grant = item_grant("grant", None, ChooseN::Count(1), &["a"]);
		let lineage = item("lineage0000000", "Elf", ItemType::Lineage, vec![grant.clone()]);
		let request = ChoiceRequest {
			item: &lineage,
			advancement: &grant,
			options: ChoiceOptions::Items { candidates: vec![], count: 1 },
			existing: None,
			range: None,
		};
		assert_eq!(block_on(ScriptedDialog::default().configure(&request)), Choice::Cancelled);
	}

	#[test]
	fn map_resolver() {
		let mut resolver = MapResolver::default();
		resolver.insert("Compendium.sword", item("sword0000000000", "Sword", ItemType::Weapon, vec![]));
		assert_eq!(block_on(resolver.resolve("Compendium.sword")).map(|item| item.name), Some("Sword".into()));
		assert_eq!(block_on(resolver.resolve("Compendium.axe")), None);
	}
}
