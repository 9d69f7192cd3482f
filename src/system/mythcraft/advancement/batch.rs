use super::{LevelRange, Progression, Selection};
use crate::{
	system::{
		core::DocumentId,
		mythcraft::data::{Actor, AdvancementFlags, Item, Score},
	},
	utility::list_as_english,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Changes to an existing item's recorded advancement selections.
#[derive(Clone, PartialEq, Debug)]
pub struct ItemUpdate {
	pub id: DocumentId,
	pub selections: BTreeMap<DocumentId, Selection>,
}

impl ItemUpdate {
	pub fn new(id: DocumentId) -> Self {
		Self { id, selections: BTreeMap::new() }
	}

	/// Folds another update for the same item into this one.
	/// Selections for different advancements are kept side by side.
	pub fn merge(&mut self, other: Self) {
		self.selections.extend(other.selections);
	}

	/// The update in the host's document-update shape, using dotted property paths.
	pub fn to_payload(&self) -> Value {
		let mut payload = Map::new();
		payload.insert("_id".into(), Value::String(self.id.to_string()));
		for (advancement_id, selection) in &self.selections {
			let value = serde_json::to_value(selection).unwrap_or(Value::Null);
			payload.insert(AdvancementFlags::selection_path(advancement_id), value);
		}
		Value::Object(payload)
	}

	pub fn apply_to(&self, item: &mut Item) {
		let flags = &mut item.flags.mythcraft.advancement;
		for (advancement_id, selection) in &self.selections {
			flags.selections.insert(advancement_id.clone(), selection.clone());
		}
	}
}

/// Changes to the actor itself.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ActorUpdate {
	/// Base values for skills the actor gained points in but has no entry for yet.
	pub skills: BTreeMap<String, i32>,
}

impl ActorUpdate {
	pub fn is_empty(&self) -> bool {
		self.skills.is_empty()
	}

	pub fn merge(&mut self, other: Self) {
		for (key, value) in other.skills {
			self.skills.entry(key).or_insert(value);
		}
	}

	pub fn to_payload(&self) -> Value {
		let mut payload = Map::new();
		for (key, value) in &self.skills {
			payload.insert(format!("system.skills.{key}.value"), Value::from(*value));
		}
		Value::Object(payload)
	}

	pub fn apply_to(&self, actor: &mut Actor) {
		for (key, value) in &self.skills {
			actor.system.skills.insert(key.clone(), Score { value: *value });
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Reason {
	Advance,
	Reconfigure,
}

/// Attached to every operation of a committed batch, so observers can describe what happened.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMeta {
	pub kind: Progression,
	#[serde(flatten)]
	pub range: LevelRange,
	pub reason: Reason,
	pub actor: String,
	/// Names of the items whose advancements were resolved.
	pub sources: Vec<String>,
}

impl OperationMeta {
	/// A one-sentence English summary, e.g. "Aria advanced Smithing from rank 1 to 3."
	pub fn describe(&self) -> String {
		let noun = self.kind.noun();
		let sources = list_as_english(self.sources.clone(), "and");
		match (self.reason, self.range.start, sources) {
			(Reason::Reconfigure, _, Some(sources)) => format!("{} reconfigured {sources}.", self.actor),
			(Reason::Reconfigure, _, None) => format!("{} reconfigured an advancement.", self.actor),
			(Reason::Advance, None, Some(sources)) => {
				format!("{} acquired {sources} at {noun} {}.", self.actor, self.range.end)
			}
			(Reason::Advance, None, None) => {
				format!("{} acquired advancements at {noun} {}.", self.actor, self.range.end)
			}
			(Reason::Advance, Some(start), Some(sources)) => {
				format!("{} advanced {sources} from {noun} {start} to {}.", self.actor, self.range.end)
			}
			(Reason::Advance, Some(start), None) => {
				format!("{} advanced from {noun} {start} to {}.", self.actor, self.range.end)
			}
		}
	}
}

/// Every document change an advancement run will commit.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct StagedBatch {
	pub creates: Vec<Item>,
	pub updates: BTreeMap<DocumentId, ItemUpdate>,
	pub deletes: Vec<DocumentId>,
	pub actor: ActorUpdate,
}

impl StagedBatch {
	pub fn is_empty(&self) -> bool {
		self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty() && self.actor.is_empty()
	}

	/// Records the selection made for `advancement_id` on `item_id`.
	///
	/// If the item is itself created by this batch, the selection is written into its creation
	/// payload, otherwise it is merged into that item's update.
	pub fn record_selection(&mut self, item_id: &DocumentId, advancement_id: &DocumentId, selection: Selection) {
		if let Some(item) = self.creates.iter_mut().find(|item| &item.id == item_id) {
			let flags = &mut item.flags.mythcraft.advancement;
			flags.selections.insert(advancement_id.clone(), selection);
			return;
		}
		let mut update = ItemUpdate::new(item_id.clone());
		update.selections.insert(advancement_id.clone(), selection);
		match self.updates.get_mut(item_id) {
			Some(existing) => existing.merge(update),
			None => {
				self.updates.insert(item_id.clone(), update);
			}
		}
	}

	pub fn create(&mut self, item: Item) {
		self.creates.push(item);
	}

	pub fn delete(&mut self, id: DocumentId) {
		if !self.deletes.contains(&id) {
			self.deletes.push(id);
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::system::mythcraft::data::{fixtures::item, ItemType};
	use serde_json::json;

	fn points(entries: &[(&str, u32)]) -> Selection {
		Selection::Skills(entries.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect())
	}

	#[test]
	fn updates_to_one_item_merge() {
		let mut batch = StagedBatch::default();
		let item = DocumentId::from("background0000");
		batch.record_selection(&item, &"skills".into(), points(&[("athletics", 2)]));
		batch.record_selection(&item, &"more".into(), points(&[("stealth", 1)]));
		assert_eq!(batch.updates.len(), 1);
		let payload = batch.updates[&item].to_payload();
		assert_eq!(
			payload,
			json!({
				"_id": "background0000",
				"flags.mythcraft.advancement.selections.skills": { "athletics": 2 },
				"flags.mythcraft.advancement.selections.more": { "stealth": 1 },
			})
		);
	}

	#[test]
	fn selections_on_created_items_are_embedded() {
		let mut batch = StagedBatch::default();
		batch.create(item("lineage0000000", "Elf", ItemType::Lineage, vec![]));
		batch.record_selection(&"lineage0000000".into(), &"skills".into(), points(&[("perceiving", 1)]));
		assert!(batch.updates.is_empty());
		assert_eq!(batch.creates[0].flags.mythcraft.advancement.selections.len(), 1);
	}

	#[test]
	fn actor_payload() {
		let mut update = ActorUpdate::default();
		update.merge(ActorUpdate { skills: [("stealth".into(), 0)].into() });
		update.merge(ActorUpdate { skills: [("stealth".into(), 4)].into() });
		assert_eq!(update.to_payload(), json!({ "system.skills.stealth.value": 0 }));
		assert!(!update.is_empty());
	}

	#[test]
	fn describe_operations() {
		let mut meta = OperationMeta {
			kind: Progression::Rank,
			range: LevelRange::between(1, 3),
			reason: Reason::Advance,
			actor: "Aria".into(),
			sources: vec!["Smithing".into()],
		};
		assert_eq!(meta.describe(), "Aria advanced Smithing from rank 1 to 3.");
		meta.kind = Progression::Level;
		meta.range = LevelRange::acquisition(2);
		meta.sources = vec!["Elf".into(), "Sailor".into()];
		assert_eq!(meta.describe(), "Aria acquired Elf and Sailor at level 2.");
		meta.reason = Reason::Reconfigure;
		assert_eq!(meta.describe(), "Aria reconfigured Elf and Sailor.");
		let value = serde_json::to_value(&meta).unwrap_or_default();
		assert_eq!(value["kind"], "level");
		assert_eq!(value["start"], Value::Null);
		assert_eq!(value["end"], 2);
	}
}
