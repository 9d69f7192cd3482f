use crate::system::{core::DocumentId, mythcraft::advancement::Selection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespaced flags stored on an item document.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ItemFlags {
	#[serde(default)]
	pub mythcraft: SystemFlags,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct SystemFlags {
	#[serde(default)]
	pub advancement: AdvancementFlags,
}

/// Advancement bookkeeping for one item.
///
/// Items granted by an advancement carry their provenance (`parent_id`, `advancement_id`, and the
/// candidate `source` they were created from). Items that own advancements carry the selection made
/// for each of their resolved advancements, keyed by advancement id.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancementFlags {
	#[serde(default = "AdvancementFlags::current_version")]
	pub version: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<DocumentId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub advancement_id: Option<DocumentId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub selections: BTreeMap<DocumentId, Selection>,
}

impl Default for AdvancementFlags {
	fn default() -> Self {
		Self {
			version: Self::VERSION,
			parent_id: None,
			advancement_id: None,
			source: None,
			selections: BTreeMap::new(),
		}
	}
}

impl AdvancementFlags {
	pub const VERSION: u32 = 1;

	fn current_version() -> u32 {
		Self::VERSION
	}

	/// The host document path of the flag recording `advancement_id`'s selection.
	pub fn selection_path(advancement_id: &DocumentId) -> String {
		format!("flags.mythcraft.advancement.selections.{advancement_id}")
	}

	/// Returns true if this item was granted by `advancement_id` on `parent_id`.
	pub fn granted_by(&self, parent_id: &DocumentId, advancement_id: &DocumentId) -> bool {
		self.parent_id.as_ref() == Some(parent_id) && self.advancement_id.as_ref() == Some(advancement_id)
	}
}
