use super::{Item, Pool};
use crate::system::{
	core::DocumentId,
	mythcraft::{advancement::LevelRange, SystemConfig, ATTRIBUTE_RANGE},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActorType {
	Character,
	Npc,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Score {
	#[serde(default)]
	pub value: i32,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ActorData {
	#[serde(default = "ActorData::first_level")]
	pub level: u32,
	#[serde(default)]
	pub hp: Pool,
	/// Stamina points, only tracked for characters.
	#[serde(default)]
	pub sp: Pool,
	#[serde(default)]
	pub attributes: BTreeMap<String, Score>,
	/// Base skill values, before attributes and advancement points are added.
	#[serde(default)]
	pub skills: BTreeMap<String, Score>,
}

impl Default for ActorData {
	fn default() -> Self {
		Self {
			level: Self::first_level(),
			hp: Pool::default(),
			sp: Pool::default(),
			attributes: BTreeMap::new(),
			skills: BTreeMap::new(),
		}
	}
}

impl ActorData {
	fn first_level() -> u32 {
		1
	}
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Actor {
	#[serde(rename = "_id")]
	pub id: DocumentId,
	pub name: String,
	#[serde(rename = "type")]
	pub kind: ActorType,
	#[serde(default)]
	pub system: ActorData,
	#[serde(default)]
	pub items: Vec<Item>,
}

impl Actor {
	pub fn level(&self) -> u32 {
		self.system.level
	}

	/// The range of levels to advance through when the actor's level changes to `new_level`.
	/// Only characters advance, and only when their level increases.
	pub fn level_change(&self, new_level: u32) -> Option<LevelRange> {
		match self.kind {
			ActorType::Character if new_level > self.system.level => {
				Some(LevelRange::between(self.system.level, new_level))
			}
			_ => None,
		}
	}

	pub fn item(&self, id: &DocumentId) -> Option<&Item> {
		self.items.iter().find(|item| &item.id == id)
	}

	pub fn item_mut(&mut self, id: &DocumentId) -> Option<&mut Item> {
		self.items.iter_mut().find(|item| &item.id == id)
	}

	pub fn item_ids(&self) -> BTreeSet<DocumentId> {
		self.items.iter().map(|item| item.id.clone()).collect()
	}

	/// The clamped value of an attribute, or `None` if this actor cannot have that attribute.
	pub fn attribute(&self, key: &str, config: &SystemConfig) -> Option<i32> {
		let attribute = config.attributes.get(key)?;
		if attribute.character_only && self.kind != ActorType::Character {
			return None;
		}
		let value = self.system.attributes.get(key).map(|score| score.value).unwrap_or_default();
		Some(value.clamp(*ATTRIBUTE_RANGE.start(), *ATTRIBUTE_RANGE.end()))
	}

	/// Items which granted `advancement_id` on `parent_id`.
	pub fn granted_by<'a>(
		&'a self,
		parent_id: &'a DocumentId,
		advancement_id: &'a DocumentId,
	) -> impl Iterator<Item = &'a Item> + 'a {
		self.items
			.iter()
			.filter(move |item| item.flags.mythcraft.advancement.granted_by(parent_id, advancement_id))
	}
}
