use super::ItemFlags;
use crate::system::{
	core::DocumentId,
	mythcraft::{
		advancement::{Advancement, LevelRange},
		formula::{self, RollData},
		SystemConfig,
	},
};
use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};

#[derive(EnumSetType, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
	Lineage,
	Background,
	Profession,
	Talent,
	Feature,
	Occupation,
	Weapon,
	Armor,
	Gear,
	Equipment,
	Spell,
}

impl ItemType {
	/// Item types which may embed advancements.
	pub fn with_advancements() -> EnumSet<Self> {
		Self::Lineage | Self::Background | Self::Profession | Self::Talent | Self::Feature
	}

	pub fn supports_advancements(self) -> bool {
		Self::with_advancements().contains(self)
	}
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Uses {
	#[serde(default)]
	pub value: i32,
	/// A formula, possibly containing dice, for the maximum number of uses.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max: Option<String>,
}

/// The system-specific data of an item. Fields which don't apply to an item's type are left empty.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ItemData {
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub description: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub advancements: Vec<Advancement>,
	/// Profession rank.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rank: Option<u32>,
	/// The character level a feature is gained at.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub level: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uses: Option<Uses>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub prerequisites: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub incompatibilities: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Item {
	#[serde(rename = "_id", default)]
	pub id: DocumentId,
	pub name: String,
	#[serde(rename = "type")]
	pub kind: ItemType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub img: Option<String>,
	#[serde(default)]
	pub system: ItemData,
	#[serde(default)]
	pub flags: ItemFlags,
}

impl Item {
	pub fn supports_advancements(&self) -> bool {
		self.kind.supports_advancements()
	}

	pub fn advancements(&self) -> &[Advancement] {
		match self.supports_advancements() {
			true => &self.system.advancements,
			false => &[],
		}
	}

	pub fn advancement(&self, id: &DocumentId) -> Option<&Advancement> {
		self.advancements().iter().find(|advancement| &advancement.id == id)
	}

	/// The rank of a profession within the configured bounds, `None` for every other item type.
	pub fn rank(&self, config: &SystemConfig) -> Option<u32> {
		match self.kind {
			ItemType::Profession => {
				let bounds = &config.profession_ranks;
				Some(bounds.clamp(self.system.rank.unwrap_or(bounds.min)))
			}
			_ => None,
		}
	}

	/// The range of ranks to advance through when a profession's rank changes to `new_rank`.
	/// Returns `None` if this isn't a profession or the rank does not increase.
	/// A rank past the configured maximum advances only up to that maximum.
	pub fn rank_change(&self, new_rank: u32, config: &SystemConfig) -> Option<LevelRange> {
		let old_rank = self.rank(config)?;
		let new_rank = config.profession_ranks.clamp(new_rank);
		(new_rank > old_rank).then(|| LevelRange::between(old_rank, new_rank))
	}

	/// Evaluates the feature's maximum uses, rolling any dice in the formula.
	/// A malformed formula results in no value.
	pub fn max_uses(&self, data: &RollData, rng: &mut impl rand::Rng) -> Option<i32> {
		let formula = self.system.uses.as_ref()?.max.as_ref()?;
		match formula::roll(formula, data, rng) {
			Ok(value) => Some(value),
			Err(err) => {
				log::warn!(target: "formula", "Failed to roll max uses {formula:?} of {:?}: {err}", self.name);
				None
			}
		}
	}
}

#[cfg(test)]
pub(crate) mod test {
	use super::*;
	use crate::system::mythcraft::advancement::ChooseN;
	use trim_margin::MarginTrimmable;

	pub(crate) fn item(id: &str, name: &str, kind: ItemType, advancements: Vec<Advancement>) -> Item {
		Item {
			id: id.into(),
			name: name.into(),
			kind,
			img: None,
			system: ItemData { advancements, ..Default::default() },
			flags: ItemFlags::default(),
		}
	}

	#[test]
	fn parse_lineage() -> anyhow::Result<()> {
		let json = r#"
			|{
			|  "_id": "lineageHuman000",
			|  "name": "Human",
			|  "type": "lineage",
			|  "system": {
			|    "advancements": [
			|      {
			|        "_id": "feat", "type": "itemGrant", "level": null,
			|        "pool": [{ "uuid": "x", "name": "Adaptable" }], "choose": "all"
			|      }
			|    ]
			|  }
			|}
		"#
		.trim_margin()
		.unwrap_or_default();
		let item: Item = serde_json::from_str(&json)?;
		assert_eq!(item.kind, ItemType::Lineage);
		assert_eq!(item.advancements().len(), 1);
		assert!(item.advancement(&"feat".into()).is_some());
		assert!(item.flags.mythcraft.advancement.selections.is_empty());
		Ok(())
	}

	#[test]
	fn advancement_support_by_type() {
		let grant = crate::system::mythcraft::advancement::fixtures::item_grant("a", None, ChooseN::All, &["x"]);
		let weapon = item("w", "Sword", ItemType::Weapon, vec![grant.clone()]);
		assert!(!weapon.supports_advancements());
		assert!(weapon.advancements().is_empty());
		let talent = item("t", "Brawler", ItemType::Talent, vec![grant]);
		assert_eq!(talent.advancements().len(), 1);
		assert_eq!(ItemType::with_advancements().len(), 5);
	}

	#[test]
	fn profession_rank_change() {
		let mut profession = item("p", "Smithing", ItemType::Profession, vec![]);
		profession.system.rank = Some(2);
		let config = SystemConfig::default();
		assert_eq!(profession.rank_change(4, &config), Some(LevelRange::between(2, 4)));
		assert_eq!(profession.rank_change(2, &config), None);
		assert_eq!(profession.rank_change(1, &config), None);
		assert_eq!(item("f", "Dash", ItemType::Feature, vec![]).rank_change(3, &config), None);
	}

	#[test]
	fn profession_rank_respects_bounds() {
		let config = SystemConfig::default();
		let mut profession = item("p", "Smithing", ItemType::Profession, vec![]);
		assert_eq!(profession.rank(&config), Some(1));
		profession.system.rank = Some(2);
		assert_eq!(profession.rank_change(9, &config), Some(LevelRange::between(2, 5)));
		profession.system.rank = Some(7);
		assert_eq!(profession.rank(&config), Some(5));
		assert_eq!(profession.rank_change(9, &config), None);
		profession.system.rank = Some(0);
		assert_eq!(profession.rank(&config), Some(1));
	}

	#[test]
	fn max_uses() {
		let mut rng = rand::thread_rng();
		let data = RollData::from([("level", 4)]);
		let mut feature = item("f", "Second Wind", ItemType::Feature, vec![]);
		assert_eq!(feature.max_uses(&data, &mut rng), None);
		feature.system.uses = Some(Uses { value: 0, max: Some("1 + floor(@level / 2)".into()) });
		assert_eq!(feature.max_uses(&data, &mut rng), Some(3));
		feature.system.uses = Some(Uses { value: 0, max: Some("1d4 + @level".into()) });
		let rolled = feature.max_uses(&data, &mut rng);
		assert!(matches!(rolled, Some(5..=8)));
		feature.system.uses = Some(Uses { value: 0, max: Some("2 +".into()) });
		assert_eq!(feature.max_uses(&data, &mut rng), None);
	}
}
