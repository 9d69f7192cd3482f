use super::{Actor, ActorType};
use crate::{
	system::{
		core::DocumentId,
		mythcraft::{
			advancement::{AdvancementKind, Selection},
			formula::{self, RollData},
			SystemConfig,
		},
	},
	utility::AddAssignMap,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct SkillBonus {
	pub attribute: i32,
	pub base: i32,
	pub advancement: u32,
	pub total: i32,
}

/// Values computed from an actor and its items, never persisted.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
	pub skills: BTreeMap<String, SkillBonus>,
	pub bloodied: i32,
	pub bonus_ap: i32,
	pub defenses: BTreeMap<String, i32>,
	pub max_uses: BTreeMap<DocumentId, i32>,
}

impl Actor {
	/// Total skill points granted by every resolved skill advancement on this actor's items.
	pub fn advancement_points(&self) -> BTreeMap<String, u32> {
		let mut points = BTreeMap::new();
		for item in &self.items {
			for (advancement_id, selection) in &item.flags.mythcraft.advancement.selections {
				let Some(advancement) = item.advancement(advancement_id) else {
					log::error!(
						"Item {:?} records a selection for advancement {advancement_id} which it does not have",
						item.name
					);
					continue;
				};
				match (&advancement.kind, selection) {
					(AdvancementKind::Skill(_), Selection::Skills(spent)) => points.add_assign_map(spent),
					(AdvancementKind::ItemGrant(_), Selection::Items(_)) => {}
					(kind, selection) => {
						log::error!(
							"Advancement {advancement_id} on {:?} is a {} advancement but records a {} selection",
							item.name,
							kind.name(),
							selection.kind_name()
						);
					}
				}
			}
		}
		points
	}

	fn skill_bonuses(&self, config: &SystemConfig) -> BTreeMap<String, SkillBonus> {
		let points = self.advancement_points();
		let mut skills = BTreeMap::new();
		for (key, skill) in &config.skills {
			let attribute = self.attribute(&skill.attribute, config).unwrap_or_default();
			let base = self.system.skills.get(key).map(|score| score.value).unwrap_or_default();
			let advancement = points.get(key).copied().unwrap_or_default();
			let total = attribute + base + advancement as i32;
			skills.insert(key.clone(), SkillBonus { attribute, base, advancement, total });
		}
		skills
	}

	/// The values formulas on this actor may reference: lowercase attributes, `level`, and skill bonuses.
	pub fn roll_data(&self, config: &SystemConfig) -> RollData {
		let mut data = RollData::default();
		for key in config.attributes.keys() {
			if let Some(value) = self.attribute(key, config) {
				data.insert(key, value);
			}
		}
		data.insert("level", self.level() as i32);
		for (key, bonus) in self.skill_bonuses(config) {
			data.insert(key, bonus.total);
		}
		data
	}
}

impl Derived {
	pub fn compute(actor: &Actor, config: &SystemConfig, rng: &mut impl rand::Rng) -> Self {
		let data = actor.roll_data(config);
		let bonus_ap = match actor.kind {
			ActorType::Character => config.bonus_ap(actor.attribute("cor", config).unwrap_or_default()),
			ActorType::Npc => 0,
		};
		let defenses = config
			.defenses
			.iter()
			.map(|(key, source)| (key.clone(), formula::evaluate(source, &data)))
			.collect();
		let mut max_uses = BTreeMap::new();
		for item in &actor.items {
			if let Some(value) = item.max_uses(&data, rng) {
				max_uses.insert(item.id.clone(), value);
			}
		}
		Self {
			skills: actor.skill_bonuses(config),
			bloodied: actor.system.hp.max.div_euclid(2),
			bonus_ap,
			defenses,
			max_uses,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::system::mythcraft::{
		advancement::fixtures::{item_grant, skill_grant},
		advancement::ChooseN,
		data::{actor::test::character, item::test::item, ItemType, Score},
	};
	use rand::{rngs::StdRng, SeedableRng};

	fn actor() -> Actor {
		let mut background = item(
			"background00000",
			"Sailor",
			ItemType::Background,
			vec![
				skill_grant("skills", None, 3, &["athletics", "perceiving"], &[]),
				item_grant("kit", None, ChooseN::Count(1), &["rope"]),
			],
		);
		let selections = &mut background.flags.mythcraft.advancement.selections;
		let points: [(String, u32); 2] = [("athletics".into(), 2), ("perceiving".into(), 1)];
		selections.insert("skills".into(), Selection::Skills(points.into()));
		selections.insert("kit".into(), Selection::Items(["rope".into()].into()));
		let mut lineage = item(
			"lineage0000000",
			"Dwarf",
			ItemType::Lineage,
			vec![skill_grant("skills", None, 1, &["athletics"], &[])],
		);
		lineage
			.flags
			.mythcraft
			.advancement
			.selections
			.insert("skills".into(), Selection::Skills([("athletics".into(), 1)].into()));
		let mut actor = character(2, vec![background, lineage]);
		actor.system.attributes.insert("str".into(), Score { value: 3 });
		actor.system.attributes.insert("dex".into(), Score { value: 1 });
		actor.system.attributes.insert("cor".into(), Score { value: -2 });
		actor.system.skills.insert("athletics".into(), Score { value: 1 });
		actor.system.hp.max = 15;
		actor
	}

	#[test]
	fn skill_bonuses_include_advancement_points() {
		let config = SystemConfig::default();
		let mut rng = StdRng::seed_from_u64(0);
		let derived = Derived::compute(&actor(), &config, &mut rng);
		assert_eq!(
			derived.skills.get("athletics"),
			Some(&SkillBonus { attribute: 3, base: 1, advancement: 3, total: 7 })
		);
		assert_eq!(derived.skills.get("perceiving").map(|s| s.total), Some(1));
		assert_eq!(derived.skills.get("stealth").map(|s| s.total), Some(1));
	}

	#[test]
	fn derived_statistics() {
		let config = SystemConfig::default();
		let mut rng = StdRng::seed_from_u64(0);
		let derived = Derived::compute(&actor(), &config, &mut rng);
		assert_eq!(derived.bloodied, 7);
		assert_eq!(derived.bonus_ap, -1);
		assert_eq!(derived.defenses.get("parry"), Some(&11));
		assert_eq!(derived.defenses.get("fortitude"), Some(&10));
		assert!(derived.max_uses.is_empty());
	}

	#[test]
	fn mismatched_selection_is_skipped() {
		let mut actor = actor();
		actor.items[1]
			.flags
			.mythcraft
			.advancement
			.selections
			.insert("skills".into(), Selection::Items(["rope".into()].into()));
		actor.items[1]
			.flags
			.mythcraft
			.advancement
			.selections
			.insert("missing".into(), Selection::Skills([("athletics".into(), 9)].into()));
		assert_eq!(actor.advancement_points().get("athletics"), Some(&2));
	}

	#[test]
	fn roll_data_references() {
		let config = SystemConfig::default();
		let data = actor().roll_data(&config);
		assert_eq!(data.get("STR"), Some(3));
		assert_eq!(data.get("level"), Some(2));
		assert_eq!(data.get("athletics"), Some(7));
		assert_eq!(formula::evaluate("10 + @DEX", &data), 11);
	}
}
