use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
	#[error("Failed to read config file {0:?}: {1}")]
	Io(std::path::PathBuf, std::io::Error),
	#[error(transparent)]
	Parse(#[from] serde_json::Error),
	#[error("Skill {skill:?} is governed by unknown attribute {attribute:?}")]
	UnknownAttribute { skill: String, attribute: String },
	#[error("Profession ranks must satisfy 1 <= min <= max, found {0}..={1}")]
	InvalidRanks(u32, u32),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeGroup {
	Physical,
	Mental,
	Fate,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeConfig {
	pub label: String,
	pub group: AttributeGroup,
	/// Only characters carry this attribute, npcs do not.
	#[serde(default)]
	pub character_only: bool,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SkillConfig {
	pub label: String,
	/// The attribute whose value is added to this skill's bonus.
	pub attribute: String,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct RankBounds {
	pub min: u32,
	pub max: u32,
}
impl Default for RankBounds {
	fn default() -> Self {
		Self { min: 1, max: 5 }
	}
}
impl RankBounds {
	pub fn clamp(&self, rank: u32) -> u32 {
		rank.clamp(self.min, self.max)
	}
}

/// Lowest and highest value an attribute may hold.
pub const ATTRIBUTE_RANGE: std::ops::RangeInclusive<i32> = -3..=12;

/// Rules data consulted by the advancement engine and derived-data computation.
///
/// Constructed once and passed into each entry point, rather than read from shared state.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
	pub attributes: BTreeMap<String, AttributeConfig>,
	pub skills: BTreeMap<String, SkillConfig>,
	/// Action point modifier keyed by coordination score.
	#[serde(default)]
	pub bonus_ap: BTreeMap<i32, i32>,
	/// Deterministic formulas for each derived defense.
	#[serde(default)]
	pub defenses: BTreeMap<String, String>,
	#[serde(default)]
	pub profession_ranks: RankBounds,
}

impl Default for SystemConfig {
	fn default() -> Self {
		fn attribute(label: &str, group: AttributeGroup, character_only: bool) -> AttributeConfig {
			AttributeConfig { label: label.into(), group, character_only }
		}
		fn skill(label: &str, attribute: &str) -> SkillConfig {
			SkillConfig { label: label.into(), attribute: attribute.into() }
		}
		let attributes = [
			("str", attribute("Strength", AttributeGroup::Physical, false)),
			("dex", attribute("Dexterity", AttributeGroup::Physical, false)),
			("end", attribute("Endurance", AttributeGroup::Physical, false)),
			("awr", attribute("Awareness", AttributeGroup::Mental, false)),
			("int", attribute("Intellect", AttributeGroup::Mental, false)),
			("cha", attribute("Charisma", AttributeGroup::Mental, false)),
			("luck", attribute("Luck", AttributeGroup::Fate, true)),
			("cor", attribute("Coordination", AttributeGroup::Fate, true)),
		];
		let skills = [
			("athletics", skill("Athletics", "str")),
			("intimidation", skill("Intimidation", "str")),
			("acrobatics", skill("Acrobatics", "dex")),
			("sleightOfHand", skill("Sleight of Hand", "dex")),
			("stealth", skill("Stealth", "dex")),
			("survival", skill("Survival", "end")),
			("perceiving", skill("Perceiving", "awr")),
			("insight", skill("Insight", "awr")),
			("tracking", skill("Tracking", "awr")),
			("arcana", skill("Arcana", "int")),
			("history", skill("History", "int")),
			("medicine", skill("Medicine", "int")),
			("persuasion", skill("Persuasion", "cha")),
			("deception", skill("Deception", "cha")),
			("performance", skill("Performance", "cha")),
		];
		let defenses = [
			("parry", "10 + @dex"),
			("fortitude", "10 + @end"),
			("resolve", "10 + @awr"),
		];
		Self {
			attributes: attributes.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
			skills: skills.into_iter().map(|(k, v)| (k.to_owned(), v)).collect(),
			bonus_ap: [(-3, -2), (-2, -1), (-1, -1), (0, 0)].into(),
			defenses: defenses.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect(),
			profession_ranks: RankBounds::default(),
		}
	}
}

impl SystemConfig {
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let json = std::fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_owned(), err))?;
		Self::from_json(&json)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		for (key, skill) in &self.skills {
			if !self.attributes.contains_key(&skill.attribute) {
				return Err(ConfigError::UnknownAttribute {
					skill: key.clone(),
					attribute: skill.attribute.clone(),
				});
			}
		}
		let RankBounds { min, max } = self.profession_ranks;
		if min == 0 || min > max {
			return Err(ConfigError::InvalidRanks(min, max));
		}
		Ok(())
	}

	pub fn skill(&self, key: &str) -> Option<&SkillConfig> {
		self.skills.get(key)
	}

	pub fn skill_label<'a>(&'a self, key: &'a str) -> &'a str {
		self.skills.get(key).map(|skill| skill.label.as_str()).unwrap_or(key)
	}

	/// The action point modifier for a coordination score.
	/// Scores outside the table use the nearest entry below them, or the lowest entry.
	pub fn bonus_ap(&self, coordination: i32) -> i32 {
		match self.bonus_ap.range(..=coordination).next_back() {
			Some((_, bonus)) => *bonus,
			None => self.bonus_ap.values().next().copied().unwrap_or_default(),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use trim_margin::MarginTrimmable;

	#[test]
	fn default_is_valid() -> anyhow::Result<()> {
		let config = SystemConfig::default();
		config.validate()?;
		assert_eq!(config.skill("athletics").map(|s| s.attribute.as_str()), Some("str"));
		assert_eq!(config.skill_label("perceiving"), "Perceiving");
		assert_eq!(config.skill_label("unknown"), "unknown");
		Ok(())
	}

	#[test]
	fn bonus_ap_table() {
		let config = SystemConfig::default();
		assert_eq!(config.bonus_ap(-3), -2);
		assert_eq!(config.bonus_ap(-2), -1);
		assert_eq!(config.bonus_ap(-1), -1);
		assert_eq!(config.bonus_ap(0), 0);
		assert_eq!(config.bonus_ap(7), 0);
		assert_eq!(config.bonus_ap(-10), -2);
	}

	#[test]
	fn from_json() -> anyhow::Result<()> {
		let json = r#"
			|{
			|  "attributes": { "str": { "label": "Strength", "group": "physical" } },
			|  "skills": { "athletics": { "label": "Athletics", "attribute": "str" } },
			|  "bonusAp": { "-1": -1, "0": 0 }
			|}
		"#
		.trim_margin()
		.unwrap_or_default();
		let config = SystemConfig::from_json(&json)?;
		assert_eq!(config.bonus_ap(-1), -1);
		assert_eq!(config.profession_ranks, RankBounds { min: 1, max: 5 });
		assert!(config.defenses.is_empty());
		Ok(())
	}

	#[test]
	fn rejects_unknown_attribute() {
		let json = r#"{
			"attributes": {},
			"skills": { "athletics": { "label": "Athletics", "attribute": "str" } }
		}"#;
		let err = SystemConfig::from_json(json).unwrap_err();
		assert!(matches!(err, ConfigError::UnknownAttribute { .. }));
	}
}
