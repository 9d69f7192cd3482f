use crate::system::{core::DocumentId, mythcraft::SystemConfig};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One level (or rank) gated advancement embedded in an item.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Advancement {
	#[serde(rename = "_id")]
	pub id: DocumentId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// The level (or profession rank) that unlocks this advancement.
	/// `None` unlocks it as soon as the owning item is acquired.
	#[serde(default)]
	pub level: Option<u32>,
	#[serde(flatten)]
	pub kind: AdvancementKind,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AdvancementKind {
	ItemGrant(ItemGrant),
	Skill(SkillGrant),
}

impl AdvancementKind {
	pub fn name(&self) -> &'static str {
		match self {
			Self::ItemGrant(_) => "itemGrant",
			Self::Skill(_) => "skill",
		}
	}
}

/// Grants some number of items chosen from a pool of candidates.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ItemGrant {
	#[serde(default)]
	pub pool: Vec<ItemReference>,
	#[serde(default)]
	pub choose: ChooseN,
}

/// A reference to a candidate item outside of the actor, plus enough to display it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ItemReference {
	pub uuid: String,
	#[serde(default)]
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub img: Option<String>,
}

/// How many candidates of an item grant must be picked.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(try_from = "ChooseRepr", into = "ChooseRepr")]
pub enum ChooseN {
	Count(u32),
	All,
}

impl Default for ChooseN {
	fn default() -> Self {
		Self::Count(1)
	}
}

impl ChooseN {
	/// The exact number of candidates a selection must contain,
	/// given how many candidates are available.
	pub fn count(&self, available: usize) -> usize {
		match self {
			Self::Count(n) => *n as usize,
			Self::All => available,
		}
	}
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ChooseRepr {
	Count(u32),
	Keyword(String),
}

impl TryFrom<ChooseRepr> for ChooseN {
	type Error = crate::utility::NotInList;

	fn try_from(value: ChooseRepr) -> Result<Self, Self::Error> {
		match value {
			ChooseRepr::Count(n) => Ok(Self::Count(n)),
			ChooseRepr::Keyword(word) if word == "all" => Ok(Self::All),
			ChooseRepr::Keyword(word) => Err(crate::utility::NotInList(word, vec!["all"])),
		}
	}
}

impl From<ChooseN> for ChooseRepr {
	fn from(value: ChooseN) -> Self {
		match value {
			ChooseN::Count(n) => Self::Count(n),
			ChooseN::All => Self::Keyword("all".into()),
		}
	}
}

/// Grants a budget of skill points to distribute among primary and secondary skills.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SkillGrant {
	#[serde(default)]
	pub points: u32,
	#[serde(default = "SkillSet::primary")]
	pub primary: SkillSet,
	#[serde(default = "SkillSet::secondary")]
	pub secondary: SkillSet,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SkillSet {
	#[serde(default)]
	pub skills: BTreeSet<String>,
	/// The most points any one skill in this set may receive.
	pub max: u32,
}

impl SkillSet {
	pub fn primary() -> Self {
		Self { skills: BTreeSet::new(), max: 6 }
	}

	pub fn secondary() -> Self {
		Self { skills: BTreeSet::new(), max: 3 }
	}
}

/// A skill that may receive points from a [`SkillGrant`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SkillOption {
	pub key: String,
	pub label: String,
	pub max: u32,
}

impl SkillGrant {
	/// The skills eligible for points, sorted by key. A skill in both sets uses the primary cap.
	/// Skills the configuration does not define are not eligible.
	pub fn eligible(&self, config: &SystemConfig) -> Vec<SkillOption> {
		let mut options = std::collections::BTreeMap::<String, SkillOption>::new();
		for (set, is_primary) in [(&self.secondary, false), (&self.primary, true)] {
			for key in &set.skills {
				let Some(skill) = config.skill(key) else {
					log::warn!("Skill advancement references unknown skill {key:?}");
					continue;
				};
				let max = match (is_primary, options.get(key)) {
					(true, _) | (false, None) => set.max,
					(false, Some(SkillOption { max, .. })) => *max,
				};
				options.insert(key.clone(), SkillOption { key: key.clone(), label: skill.label.clone(), max });
			}
		}
		options.into_values().collect()
	}
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DefinitionError {
	#[error("Advancement {0} has an empty candidate pool")]
	EmptyPool(DocumentId),
	#[error("Advancement {0} chooses {1} of only {2} candidates")]
	ChooseTooMany(DocumentId, u32, usize),
	#[error("Advancement {0} has duplicate candidate {1:?}")]
	DuplicateCandidate(DocumentId, String),
	#[error("Advancement {0} references unknown skill {1:?}")]
	UnknownSkill(DocumentId, String),
	#[error("Advancement {0} grants {1} points but its skills can hold at most {2}")]
	UnspendablePoints(DocumentId, u32, u32),
}

impl Advancement {
	/// Both item grants and skill grants require the player to make a choice.
	pub fn is_choice(&self) -> bool {
		match &self.kind {
			AdvancementKind::ItemGrant(_) | AdvancementKind::Skill(_) => true,
		}
	}

	pub fn title(&self) -> String {
		if let Some(title) = &self.title {
			return title.clone();
		}
		match &self.kind {
			AdvancementKind::ItemGrant(_) => "Item Grant".into(),
			AdvancementKind::Skill(_) => "Skill Points".into(),
		}
	}

	/// Checks that the definition can ever be satisfied by a selection.
	pub fn validate(&self, config: &SystemConfig) -> Result<(), DefinitionError> {
		match &self.kind {
			AdvancementKind::ItemGrant(grant) => {
				if grant.pool.is_empty() {
					return Err(DefinitionError::EmptyPool(self.id.clone()));
				}
				if let Some(uuid) = grant.pool.iter().map(|reference| &reference.uuid).duplicates().next() {
					return Err(DefinitionError::DuplicateCandidate(self.id.clone(), uuid.clone()));
				}
				if let ChooseN::Count(n) = grant.choose {
					if n as usize > grant.pool.len() {
						return Err(DefinitionError::ChooseTooMany(self.id.clone(), n, grant.pool.len()));
					}
				}
			}
			AdvancementKind::Skill(grant) => {
				for key in grant.primary.skills.iter().chain(grant.secondary.skills.iter()) {
					if config.skill(key).is_none() {
						return Err(DefinitionError::UnknownSkill(self.id.clone(), key.clone()));
					}
				}
				let capacity = grant.eligible(config).iter().map(|option| option.max).sum::<u32>();
				if grant.points > capacity {
					return Err(DefinitionError::UnspendablePoints(self.id.clone(), grant.points, capacity));
				}
			}
		}
		Ok(())
	}
}
