use super::{Advancement, AdvancementKind, SkillGrant};
use crate::system::mythcraft::SystemConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The player's recorded choice for one advancement.
///
/// Item grants record the uuids of the chosen candidates, skill grants record the points spent per skill key.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
	Items(BTreeSet<String>),
	Skills(BTreeMap<String, u32>),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
	#[error("Expected a {expected} selection, found a {found} selection")]
	WrongKind { expected: &'static str, found: &'static str },
	#[error("Expected exactly {expected} items to be chosen, found {found}")]
	WrongCount { expected: usize, found: usize },
	#[error("{0:?} is not a candidate of this advancement")]
	UnknownCandidate(String),
	#[error("Skill {0:?} is not eligible for this advancement")]
	IneligibleSkill(String),
	#[error("Skill {skill:?} received {points} points but may receive at most {max}")]
	OverMax { skill: String, points: u32, max: u32 },
	#[error("Expected exactly {expected} points to be spent, found {found}")]
	WrongTotal { expected: u32, found: u32 },
}

impl Selection {
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::Items(_) => "itemGrant",
			Self::Skills(_) => "skill",
		}
	}

	pub fn items(&self) -> Option<&BTreeSet<String>> {
		match self {
			Self::Items(items) => Some(items),
			Self::Skills(_) => None,
		}
	}

	/// Returns true if this selection has the shape the advancement records.
	pub fn matches(&self, kind: &AdvancementKind) -> bool {
		matches!(
			(self, kind),
			(Self::Items(_), AdvancementKind::ItemGrant(_)) | (Self::Skills(_), AdvancementKind::Skill(_))
		)
	}

	/// Checks the selection against the advancement's cardinality or point budget.
	///
	/// `candidates` are the uuids of the item candidates that could be resolved,
	/// which bounds how many items a "choose all" grant requires.
	pub fn validate<'c>(
		&self,
		advancement: &Advancement,
		candidates: impl IntoIterator<Item = &'c str>,
		config: &SystemConfig,
	) -> Result<(), SelectionError> {
		match (self, &advancement.kind) {
			(Self::Items(chosen), AdvancementKind::ItemGrant(grant)) => {
				let candidates = candidates.into_iter().collect::<BTreeSet<_>>();
				if let Some(unknown) = chosen.iter().find(|uuid| !candidates.contains(uuid.as_str())) {
					return Err(SelectionError::UnknownCandidate(unknown.clone()));
				}
				let expected = grant.choose.count(candidates.len()).min(candidates.len());
				if chosen.len() != expected {
					return Err(SelectionError::WrongCount { expected, found: chosen.len() });
				}
				Ok(())
			}
			(Self::Skills(points), AdvancementKind::Skill(grant)) => validate_points(points, grant, config),
			(selection, kind) => Err(SelectionError::WrongKind {
				expected: kind.name(),
				found: selection.kind_name(),
			}),
		}
	}
}

fn validate_points(
	points: &BTreeMap<String, u32>,
	grant: &SkillGrant,
	config: &SystemConfig,
) -> Result<(), SelectionError> {
	let eligible = grant.eligible(config);
	let mut total = 0u32;
	for (skill, &spent) in points {
		let Some(option) = eligible.iter().find(|option| &option.key == skill) else {
			return Err(SelectionError::IneligibleSkill(skill.clone()));
		};
		if spent > option.max {
			return Err(SelectionError::OverMax { skill: skill.clone(), points: spent, max: option.max });
		}
		total = total.saturating_add(spent);
	}
	if total != grant.points {
		return Err(SelectionError::WrongTotal { expected: grant.points, found: total });
	}
	Ok(())
}
