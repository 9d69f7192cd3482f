use serde::{Deserialize, Serialize};

/// Whether an advancement run is driven by character level or by a profession's rank.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Progression {
	Level,
	Rank,
}

impl Progression {
	pub fn noun(&self) -> &'static str {
		match self {
			Self::Level => "level",
			Self::Rank => "rank",
		}
	}
}

/// The half-open interval `(start, end]` of levels (or ranks) being applied.
///
/// A `start` of `None` means the owning item is being acquired: every node up to `end`
/// is unlocked, including nodes with no level requirement.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LevelRange {
	pub start: Option<u32>,
	pub end: u32,
}

impl LevelRange {
	pub fn acquisition(end: u32) -> Self {
		Self { start: None, end }
	}

	pub fn between(start: u32, end: u32) -> Self {
		Self { start: Some(start), end }
	}

	pub fn with_end(self, end: u32) -> Self {
		Self { end, ..self }
	}

	pub fn is_acquisition(&self) -> bool {
		self.start.is_none()
	}

	/// Returns true if a node with the `requirement` level is unlocked by this range.
	pub fn contains(&self, requirement: Option<u32>) -> bool {
		match (self.start, requirement) {
			(None, None) => true,
			(None, Some(level)) => level <= self.end,
			(Some(_), None) => false,
			(Some(start), Some(level)) => start < level && level <= self.end,
		}
	}
}

impl std::fmt::Display for LevelRange {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.start {
			None => write!(f, "(acquired]..={}", self.end),
			Some(start) => write!(f, "({start}, {}]", self.end),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn half_open_interval() {
		let range = LevelRange::between(3, 5);
		assert!(!range.contains(Some(3)));
		assert!(range.contains(Some(4)));
		assert!(range.contains(Some(5)));
		assert!(!range.contains(Some(6)));
		assert!(!range.contains(None));
	}

	#[test]
	fn acquisition_includes_unleveled() {
		let range = LevelRange::acquisition(2);
		assert!(range.contains(None));
		assert!(range.contains(Some(0)));
		assert!(range.contains(Some(2)));
		assert!(!range.contains(Some(3)));
	}

	#[test]
	fn empty_when_not_advancing() {
		let range = LevelRange::between(4, 4);
		assert!((0..10).all(|level| !range.contains(Some(level))));
	}
}
