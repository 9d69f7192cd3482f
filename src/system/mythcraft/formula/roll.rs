use crate::GeneralError;
use std::str::FromStr;

/// The most dice a single term may roll.
pub const MAX_DICE: u32 = 1000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Die {
	D2,
	D4,
	D6,
	D8,
	D10,
	D12,
	D20,
	D100,
}
impl Die {
	pub fn value(self) -> u32 {
		match self {
			Self::D2 => 2,
			Self::D4 => 4,
			Self::D6 => 6,
			Self::D8 => 8,
			Self::D10 => 10,
			Self::D12 => 12,
			Self::D20 => 20,
			Self::D100 => 100,
		}
	}

	pub fn roll(&self, rand: &mut impl rand::Rng, num: u32) -> u64 {
		let range = 1..=u64::from(self.value());
		(0..num).fold(0u64, |total, _| total.saturating_add(rand.gen_range(range.clone())))
	}
}
impl TryFrom<u32> for Die {
	type Error = GeneralError;

	fn try_from(value: u32) -> Result<Self, Self::Error> {
		match value {
			2 => Ok(Self::D2),
			4 => Ok(Self::D4),
			6 => Ok(Self::D6),
			8 => Ok(Self::D8),
			10 => Ok(Self::D10),
			12 => Ok(Self::D12),
			20 => Ok(Self::D20),
			100 => Ok(Self::D100),
			_ => Err(GeneralError(format!("Invalid die number: {value}"))),
		}
	}
}
impl std::fmt::Display for Die {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "d{}", self.value())
	}
}

/// A dice term such as `2d6`, or a flat amount when no die is present.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Roll {
	pub amount: u32,
	pub die: Option<Die>,
}
impl From<u32> for Roll {
	fn from(amount: u32) -> Self {
		Self { amount, die: None }
	}
}
impl From<(u32, Die)> for Roll {
	fn from((amount, die): (u32, Die)) -> Self {
		Self { amount, die: Some(die) }
	}
}
impl std::fmt::Display for Roll {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.die {
			None => write!(f, "{}", self.amount),
			Some(die) => write!(f, "{}{die}", self.amount),
		}
	}
}
impl Roll {
	pub fn roll(&self, rand: &mut impl rand::Rng) -> u64 {
		match self.die {
			None => u64::from(self.amount),
			Some(die) => die.roll(rand, self.amount),
		}
	}
}
impl FromStr for Roll {
	type Err = GeneralError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		static EXPECTED: &str = "{int}d{int}";
		let parse_int = |part: &str| {
			part.parse::<u32>().map_err(|err| GeneralError(format!("Invalid number {part:?} in roll {s:?}: {err}")))
		};
		let Some((amount_str, die_str)) = s.split_once('d') else {
			return Ok(Self::from(parse_int(s)?));
		};
		if die_str.contains('d') {
			return Err(GeneralError(format!("Too many parts in {s:?} for Roll, expected {EXPECTED:?}")));
		}
		// `d20` is shorthand for `1d20`
		let amount = match amount_str {
			"" => 1,
			amount_str => parse_int(amount_str)?,
		};
		if amount > MAX_DICE {
			return Err(GeneralError(format!("Roll {s:?} exceeds the limit of {MAX_DICE} dice")));
		}
		let die = Die::try_from(parse_int(die_str)?)?;
		Ok(Self { amount, die: Some(die) })
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use rand::{rngs::StdRng, SeedableRng};

	#[test]
	fn parse() -> anyhow::Result<()> {
		assert_eq!(Roll::from_str("3")?, Roll::from(3));
		assert_eq!(Roll::from_str("2d6")?, Roll::from((2, Die::D6)));
		assert_eq!(Roll::from_str("d20")?, Roll::from((1, Die::D20)));
		assert!(Roll::from_str("2d7").is_err());
		assert!(Roll::from_str("1d6d6").is_err());
		assert!(Roll::from_str("xd6").is_err());
		assert!(Roll::from_str("1000d4").is_ok());
		assert!(Roll::from_str("1001d4").is_err());
		assert!(Roll::from_str("90000000d100").is_err());
		Ok(())
	}

	#[test]
	fn display() {
		assert_eq!(Roll::from((4, Die::D100)).to_string(), "4d100");
		assert_eq!(Roll::from(7).to_string(), "7");
	}

	#[test]
	fn rolls_within_bounds() {
		let mut rng = StdRng::seed_from_u64(7);
		let roll = Roll::from((3, Die::D8));
		for _ in 0..100 {
			let value = roll.roll(&mut rng);
			assert!((3..=24).contains(&value));
		}
		assert_eq!(Die::D6.roll(&mut rng, 0), 0);
	}

	#[test]
	fn largest_roll_fits() {
		let mut rng = StdRng::seed_from_u64(3);
		let total = Roll::from((MAX_DICE, Die::D100)).roll(&mut rng);
		assert!((u64::from(MAX_DICE)..=u64::from(MAX_DICE) * 100).contains(&total));
	}
}
