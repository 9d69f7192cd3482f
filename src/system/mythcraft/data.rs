mod actor;
pub use actor::*;
mod derived;
pub use derived::*;
mod flags;
pub use flags::*;
mod item;
pub use item::*;

/// A current / maximum pair, used for hit points and stamina points.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Pool {
	#[serde(default)]
	pub value: i32,
	#[serde(default)]
	pub max: i32,
}
