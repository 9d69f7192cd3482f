//! Character advancement: level or rank gated grants of items and skill points.
//!
//! Items that support advancements (lineages, backgrounds, professions, talents, and features)
//! embed a list of [`Advancement`] definitions. When a character levels up, a profession ranks
//! up, or such an item is acquired, an [`AdvancementApplier`] builds an [`AdvancementChain`] per
//! item, asks the player to resolve every newly unlocked node through a [`ChoiceDialog`], and then
//! commits all resulting document changes as one batch.

mod applier;
pub use applier::*;
mod batch;
pub use batch::*;
mod chain;
pub use chain::*;
mod definition;
pub use definition::*;
mod dialog;
pub use dialog::*;
mod error;
pub use error::*;
mod node;
pub use node::*;
mod range;
pub use range::*;
mod selection;
pub use selection::*;

#[cfg(test)]
pub(crate) use definition::test as fixtures;
