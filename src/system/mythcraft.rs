//! The MythCraft ruleset: configuration, documents, formulas, and character advancement.

pub mod advancement;
mod config;
pub use config::*;
pub mod data;
pub mod formula;
pub mod store;
