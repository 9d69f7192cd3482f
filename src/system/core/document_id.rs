use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Length of the alphanumeric identifiers the host assigns to documents.
pub const ID_LENGTH: usize = 16;

/// The host-assigned identifier of a document (actor, item, or an advancement embedded in an item).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Creates a fresh random identifier in the host's format.
	pub fn generate() -> Self {
		let mut id = uuid::Uuid::new_v4().simple().to_string();
		id.truncate(ID_LENGTH);
		Self(id)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<&str> for DocumentId {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}

impl From<String> for DocumentId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl AsRef<str> for DocumentId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl Borrow<str> for DocumentId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for DocumentId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl std::fmt::Debug for DocumentId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "DocumentId({:?})", self.0)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn generated_ids_match_host_format() {
		let id = DocumentId::generate();
		assert_eq!(id.as_str().len(), ID_LENGTH);
		assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(id, DocumentId::generate());
	}

	#[test]
	fn serializes_as_plain_string() -> anyhow::Result<()> {
		let id = DocumentId::from("lineageHuman0001");
		assert_eq!(serde_json::to_string(&id)?, "\"lineageHuman0001\"");
		assert_eq!(serde_json::from_str::<DocumentId>("\"abc\"")?, DocumentId::from("abc"));
		Ok(())
	}
}
