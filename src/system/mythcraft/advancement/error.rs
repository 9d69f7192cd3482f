use crate::system::core::DocumentId;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// The player dismissed a choice dialog. Nothing was committed.
	#[error("Advancement was cancelled")]
	Cancelled,
	#[error("Actor does not own an item with id {0}")]
	UnknownItem(DocumentId),
	#[error("Item {item} has no advancement with id {advancement}")]
	UnknownAdvancement { item: DocumentId, advancement: DocumentId },
	#[error("Item {0} does not support advancements")]
	NoAdvancements(DocumentId),
	/// The host rejected one of the committed operations.
	#[error(transparent)]
	Persistence(#[from] anyhow::Error),
}

impl Error {
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}
