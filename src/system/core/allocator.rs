use super::DocumentId;
use derivative::Derivative;
use std::collections::BTreeSet;

/// Decides which identifier each document created in a batch receives.
///
/// A document may keep the identifier it was copied from only when the owning actor
/// does not already hold a document with that id, and no earlier allocation in the
/// same batch has claimed it. Otherwise a fresh identifier is generated.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct IdAllocator {
	owned: BTreeSet<DocumentId>,
	claimed: BTreeSet<DocumentId>,
	#[derivative(Debug = "ignore")]
	generate: Box<dyn FnMut() -> DocumentId + Send>,
}

impl IdAllocator {
	pub fn new(owned: BTreeSet<DocumentId>) -> Self {
		Self::with_generator(owned, DocumentId::generate)
	}

	pub fn with_generator<F>(owned: BTreeSet<DocumentId>, generate: F) -> Self
	where
		F: FnMut() -> DocumentId + Send + 'static,
	{
		Self {
			owned,
			claimed: BTreeSet::new(),
			generate: Box::new(generate),
		}
	}

	pub fn is_available(&self, id: &DocumentId) -> bool {
		!id.is_empty() && !self.owned.contains(id) && !self.claimed.contains(id)
	}

	/// Claims `preferred` if it is still free, otherwise claims a freshly generated id.
	pub fn allocate(&mut self, preferred: Option<&DocumentId>) -> DocumentId {
		let id = match preferred {
			Some(id) if self.is_available(id) => id.clone(),
			_ => loop {
				let id = (self.generate)();
				if self.is_available(&id) {
					if let Some(preferred) = preferred {
						log::debug!("{preferred} is already claimed, allocated {id} instead");
					}
					break id;
				}
			},
		};
		self.claimed.insert(id.clone());
		id
	}
}
