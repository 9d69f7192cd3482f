use crate::{
	system::{
		core::DocumentId,
		mythcraft::{
			advancement::{ActorUpdate, ItemUpdate, OperationMeta},
			data::Item,
		},
	},
	utility::PinFutureLifetime,
};
use std::collections::BTreeSet;

mod memory;
pub use memory::*;

/// The host's persistence layer for documents owned by an actor.
///
/// Each call is one bulk operation which the host applies atomically. Failures are passed back
/// unmodified; callers do not retry.
pub trait DocumentStore: Send + Sync {
	/// The ids of every item the actor currently owns.
	fn owned_item_ids<'this>(
		&'this self,
		actor: &'this DocumentId,
	) -> PinFutureLifetime<'this, anyhow::Result<BTreeSet<DocumentId>>>;

	fn create_items<'this>(
		&'this self,
		actor: &'this DocumentId,
		items: Vec<Item>,
		meta: &'this OperationMeta,
	) -> PinFutureLifetime<'this, anyhow::Result<()>>;

	fn update_items<'this>(
		&'this self,
		actor: &'this DocumentId,
		updates: Vec<ItemUpdate>,
		meta: &'this OperationMeta,
	) -> PinFutureLifetime<'this, anyhow::Result<()>>;

	fn delete_items<'this>(
		&'this self,
		actor: &'this DocumentId,
		ids: Vec<DocumentId>,
		meta: &'this OperationMeta,
	) -> PinFutureLifetime<'this, anyhow::Result<()>>;

	fn update_actor<'this>(
		&'this self,
		actor: &'this DocumentId,
		update: ActorUpdate,
		meta: &'this OperationMeta,
	) -> PinFutureLifetime<'this, anyhow::Result<()>>;
}
