use super::DocumentStore;
use crate::{
	system::{
		core::DocumentId,
		mythcraft::{
			advancement::{ActorUpdate, ItemUpdate, OperationMeta},
			data::{Actor, Item},
		},
	},
	utility::PinFutureLifetime,
};
use anyhow::anyhow;
use enumset::{EnumSet, EnumSetType};
use serde::Serialize;
use serde_json::Value;
use std::{
	collections::{BTreeMap, BTreeSet},
	sync::{Mutex, RwLock},
};

#[derive(EnumSetType, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
	CreateItems,
	UpdateItems,
	DeleteItems,
	UpdateActor,
}

/// A committed operation, with its payload in the host's document-update shape.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Operation {
	pub kind: OperationKind,
	pub actor: DocumentId,
	pub payload: Vec<Value>,
	pub meta: OperationMeta,
}

/// Keeps actors in memory and records every operation applied to them.
#[derive(Debug, Default)]
pub struct MemoryStore {
	actors: RwLock<BTreeMap<DocumentId, Actor>>,
	operations: Mutex<Vec<Operation>>,
	rejected: Mutex<EnumSet<OperationKind>>,
}

impl MemoryStore {
	pub fn insert(&self, actor: Actor) {
		if let Ok(mut actors) = self.actors.write() {
			actors.insert(actor.id.clone(), actor);
		}
	}

	pub fn actor(&self, id: &DocumentId) -> Option<Actor> {
		self.actors.read().ok()?.get(id).cloned()
	}

	pub fn operations(&self) -> Vec<Operation> {
		self.operations.lock().map(|operations| operations.clone()).unwrap_or_default()
	}

	/// Makes every future operation of `kind` fail, as if the host refused it.
	pub fn reject(&self, kind: OperationKind) {
		if let Ok(mut rejected) = self.rejected.lock() {
			rejected.insert(kind);
		}
	}

	fn commit(
		&self,
		kind: OperationKind,
		actor_id: &DocumentId,
		payload: Vec<Value>,
		meta: &OperationMeta,
		apply: impl FnOnce(&mut Actor) -> anyhow::Result<()>,
	) -> anyhow::Result<()> {
		let rejected = *self.rejected.lock().map_err(|_| anyhow!("operation lock poisoned"))?;
		if rejected.contains(kind) {
			return Err(anyhow!("Permission denied: cannot {kind:?} on actor {actor_id}"));
		}
		let mut actors = self.actors.write().map_err(|_| anyhow!("actor lock poisoned"))?;
		let actor = actors.get(actor_id).ok_or_else(|| anyhow!("No actor with id {actor_id}"))?;
		// apply to a copy so a failed operation leaves the actor untouched
		let mut staged = actor.clone();
		apply(&mut staged)?;
		actors.insert(actor_id.clone(), staged);
		drop(actors);

		log::info!(target: "store", "{kind:?} on {actor_id}: {}", meta.describe());
		let operation = Operation { kind, actor: actor_id.clone(), payload, meta: meta.clone() };
		self.operations.lock().map_err(|_| anyhow!("operation lock poisoned"))?.push(operation);
		Ok(())
	}
}

impl DocumentStore for MemoryStore {
	fn owned_item_ids<'this>(
		&'this self,
		actor: &'this DocumentId,
	) -> PinFutureLifetime<'this, anyhow::Result<BTreeSet<DocumentId>>> {
		Box::pin(async move {
			let actors = self.actors.read().map_err(|_| anyhow!("actor lock poisoned"))?;
			let actor = actors.get(actor).ok_or_else(|| anyhow!("No actor with id {actor}"))?;
			Ok(actor.item_ids())
		})
	}

	fn create_items<'this>(
		&'this self,
		actor: &'this DocumentId,
		items: Vec<Item>,
		meta: &'this OperationMeta,
	) -> PinFutureLifetime<'this, anyhow::Result<()>> {
		Box::pin(async move {
			let payload = items.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>()?;
			self.commit(OperationKind::CreateItems, actor, payload, meta, move |actor| {
				for item in items {
					if actor.item(&item.id).is_some() {
						return Err(anyhow!("Item {} already exists on {}", item.id, actor.name));
					}
					actor.items.push(item);
				}
				Ok(())
			})
		})
	}

	fn update_items<'this>(
		&'this self,
		actor: &'this DocumentId,
		updates: Vec<ItemUpdate>,
		meta: &'this OperationMeta,
	) -> PinFutureLifetime<'this, anyhow::Result<()>> {
		Box::pin(async move {
			let payload = updates.iter().map(ItemUpdate::to_payload).collect();
			self.commit(OperationKind::UpdateItems, actor, payload, meta, move |actor| {
				for update in &updates {
					let name = actor.name.clone();
					let item = actor
						.item_mut(&update.id)
						.ok_or_else(|| anyhow!("Item {} does not exist on {name}", update.id))?;
					update.apply_to(item);
				}
				Ok(())
			})
		})
	}

	fn delete_items<'this>(
		&'this self,
		actor: &'this DocumentId,
		ids: Vec<DocumentId>,
		meta: &'this OperationMeta,
	) -> PinFutureLifetime<'this, anyhow::Result<()>> {
		Box::pin(async move {
			let payload = ids.iter().map(|id| Value::String(id.to_string())).collect();
			self.commit(OperationKind::DeleteItems, actor, payload, meta, move |actor| {
				for id in &ids {
					if actor.item(id).is_none() {
						return Err(anyhow!("Item {id} does not exist on {}", actor.name));
					}
					actor.items.retain(|item| &item.id != id);
				}
				Ok(())
			})
		})
	}

	fn update_actor<'this>(
		&'this self,
		actor: &'this DocumentId,
		update: ActorUpdate,
		meta: &'this OperationMeta,
	) -> PinFutureLifetime<'this, anyhow::Result<()>> {
		Box::pin(async move {
			let payload = vec![update.to_payload()];
			self.commit(OperationKind::UpdateActor, actor, payload, meta, move |actor| {
				update.apply_to(actor);
				Ok(())
			})
		})
	}
}
