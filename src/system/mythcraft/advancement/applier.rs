use super::{
	ActorUpdate, AdvancementChain, AdvancementNode, CandidateResolver, ChoiceDialog, Error, LevelRange, OperationMeta,
	Progression, Reason, Selection, StagedBatch,
};
use crate::system::{
	core::{DocumentId, IdAllocator},
	mythcraft::{
		data::{Actor, AdvancementFlags, Item, ItemType},
		store::DocumentStore,
		SystemConfig,
	},
};
use std::collections::{BTreeMap, BTreeSet};

/// An item whose advancements should be applied.
#[derive(Clone, Debug)]
pub enum AdvancementSource {
	/// An item the actor already owns.
	Owned(DocumentId),
	/// An item being added to the actor. It is created as part of the same batch.
	Acquired(Item),
}

/// What a committed advancement run changed.
#[derive(Clone, PartialEq, Debug)]
pub struct Outcome {
	pub meta: OperationMeta,
	pub created: Vec<DocumentId>,
	pub updated: Vec<DocumentId>,
	pub deleted: Vec<DocumentId>,
	/// Created items which carry advancements of their own. These are not resolved automatically,
	/// the caller may apply them in a second pass.
	pub follow_ups: Vec<DocumentId>,
}

impl Outcome {
	fn unchanged(meta: OperationMeta) -> Self {
		Self { meta, created: Vec::new(), updated: Vec::new(), deleted: Vec::new(), follow_ups: Vec::new() }
	}

	pub fn is_empty(&self) -> bool {
		self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
	}
}

/// Resolves advancement chains against a level (or rank) range and commits the results.
///
/// Callers must not run two applications against the same actor concurrently.
pub struct AdvancementApplier<'a> {
	config: &'a SystemConfig,
	dialog: &'a dyn ChoiceDialog,
	resolver: &'a dyn CandidateResolver,
	store: &'a dyn DocumentStore,
}

impl<'a> AdvancementApplier<'a> {
	pub fn new(
		config: &'a SystemConfig,
		dialog: &'a dyn ChoiceDialog,
		resolver: &'a dyn CandidateResolver,
		store: &'a dyn DocumentStore,
	) -> Self {
		Self { config, dialog, resolver, store }
	}

	/// Applies every owned advancement item except professions, which advance by rank instead.
	/// `actor` is the actor after its level changed.
	pub async fn level_up(&self, actor: &Actor, range: LevelRange) -> Result<Outcome, Error> {
		let sources = actor
			.items
			.iter()
			.filter(|item| item.supports_advancements() && item.kind != ItemType::Profession)
			.map(|item| AdvancementSource::Owned(item.id.clone()))
			.collect();
		self.apply(actor, sources, Progression::Level, range).await
	}

	/// Applies the advancements of one profession. `actor` holds the profession at its new rank.
	/// Ranks past the configured maximum are clamped to it.
	pub async fn rank_up(&self, actor: &Actor, profession: &DocumentId, range: LevelRange) -> Result<Outcome, Error> {
		let range = range.with_end(self.config.profession_ranks.clamp(range.end));
		let sources = vec![AdvancementSource::Owned(profession.clone())];
		self.apply(actor, sources, Progression::Rank, range).await
	}

	/// Adds `item` to the actor, resolving its advancements up to the actor's level
	/// (or the item's rank, for professions).
	pub async fn acquire(&self, actor: &Actor, item: Item) -> Result<Outcome, Error> {
		let (kind, range) = match item.rank(self.config) {
			Some(rank) => (Progression::Rank, LevelRange::acquisition(rank)),
			None => (Progression::Level, LevelRange::acquisition(actor.level())),
		};
		self.apply(actor, vec![AdvancementSource::Acquired(item)], kind, range).await
	}

	pub async fn apply(
		&self,
		actor: &Actor,
		sources: Vec<AdvancementSource>,
		kind: Progression,
		range: LevelRange,
	) -> Result<Outcome, Error> {
		let mut items = Vec::with_capacity(sources.len());
		for source in &sources {
			let (item, acquired) = match source {
				AdvancementSource::Owned(id) => (actor.item(id).ok_or_else(|| Error::UnknownItem(id.clone()))?, false),
				AdvancementSource::Acquired(item) => (item, true),
			};
			if !item.supports_advancements() {
				return Err(Error::NoAdvancements(item.id.clone()));
			}
			items.push((item, acquired));
		}

		let mut chains = Vec::with_capacity(items.len());
		for (item, _) in &items {
			chains.push(AdvancementChain::build(item, self.resolver).await);
		}

		let mut resolved = Vec::new();
		for chain in &chains {
			let item_range = self.range_for(chain.item(), range);
			for node in chain.active(item_range) {
				let Some(selection) = node.configure(self.dialog, self.config, None, Some(item_range)).await else {
					log::info!(
						"Advancement {} on {:?} was cancelled, discarding {kind:?} {range}",
						node.advancement.id,
						node.item.name
					);
					return Err(Error::Cancelled);
				};
				resolved.push((node, selection));
			}
		}

		let owned = self.store.owned_item_ids(&actor.id).await?;
		let mut staging = Staging::new(actor, owned);
		let mut id_map = BTreeMap::new();
		for (item, acquired) in &items {
			if *acquired {
				let mut created = (*item).clone();
				created.id = staging.ids.allocate(Some(&item.id));
				id_map.insert(item.id.clone(), created.id.clone());
				staging.note_source(&item.name);
				staging.batch.create(created);
			}
		}
		for (node, selection) in resolved {
			let parent_id = id_map.get(&node.item.id).unwrap_or(&node.item.id).clone();
			staging.note_source(&node.item.name);
			staging.stage(node, &parent_id, selection, None);
		}

		let meta = OperationMeta {
			kind,
			range,
			reason: Reason::Advance,
			actor: actor.name.clone(),
			sources: staging.sources.clone(),
		};
		self.commit(actor, staging, meta).await
	}

	/// Re-opens an already resolved advancement with its recorded selection filled in, then
	/// replaces the selection. For item grants, newly chosen candidates are created and items
	/// granted for candidates no longer chosen are deleted.
	pub async fn reconfigure(
		&self,
		actor: &Actor,
		item_id: &DocumentId,
		advancement_id: &DocumentId,
	) -> Result<Outcome, Error> {
		let item = actor.item(item_id).ok_or_else(|| Error::UnknownItem(item_id.clone()))?;
		if !item.supports_advancements() {
			return Err(Error::NoAdvancements(item_id.clone()));
		}
		let chain = AdvancementChain::build(item, self.resolver).await;
		let node = chain.node(advancement_id).ok_or_else(|| Error::UnknownAdvancement {
			item: item_id.clone(),
			advancement: advancement_id.clone(),
		})?;

		let existing = node.chosen_selection();
		let Some(selection) = node.configure(self.dialog, self.config, existing, None).await else {
			log::info!("Reconfiguring advancement {advancement_id} on {:?} was cancelled", item.name);
			return Err(Error::Cancelled);
		};

		let owned = self.store.owned_item_ids(&actor.id).await?;
		let mut staging = Staging::new(actor, owned);
		staging.note_source(&item.name);
		staging.stage(node, item_id, selection, existing);

		let (kind, current) = match item.rank(self.config) {
			Some(rank) => (Progression::Rank, rank),
			None => (Progression::Level, actor.level()),
		};
		let meta = OperationMeta {
			kind,
			range: LevelRange::between(current, current),
			reason: Reason::Reconfigure,
			actor: actor.name.clone(),
			sources: staging.sources.clone(),
		};
		self.commit(actor, staging, meta).await
	}

	/// Professions always advance up to their own rank.
	fn range_for(&self, item: &Item, range: LevelRange) -> LevelRange {
		match item.rank(self.config) {
			Some(rank) => range.with_end(rank),
			None => range,
		}
	}

	async fn commit(&self, actor: &Actor, staging: Staging<'_>, meta: OperationMeta) -> Result<Outcome, Error> {
		let Staging { batch, follow_ups, .. } = staging;
		if batch.is_empty() {
			log::debug!("Nothing to apply for {}", meta.describe());
			return Ok(Outcome::unchanged(meta));
		}

		let StagedBatch { creates, updates, deletes, actor: actor_update } = batch;
		let created = creates.iter().map(|item| item.id.clone()).collect::<Vec<_>>();
		let updated = updates.keys().cloned().collect::<Vec<_>>();
		let deleted = deletes.clone();
		log::debug!(
			"Committing {} creates, {} updates, {} deletes for {:?}",
			created.len(),
			updated.len(),
			deleted.len(),
			actor.name
		);

		// Items are created before the selections that granted them are recorded. If a later call
		// fails, re-applying the node diffs against the provenance of the items that already exist.
		self.store.create_items(&actor.id, creates, &meta).await?;
		self.store.update_items(&actor.id, updates.into_values().collect(), &meta).await?;
		if !deletes.is_empty() {
			self.store.delete_items(&actor.id, deletes, &meta).await?;
		}
		self.store.update_actor(&actor.id, actor_update, &meta).await?;

		log::info!("{}", meta.describe());
		Ok(Outcome { meta, created, updated, deleted, follow_ups })
	}
}

/// Turns resolved selections into staged document changes.
struct Staging<'s> {
	actor: &'s Actor,
	ids: IdAllocator,
	batch: StagedBatch,
	sources: Vec<String>,
	follow_ups: Vec<DocumentId>,
}

impl<'s> Staging<'s> {
	fn new(actor: &'s Actor, owned: BTreeSet<DocumentId>) -> Self {
		Self {
			actor,
			ids: IdAllocator::new(owned),
			batch: StagedBatch::default(),
			sources: Vec::new(),
			follow_ups: Vec::new(),
		}
	}

	fn note_source(&mut self, name: &str) {
		if !self.sources.iter().any(|source| source == name) {
			self.sources.push(name.to_owned());
		}
	}

	/// Stages `selection` for `node`, whose item is (or will be) `parent_id` on the actor.
	/// `previous` is the selection being replaced, if a well-formed one was recorded.
	fn stage(
		&mut self,
		node: &AdvancementNode<'_>,
		parent_id: &DocumentId,
		selection: Selection,
		previous: Option<&Selection>,
	) {
		match &selection {
			Selection::Items(chosen) => {
				let actor = self.actor;
				let granted = actor.granted_by(parent_id, &node.advancement.id).collect::<Vec<_>>();
				let previous = match previous.and_then(Selection::items) {
					Some(previous) => previous.clone(),
					// Without a usable record, the items already granted by this node are the selection.
					None => granted
						.iter()
						.filter_map(|item| item.flags.mythcraft.advancement.source.clone())
						.collect::<BTreeSet<_>>(),
				};
				for uuid in chosen.difference(&previous) {
					self.grant(node, parent_id, uuid);
				}
				let removed = previous.difference(chosen).collect::<BTreeSet<_>>();
				for item in granted {
					let source = item.flags.mythcraft.advancement.source.as_ref();
					if source.map(|uuid| removed.contains(uuid)).unwrap_or(false) {
						log::debug!("Removing {:?} granted by advancement {}", item.name, node.advancement.id);
						self.batch.delete(item.id.clone());
					}
				}
			}
			Selection::Skills(points) => {
				let mut update = ActorUpdate::default();
				for (key, spent) in points {
					if *spent > 0 && !self.actor.system.skills.contains_key(key) {
						update.skills.insert(key.clone(), 0);
					}
				}
				self.batch.actor.merge(update);
			}
		}
		self.batch.record_selection(parent_id, &node.advancement.id, selection);
	}

	fn grant(&mut self, node: &AdvancementNode<'_>, parent_id: &DocumentId, uuid: &String) {
		let Some(candidate) = node.choices().get(uuid) else {
			log::error!("Selected candidate {uuid} of advancement {} was never resolved", node.advancement.id);
			return;
		};
		let mut created = candidate.clone();
		created.id = self.ids.allocate(Some(&candidate.id));
		created.flags.mythcraft.advancement = AdvancementFlags {
			parent_id: Some(parent_id.clone()),
			advancement_id: Some(node.advancement.id.clone()),
			source: Some(uuid.clone()),
			..Default::default()
		};
		log::debug!(
			"Granting {:?} as {} from advancement {} on {parent_id}",
			created.name,
			created.id,
			node.advancement.id
		);
		if !created.advancements().is_empty() {
			self.follow_ups.push(created.id.clone());
		}
		self.batch.create(created);
	}
}
