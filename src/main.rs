use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use futures::executor::block_on;
use mythcraft::system::{
	core::DocumentId,
	mythcraft::{
		advancement::{
			AdvancementApplier, AdvancementSource, Error, LevelRange, MapResolver, Outcome, Progression, ScriptedDialog,
		},
		data::{Actor, Derived, Item},
		store::MemoryStore,
		SystemConfig,
	},
};
use rand::{rngs::StdRng, SeedableRng};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Applies MythCraft character advancements outside of the tabletop host.
#[derive(Parser, Debug)]
#[command(name = "mythcraft")]
struct Cli {
	/// Most verbose log level written to the terminal
	#[arg(long, global = true, default_value = "info")]
	log_level: log::LevelFilter,

	/// Rules configuration to use instead of the built-in one
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Resolve advancements for a level up, a profession rank up, or an acquired item.
	Apply(ApplyArgs),
	/// Re-open one resolved advancement and replace its selection.
	Reconfigure {
		#[command(flatten)]
		session: SessionArgs,
		#[arg(long)]
		item: String,
		#[arg(long)]
		advancement: String,
	},
	/// Print the derived data of an actor.
	Derive {
		#[arg(long)]
		actor: PathBuf,
		/// Seed for rolling dice in max-uses formulas
		#[arg(long)]
		seed: Option<u64>,
	},
}

#[derive(Args, Debug)]
struct SessionArgs {
	/// The actor document, as JSON
	#[arg(long)]
	actor: PathBuf,
	/// Answers to choice dialogs, keyed by `<itemId>/<advancementId>` or `<advancementId>`
	#[arg(long)]
	choices: PathBuf,
	/// Candidate items keyed by uuid
	#[arg(long)]
	compendium: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
	#[command(flatten)]
	session: SessionArgs,
	/// Apply the advancements of one owned item
	#[arg(long, conflicts_with = "acquire")]
	item: Option<String>,
	/// Add an item document to the actor and apply its advancements
	#[arg(long)]
	acquire: Option<PathBuf>,
	/// The level (or rank) before the change. Omit to apply everything up to `end`.
	#[arg(long)]
	start: Option<u32>,
	/// The level (or rank) after the change
	#[arg(long, required_unless_present = "acquire")]
	end: Option<u32>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
	let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
	serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
}

struct Session {
	config: SystemConfig,
	actor: Actor,
	dialog: ScriptedDialog,
	resolver: MapResolver,
	store: MemoryStore,
}

impl Session {
	fn load(config: SystemConfig, args: &SessionArgs) -> anyhow::Result<Self> {
		let actor: Actor = read_json(&args.actor)?;
		let dialog = ScriptedDialog::new(read_json(&args.choices)?);
		let resolver = match &args.compendium {
			Some(path) => MapResolver::from(read_json::<std::collections::BTreeMap<String, Item>>(path)?),
			None => MapResolver::default(),
		};
		let store = MemoryStore::default();
		store.insert(actor.clone());
		Ok(Self { config, actor, dialog, resolver, store })
	}

	fn applier(&self) -> AdvancementApplier<'_> {
		AdvancementApplier::new(&self.config, &self.dialog, &self.resolver, &self.store)
	}

	fn finish(&self, outcome: Result<Outcome, Error>) -> anyhow::Result<()> {
		match outcome {
			Ok(outcome) => self.report(outcome),
			Err(err) if err.is_cancelled() => {
				log::info!("A choice was left unanswered, nothing was committed");
				Ok(())
			}
			Err(err) => Err(err.into()),
		}
	}

	fn report(&self, outcome: Outcome) -> anyhow::Result<()> {
		log::info!("{}", outcome.meta.describe());
		for id in &outcome.follow_ups {
			log::info!("Granted item {id} has advancements of its own; apply it with --item {id}");
		}
		println!("{}", serde_json::to_string_pretty(&self.store.operations())?);
		Ok(())
	}
}

fn apply(config: SystemConfig, args: ApplyArgs) -> anyhow::Result<()> {
	let session = Session::load(config, &args.session)?;
	let applier = session.applier();
	let actor = &session.actor;
	let outcome = match (&args.acquire, &args.item, args.end) {
		(Some(path), _, _) => block_on(applier.acquire(actor, read_json(path)?)),
		(None, Some(id), Some(end)) => {
			let id = DocumentId::from(id.as_str());
			let item = actor.item(&id).with_context(|| format!("{} does not own item {id}", actor.name))?;
			let kind = match item.rank(&session.config) {
				Some(_) => Progression::Rank,
				None => Progression::Level,
			};
			let range = LevelRange { start: args.start, end };
			block_on(applier.apply(actor, vec![AdvancementSource::Owned(id)], kind, range))
		}
		(None, None, Some(end)) => block_on(applier.level_up(actor, LevelRange { start: args.start, end })),
		(None, _, None) => anyhow::bail!("--end is required unless acquiring an item"),
	};
	session.finish(outcome)
}

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	mythcraft::logging::init("mythcraft", cli.log_level, &[])?;
	let config = match &cli.config {
		Some(path) => SystemConfig::from_path(path)?,
		None => SystemConfig::default(),
	};
	match cli.command {
		Command::Apply(args) => apply(config, args),
		Command::Reconfigure { session, item, advancement } => {
			let session = Session::load(config, &session)?;
			let outcome = block_on(session.applier().reconfigure(
				&session.actor,
				&DocumentId::from(item),
				&DocumentId::from(advancement),
			));
			session.finish(outcome)
		}
		Command::Derive { actor, seed } => {
			let actor: Actor = read_json(&actor)?;
			let mut rng = match seed {
				Some(seed) => StdRng::seed_from_u64(seed),
				None => StdRng::from_entropy(),
			};
			let derived = Derived::compute(&actor, &config, &mut rng);
			println!("{}", serde_json::to_string_pretty(&derived)?);
			Ok(())
		}
	}
}
