//! `quiz` — loads quiz fixture batches into a SQLite store.
//!
//! # Usage
//!
//! ```text
//! quiz load                         # every batch
//! quiz load --group certification11 # one group plus its dependencies
//! quiz plan --group questions       # print the load order only
//! quiz stats
//! ```
//!
//! Settings come from `quiz.toml` (or `--config`) and `QUIZ_*` environment
//! variables.

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use quiz_core::{fixture::FixtureBatch, loader::FixtureLoader, plan::LoadPlan};
use quiz_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Load quiz fixture batches into a SQLite store")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "quiz.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Upsert fixture batches in dependency order.
  Load {
    /// Only load batches in this group (and their dependencies). Repeatable.
    #[arg(short, long = "group")]
    groups: Vec<String>,

    /// Print the load report as JSON.
    #[arg(long)]
    json: bool,
  },

  /// Print the batches that `load` would run, in order.
  Plan {
    #[arg(short, long = "group")]
    groups: Vec<String>,
  },

  /// Show row counts for every table.
  Stats,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  match cli.command {
    Command::Plan { groups } => {
      let batches = all_batches(&settings)?;
      let plan = LoadPlan::new(&batches, &groups)?;
      for (i, batch) in plan.batches().iter().enumerate() {
        println!(
          "{:>3}. {:<28} {:>3} questions  groups: {}",
          i + 1,
          batch.name,
          batch.questions.len(),
          batch.groups.join(", ")
        );
      }
    }

    Command::Load { groups, json } => {
      let batches = all_batches(&settings)?;
      let plan = LoadPlan::new(&batches, &groups)?;
      let store = open_store(&settings).await?;

      tracing::info!(batches = plan.len(), "loading fixtures");
      let report = FixtureLoader::new(&store)
        .load(&plan)
        .await
        .context("fixture load aborted")?;

      if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
      } else {
        for b in &report.batches {
          println!(
            "  - {:<28} created: {:<4} updated: {:<4} unchanged: {}",
            b.batch, b.created, b.updated, b.unchanged
          );
        }
      }
    }

    Command::Stats => {
      let store = open_store(&settings).await?;
      let counts = store.counts().await?;
      println!("Categories:    {}", counts.categories);
      println!("Subcategories: {}", counts.subcategories);
      println!("Questions:     {}", counts.questions);
      println!("Answers:       {}", counts.answers);
    }
  }

  Ok(())
}

/// Built-in batches followed by any from the configured directory.
fn all_batches(settings: &Settings) -> anyhow::Result<Vec<FixtureBatch>> {
  let mut batches =
    quiz_fixtures::builtin().context("failed to parse built-in batches")?;

  if let Some(dir) = &settings.fixtures_dir {
    let extra = quiz_fixtures::load_dir(dir)
      .with_context(|| format!("failed to read batches from {dir:?}"))?;
    tracing::info!(count = extra.len(), dir = %dir.display(), "read extra batches");
    batches.extend(extra);
  }

  Ok(batches)
}

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(&settings.database_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.database_path))
}
