//! `crimelog`: scrape the Penn State daily crime log into SQLite.
//!
//! # Usage
//!
//! ```
//! crimelog scrape --days 60
//! crimelog scrape --campus "university park" --debug
//! crimelog ingest --input records.json
//! crimelog reconcile
//! crimelog summary
//! ```
//!
//! Settings come from `crimelog.toml` (or `--config`) layered under
//! `CRIMELOG_*` environment variables.

mod config;
mod fetch;
mod report;

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use anyhow::{Context as _, anyhow};
use clap::{Parser, Subcommand};
use crimelog_core::{
  campus::Vocabulary,
  mirror::Mirror,
  normalize::Normalizer,
  reconcile::reconcile,
  record::RawRecord,
  store::IncidentStore,
};
use crimelog_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  config::CrawlerConfig,
  fetch::{DateRange, Fetcher},
  report::{DatabaseSummary, ExportSummary, IngestSummary, ReconcileSummary},
};

/// Exit status when reconciliation leaves incidents without a campus.
const EXIT_ORPHANS: u8 = 2;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Penn State daily crime log scraper")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(long, global = true, value_name = "FILE", default_value = "crimelog.toml")]
  config: PathBuf,

  /// Database file, overriding the configured path.
  #[arg(long, global = true, value_name = "FILE")]
  database: Option<PathBuf>,

  /// Verbose logging; `scrape` also saves every fetched page.
  #[arg(short = 'v', long, global = true)]
  debug: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Crawl the crime log and ingest every incident found.
  Scrape {
    /// Days back from today to request.
    #[arg(short, long)]
    days:   Option<u32>,
    /// Only the first campus whose name contains this text.
    #[arg(short, long)]
    campus: Option<String>,
  },
  /// Ingest a JSON array of raw records instead of crawling.
  Ingest {
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
  },
  /// Rewrite deprecated campus codes in the store and the JSON mirror.
  Reconcile {
    /// Skip the CSV and database export afterwards.
    #[arg(long)]
    no_export: bool,
  },
  /// Write CSV snapshots and a database copy to the data directory.
  Export,
  /// Print totals, busiest campuses, top offenses and recent incidents.
  Summary,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  let cli = Cli::parse();

  let default_level = if cli.debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy(),
    )
    .init();

  let mut cfg = CrawlerConfig::load(cli.config)?;
  if let Some(path) = cli.database {
    cfg.database_path = path;
  }

  let vocab = Vocabulary::penn_state().context("campus vocabulary is inconsistent")?;

  let store = SqliteStore::open(&cfg.database_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.database_path))?;
  store
    .initialize(&vocab)
    .await
    .context("failed to initialize store")?;

  match cli.command {
    Command::Scrape { days, campus } => {
      scrape(&cfg, &store, &vocab, days, campus.as_deref(), cli.debug).await
    }
    Command::Ingest { input } => {
      let raws = read_raw_records(&input)?;
      tracing::info!(path = %input.display(), count = raws.len(), "read raw records");
      ingest(&cfg, &store, &vocab, &raws).await
    }
    Command::Reconcile { no_export } => run_reconcile(&cfg, &store, &vocab, !no_export).await,
    Command::Export => {
      export(&cfg, &store).await?;
      Ok(ExitCode::SUCCESS)
    }
    Command::Summary => {
      print_summary(&store).await?;
      Ok(ExitCode::SUCCESS)
    }
  }
}

// ─── Subcommands ──────────────────────────────────────────────────────────────

async fn scrape(
  cfg: &CrawlerConfig,
  store: &SqliteStore,
  vocab: &Vocabulary,
  days: Option<u32>,
  campus: Option<&str>,
  save_pages: bool,
) -> anyhow::Result<ExitCode> {
  let filters = match campus {
    Some(query) => {
      let filter = vocab
        .find_filter(query)
        .ok_or_else(|| anyhow!("campus {query:?} not found"))?;
      vec![filter.clone()]
    }
    None => vocab.filters().to_vec(),
  };

  let days = days.unwrap_or(cfg.days);
  let range = DateRange::ending_on(chrono::Local::now().date_naive(), days);
  tracing::info!(
    days,
    campuses = filters.len(),
    database = %cfg.database_path.display(),
    save_pages,
    "starting scrape"
  );

  let fetcher = Fetcher::new(cfg.clone(), save_pages)?;
  let raws = fetcher.scrape_all(&filters, &range).await;
  tracing::info!(count = raws.len(), "total records scraped");

  if raws.is_empty() {
    tracing::warn!(
      "no records were scraped; the date range may be empty, the site layout may have \
       changed, or the network may be down. Try --debug or a larger --days"
    );
    return Ok(ExitCode::FAILURE);
  }

  ingest(cfg, store, vocab, &raws).await
}

fn read_raw_records(path: &Path) -> anyhow::Result<Vec<RawRecord>> {
  let file = std::fs::File::open(path)
    .with_context(|| format!("failed to open {}", path.display()))?;
  serde_json::from_reader(std::io::BufReader::new(file))
    .with_context(|| format!("failed to parse raw records in {}", path.display()))
}

/// Normalize, persist, rewrite the mirror and print the summary.
async fn ingest(
  cfg: &CrawlerConfig,
  store: &SqliteStore,
  vocab: &Vocabulary,
  raws: &[RawRecord],
) -> anyhow::Result<ExitCode> {
  let batch = Normalizer::new(vocab).normalize_batch(raws);
  let report = store
    .ingest(&batch.records, vocab)
    .await
    .context("failed to ingest records")?;

  let mirror = Mirror::new(batch.records);
  mirror
    .save(&cfg.mirror_path)
    .with_context(|| format!("failed to write mirror {}", cfg.mirror_path.display()))?;
  tracing::info!(path = %cfg.mirror_path.display(), records = mirror.records.len(), "wrote mirror");

  print!("{}", IngestSummary {
    fetched: raws.len(),
    dropped: batch.dropped,
    ingest:  &report,
  });
  print_summary(store).await?;
  Ok(ExitCode::SUCCESS)
}

async fn run_reconcile(
  cfg: &CrawlerConfig,
  store: &SqliteStore,
  vocab: &Vocabulary,
  export_after: bool,
) -> anyhow::Result<ExitCode> {
  let mut mirror = if cfg.mirror_path.exists() {
    Some(
      Mirror::load(&cfg.mirror_path)
        .with_context(|| format!("failed to read mirror {}", cfg.mirror_path.display()))?,
    )
  } else {
    tracing::info!(path = %cfg.mirror_path.display(), "no mirror to reconcile");
    None
  };

  let report = reconcile(store, mirror.as_mut(), vocab)
    .await
    .context("reconciliation failed")?;

  if let Some(mirror) = &mirror {
    mirror
      .save(&cfg.mirror_path)
      .with_context(|| format!("failed to write mirror {}", cfg.mirror_path.display()))?;
  }

  let leftover = report.deprecated_codes_left(vocab);
  if !leftover.is_empty() {
    tracing::warn!(codes = ?leftover, "mirror still holds deprecated campus codes");
  }

  let campuses = store.campus_usage().await.context("failed to list campuses")?;
  print!("{}", ReconcileSummary {
    report:   &report,
    campuses: &campuses,
  });

  if export_after {
    export(cfg, store).await?;
  }

  if report.store.has_orphans() {
    return Ok(ExitCode::from(EXIT_ORPHANS));
  }
  Ok(ExitCode::SUCCESS)
}

async fn export(cfg: &CrawlerConfig, store: &SqliteStore) -> anyhow::Result<()> {
  let report = store
    .export_snapshot(&cfg.data_dir, &cfg.database_file_name())
    .await
    .with_context(|| format!("failed to export to {}", cfg.data_dir.display()))?;
  print!("{}", ExportSummary(&report));
  Ok(())
}

async fn print_summary(store: &SqliteStore) -> anyhow::Result<()> {
  let summary = DatabaseSummary::gather(store)
    .await
    .context("failed to read database summary")?;
  print!("{summary}");
  Ok(())
}
