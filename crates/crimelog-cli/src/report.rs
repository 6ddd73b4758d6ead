//! Human-readable run reports printed to stdout.

use std::fmt;

use crimelog_core::{
  reconcile::ReconcileReport,
  store::{
    CampusSummary, CampusUsage, IncidentListing, IncidentStore, IngestReport, OffenseFrequency,
    Totals,
  },
};
use crimelog_store_sqlite::ExportReport;

const RULE_WIDTH: usize = 70;
const CAMPUS_ROWS: usize = 15;
const OFFENSE_ROWS: usize = 10;
const RECENT_ROWS: usize = 5;

fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result { writeln!(f, "{}", "=".repeat(RULE_WIDTH)) }

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
  let pad = RULE_WIDTH.saturating_sub(title.chars().count() + 4);
  writeln!(f, "\n── {title} {}", "─".repeat(pad))
}

fn truncate(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

// ─── Ingest ──────────────────────────────────────────────────────────────────

/// Outcome of one scrape or ingest run.
pub struct IngestSummary<'a> {
  pub fetched: usize,
  pub dropped: usize,
  pub ingest:  &'a IngestReport,
}

impl fmt::Display for IngestSummary<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "  Raw records:        {}", self.fetched)?;
    writeln!(f, "  Dropped (empty):    {}", self.dropped)?;
    writeln!(f, "  Inserted:           {}", self.ingest.inserted)?;
    writeln!(
      f,
      "  Skipped:            {} ({} duplicate, {} unknown campus)",
      self.ingest.skipped(),
      self.ingest.duplicates,
      self.ingest.unresolved
    )
  }
}

// ─── Database summary ────────────────────────────────────────────────────────

/// Snapshot of the store for the end-of-run summary.
pub struct DatabaseSummary {
  pub totals:   Totals,
  pub campuses: Vec<CampusSummary>,
  pub offenses: Vec<OffenseFrequency>,
  pub recent:   Vec<IncidentListing>,
}

impl DatabaseSummary {
  pub async fn gather<S: IncidentStore>(store: &S) -> Result<Self, S::Error> {
    let totals = store.totals().await?;
    let mut campuses = store.campus_summaries().await?;
    campuses.truncate(CAMPUS_ROWS);
    let offenses = store.top_offenses(Some(OFFENSE_ROWS)).await?;
    let recent = store.list_incidents(Some(RECENT_ROWS)).await?;
    Ok(Self { totals, campuses, offenses, recent })
  }
}

impl fmt::Display for DatabaseSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    rule(f)?;
    writeln!(f, " DATABASE SUMMARY")?;
    rule(f)?;
    writeln!(f, "  Total incidents:    {}", self.totals.incidents)?;

    if self.totals.incidents == 0 {
      writeln!(f, "\n  No incidents found in database. This could mean:")?;
      writeln!(f, "    - the website structure has changed")?;
      writeln!(f, "    - there are no incidents in the selected date range")?;
      writeln!(f, "    - network issues prevented scraping")?;
      writeln!(f, "\n  Try running with --debug for more information.")?;
      return rule(f);
    }

    writeln!(f, "  Unique offenses:    {}", self.totals.offense_types)?;
    writeln!(f, "  Campuses with data: {}", self.totals.campuses_with_data)?;

    heading(f, "Incidents by Campus")?;
    writeln!(f, "  {:<25} {:>6} {:>12}", "Campus", "Total", "Latest")?;
    writeln!(f, "  {}", "-".repeat(45))?;
    for c in &self.campuses {
      let latest = c.latest_report.as_deref().map_or("N/A", |l| truncate(l, 10));
      writeln!(f, "  {:<25} {:>6} {:>12}", c.campus_name, c.total_incidents, latest)?;
    }

    heading(f, "Top Offense Types")?;
    if self.offenses.is_empty() {
      writeln!(f, "  No offense data available")?;
    }
    for o in &self.offenses {
      writeln!(f, "  {:<50} {:>4}x", o.offense_code, o.frequency)?;
    }

    heading(f, "Recent Incidents")?;
    for i in &self.recent {
      writeln!(f, "\n  {} - {}", i.incident_number.as_deref().unwrap_or("N/A"), i.campus)?;
      writeln!(f, "  {}", truncate(&i.nature_of_incident, 65))?;
      writeln!(f, "  Reported: {}", i.reported_datetime)?;
    }

    writeln!(f)?;
    rule(f)
  }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Reconciliation outcome plus the resulting campus table.
pub struct ReconcileSummary<'a> {
  pub report:   &'a ReconcileReport,
  pub campuses: &'a [CampusUsage],
}

impl fmt::Display for ReconcileSummary<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let store = &self.report.store;
    rule(f)?;
    writeln!(f, " STORE RECONCILIATION")?;
    rule(f)?;
    writeln!(
      f,
      "  Before: {} campuses, {} incidents, {} orphaned",
      store.before.campuses, store.before.incidents, store.before.orphans
    )?;
    for r in &store.repointed {
      writeln!(
        f,
        "  Repointed {} -> {}: {} incidents",
        r.correction.deprecated, r.correction.canonical, r.incidents
      )?;
    }
    writeln!(
      f,
      "  After:  {} campuses, {} incidents, {} orphaned",
      store.after.campuses, store.after.incidents, store.after.orphans
    )?;
    if store.has_orphans() {
      writeln!(f, "  WARNING: {} incidents reference a missing campus", store.after.orphans)?;
    }

    writeln!(f, "\n  Final campus list:")?;
    for c in self.campuses {
      writeln!(f, "    {:<5} {:<28} {:>6}", c.campus_code, c.campus_name, c.incidents)?;
    }

    if let Some(mirror) = &self.report.mirror {
      writeln!(f)?;
      rule(f)?;
      writeln!(f, " MIRROR RECONCILIATION")?;
      rule(f)?;
      writeln!(f, "  Records processed:         {}", mirror.records)?;
      writeln!(f, "  Campus code fixes applied: {}", mirror.fixes)?;
      let codes: Vec<&str> = mirror.codes_after.iter().map(String::as_str).collect();
      writeln!(f, "  Unique codes after:        {}", codes.join(", "))?;
    }
    Ok(())
  }
}

// ─── Export ──────────────────────────────────────────────────────────────────

pub struct ExportSummary<'a>(pub &'a ExportReport);

impl fmt::Display for ExportSummary<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    rule(f)?;
    writeln!(f, " EXPORT")?;
    rule(f)?;
    for (table, path, rows) in &self.0.tables {
      writeln!(f, "  Exported {table}: {rows} rows -> {}", path.display())?;
    }
    writeln!(f, "  Copied database -> {}", self.0.database.display())
  }
}
