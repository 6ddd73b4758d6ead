//! The `IncidentStore` trait and the report and view types it returns.
//!
//! The trait is implemented by storage backends (e.g. `crimelog-store-sqlite`).
//! The reconciliation pass and the CLI depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde::Serialize;

use crate::{campus::Vocabulary, record::NormalizedRecord};

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Counts from one [`IncidentStore::ingest`] batch.
///
/// Duplicates and unresolvable campuses are both "skipped" but are counted
/// apart; store faults never show up here, they fail the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
  pub inserted:   u64,
  /// Incident number already present; first write wins.
  pub duplicates: u64,
  /// Neither the campus code nor the label matched a campus row.
  pub unresolved: u64,
}

impl IngestReport {
  pub fn skipped(&self) -> u64 { self.duplicates + self.unresolved }
}

/// Row counts used to bracket the reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Census {
  pub campuses:  u64,
  pub incidents: u64,
  /// Incidents whose `campus_id` matches no campus row.
  pub orphans:   u64,
}

// ─── Read views ──────────────────────────────────────────────────────────────

/// One row of the denormalized incident listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentListing {
  pub id:                 i64,
  pub incident_number:    Option<String>,
  pub campus:             String,
  pub reported_datetime:  String,
  pub occurred_start:     String,
  pub occurred_end:       String,
  pub nature_of_incident: String,
  pub location:           String,
  /// Offense codes joined with `" | "`, in link order.
  pub offenses:           Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampusSummary {
  pub campus_name:     String,
  pub total_incidents: u64,
  pub earliest_report: Option<String>,
  pub latest_report:   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffenseFrequency {
  pub offense_code: String,
  pub frequency:    u64,
}

/// Number of incidents pointing at each campus row, including empty rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampusUsage {
  pub campus_code: String,
  pub campus_name: String,
  pub incidents:   u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
  pub incidents:          u64,
  pub offense_types:      u64,
  pub campuses_with_data: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an incident store backend.
///
/// Writers are assumed to be single and sequential: ingestion completes before
/// reconciliation starts. Re-running either stage is safe because every write
/// is insert-if-absent or a no-op repoint.
pub trait IncidentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Setup ─────────────────────────────────────────────────────────────

  /// Create schema objects if absent and seed campuses from `vocab`.
  /// Safe to call on a populated store.
  fn initialize<'a>(
    &'a self,
    vocab: &'a Vocabulary,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist `records` in order. Per-record problems are counted in the
  /// report; only backend faults return `Err`.
  fn ingest<'a>(
    &'a self,
    records: &'a [NormalizedRecord],
    vocab: &'a Vocabulary,
  ) -> impl Future<Output = Result<IngestReport, Self::Error>> + Send + 'a;

  /// Move every incident on campus `from_code` to campus `to_code` and
  /// return how many moved.
  fn repoint_campus<'a>(
    &'a self,
    from_code: &'a str,
    to_code: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn census(&self) -> impl Future<Output = Result<Census, Self::Error>> + Send + '_;

  fn totals(&self) -> impl Future<Output = Result<Totals, Self::Error>> + Send + '_;

  /// Incidents ordered by reported time, newest first.
  fn list_incidents(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<IncidentListing>, Self::Error>> + Send + '_;

  /// Offense codes linked to `incident_number`, in link order.
  fn incident_offenses<'a>(
    &'a self,
    incident_number: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Per-campus totals, busiest campus first.
  fn campus_summaries(
    &self,
  ) -> impl Future<Output = Result<Vec<CampusSummary>, Self::Error>> + Send + '_;

  /// Offense codes by link count, most frequent first.
  fn top_offenses(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<OffenseFrequency>, Self::Error>> + Send + '_;

  /// Incident count per campus row, ordered by campus code.
  fn campus_usage(
    &self,
  ) -> impl Future<Output = Result<Vec<CampusUsage>, Self::Error>> + Send + '_;
}
