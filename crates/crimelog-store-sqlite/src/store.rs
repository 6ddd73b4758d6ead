//! [`SqliteStore`]: the SQLite implementation of [`IncidentStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::OptionalExtension as _;

use crimelog_core::{
  campus::Vocabulary,
  record::NormalizedRecord,
  store::{
    CampusSummary, CampusUsage, Census, IncidentListing, IncidentStore,
    IngestReport, OffenseFrequency, Totals,
  },
};

use crate::{
  Error, Result,
  rows::{
    RawCampusSummary, RawCampusUsage, RawCensus, RawListing,
    RawOffenseFrequency, RawTotals,
  },
  schema::{CONNECTION_PRAGMAS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An incident store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

/// Result of writing one incident row.
enum InsertOutcome {
  Inserted,
  Duplicate,
}

/// `LIMIT` value for an optional row cap; SQLite treats `-1` as unbounded.
fn sql_limit(limit: Option<usize>) -> i64 { limit.map_or(-1, |l| l as i64) }

/// Campus row for a record: its code first, then its label through the
/// canonical name table.
fn resolve_campus_id(
  record:     &NormalizedRecord,
  campus_ids: &HashMap<String, i64>,
  vocab:      &Vocabulary,
) -> Option<i64> {
  record
    .campus_code
    .as_deref()
    .and_then(|code| campus_ids.get(code))
    .or_else(|| {
      record
        .campus_name
        .as_deref()
        .and_then(|name| vocab.code_for_name(name))
        .and_then(|code| campus_ids.get(code))
    })
    .copied()
}

impl SqliteStore {
  /// Open (or create) a store at `path`. Call
  /// [`IncidentStore::initialize`] before use.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  async fn apply_pragmas(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// `campus_code -> campus_id` for every seeded campus.
  async fn campus_ids(&self) -> Result<HashMap<String, i64>> {
    let ids = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT campus_code, campus_id FROM campuses")?;
        let ids = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<HashMap<String, i64>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  /// Insert one incident with its offense links in a single transaction.
  ///
  /// A non-NULL incident number that already exists leaves the store
  /// untouched.
  async fn insert_incident(
    &self,
    campus_id: i64,
    record:    NormalizedRecord,
  ) -> Result<InsertOutcome> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let inserted = tx.execute(
          "INSERT INTO incidents (
             incident_number, campus_id, reported_datetime,
             occurred_start, occurred_end, nature_of_incident, location
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT(incident_number) DO NOTHING",
          rusqlite::params![
            record.incident_number,
            campus_id,
            record.reported_datetime,
            record.occurred_start,
            record.occurred_end,
            record.nature_of_incident,
            record.location,
          ],
        )?;
        if inserted == 0 {
          return Ok(InsertOutcome::Duplicate);
        }
        let incident_id = tx.last_insert_rowid();

        {
          let mut add_type =
            tx.prepare("INSERT OR IGNORE INTO offense_types (offense_code) VALUES (?1)")?;
          let mut type_id =
            tx.prepare("SELECT offense_id FROM offense_types WHERE offense_code = ?1")?;
          let mut link = tx.prepare(
            "INSERT OR IGNORE INTO incident_offenses (incident_id, offense_id)
             VALUES (?1, ?2)",
          )?;

          for code in &record.offenses {
            add_type.execute([code])?;
            let offense_id: i64 = type_id.query_row([code], |r| r.get(0))?;
            link.execute(rusqlite::params![incident_id, offense_id])?;
          }
        }

        tx.commit()?;
        Ok(InsertOutcome::Inserted)
      })
      .await?;
    Ok(outcome)
  }
}

// ─── IncidentStore impl ──────────────────────────────────────────────────────

impl IncidentStore for SqliteStore {
  type Error = Error;

  // ── Setup ─────────────────────────────────────────────────────────────────

  async fn initialize(&self, vocab: &Vocabulary) -> Result<()> {
    let seed = vocab.seed_rows();

    self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;

        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO campuses (campus_code, campus_name) VALUES (?1, ?2)",
          )?;
          for (code, name) in &seed {
            stmt.execute(rusqlite::params![code, name])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn ingest(
    &self,
    records: &[NormalizedRecord],
    vocab:   &Vocabulary,
  ) -> Result<IngestReport> {
    let campus_ids = self.campus_ids().await?;
    let mut report = IngestReport::default();

    for record in records {
      let incident = record.incident_number.as_deref().unwrap_or("<none>");

      let Some(campus_id) = resolve_campus_id(record, &campus_ids, vocab) else {
        tracing::warn!(
          incident,
          code = record.campus_code.as_deref().unwrap_or(""),
          campus = record.campus_name.as_deref().unwrap_or(""),
          "skipping record, cannot determine campus"
        );
        report.unresolved += 1;
        continue;
      };

      match self.insert_incident(campus_id, record.clone()).await? {
        InsertOutcome::Inserted => report.inserted += 1,
        InsertOutcome::Duplicate => {
          tracing::debug!(incident, "incident already exists, skipping");
          report.duplicates += 1;
        }
      }
    }

    tracing::info!(
      inserted = report.inserted,
      duplicates = report.duplicates,
      unresolved = report.unresolved,
      "ingested batch"
    );
    Ok(report)
  }

  async fn repoint_campus(&self, from_code: &str, to_code: &str) -> Result<u64> {
    let from = from_code.to_owned();
    let to = to_code.to_owned();

    let moved: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let to_id: Option<i64> = tx
          .query_row(
            "SELECT campus_id FROM campuses WHERE campus_code = ?1",
            [&to],
            |r| r.get(0),
          )
          .optional()?;
        let Some(to_id) = to_id else {
          return Ok(None);
        };

        let moved = tx.execute(
          "UPDATE incidents SET campus_id = ?1
           WHERE campus_id IN (SELECT campus_id FROM campuses WHERE campus_code = ?2)",
          rusqlite::params![to_id, from],
        )?;
        tx.commit()?;
        Ok(Some(moved))
      })
      .await?;

    match moved {
      Some(n) => Ok(n as u64),
      None => Err(Error::UnknownCampus(to_code.to_owned())),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn census(&self) -> Result<Census> {
    let raw = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM campuses),
             (SELECT COUNT(*) FROM incidents),
             (SELECT COUNT(*) FROM incidents i
                LEFT JOIN campuses c ON c.campus_id = i.campus_id
               WHERE c.campus_id IS NULL)",
          [],
          |row| {
            Ok(RawCensus {
              campuses:  row.get(0)?,
              incidents: row.get(1)?,
              orphans:   row.get(2)?,
            })
          },
        )?)
      })
      .await?;
    Ok(raw.into_census())
  }

  async fn totals(&self) -> Result<Totals> {
    let raw = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM incidents),
             (SELECT COUNT(*) FROM offense_types),
             (SELECT COUNT(DISTINCT campus_id) FROM incidents)",
          [],
          |row| {
            Ok(RawTotals {
              incidents:          row.get(0)?,
              offense_types:      row.get(1)?,
              campuses_with_data: row.get(2)?,
            })
          },
        )?)
      })
      .await?;
    Ok(raw.into_totals())
  }

  async fn list_incidents(&self, limit: Option<usize>) -> Result<Vec<IncidentListing>> {
    let limit_val = sql_limit(limit);

    let raws: Vec<RawListing> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             id, incident_number, campus, reported_datetime,
             occurred_start, occurred_end, nature_of_incident, location,
             offenses
           FROM v_incidents_full
           ORDER BY reported_datetime DESC, id DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map([limit_val], RawListing::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawListing::into_listing).collect())
  }

  async fn incident_offenses(&self, incident_number: &str) -> Result<Vec<String>> {
    let number = incident_number.to_owned();

    let codes = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ot.offense_code
           FROM incident_offenses io
           JOIN incidents     i  ON i.id = io.incident_id
           JOIN offense_types ot ON ot.offense_id = io.offense_id
           WHERE i.incident_number = ?1
           ORDER BY io.rowid",
        )?;
        let rows = stmt
          .query_map([number], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(codes)
  }

  async fn campus_summaries(&self) -> Result<Vec<CampusSummary>> {
    let raws: Vec<RawCampusSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT campus_name, total_incidents, earliest_report, latest_report
           FROM v_incidents_by_campus",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCampusSummary {
              campus_name:     row.get(0)?,
              total_incidents: row.get(1)?,
              earliest_report: row.get(2)?,
              latest_report:   row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawCampusSummary::into_summary).collect())
  }

  async fn top_offenses(&self, limit: Option<usize>) -> Result<Vec<OffenseFrequency>> {
    let limit_val = sql_limit(limit);

    let raws: Vec<RawOffenseFrequency> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT offense_code, frequency FROM v_top_offenses LIMIT ?1",
        )?;
        let rows = stmt
          .query_map([limit_val], |row| {
            Ok(RawOffenseFrequency {
              offense_code: row.get(0)?,
              frequency:    row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawOffenseFrequency::into_frequency).collect())
  }

  async fn campus_usage(&self) -> Result<Vec<CampusUsage>> {
    let raws: Vec<RawCampusUsage> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT c.campus_code, c.campus_name, COUNT(i.id)
           FROM campuses c
           LEFT JOIN incidents i ON i.campus_id = c.campus_id
           GROUP BY c.campus_id
           ORDER BY c.campus_code",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCampusUsage {
              campus_code: row.get(0)?,
              campus_name: row.get(1)?,
              incidents:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawCampusUsage::into_usage).collect())
  }
}
