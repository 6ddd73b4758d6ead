//! Raw column values read from SQLite and their conversion into the core
//! view types.
//!
//! SQLite hands back counts as `i64`; they are never negative, so the
//! conversions clamp rather than fail.

use crimelog_core::store::{
  CampusSummary, CampusUsage, Census, IncidentListing, OffenseFrequency, Totals,
};

pub fn count(n: i64) -> u64 { u64::try_from(n).unwrap_or_default() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// One row of `v_incidents_full`.
pub struct RawListing {
  pub id:                 i64,
  pub incident_number:    Option<String>,
  pub campus:             String,
  pub reported_datetime:  String,
  pub occurred_start:     String,
  pub occurred_end:       String,
  pub nature_of_incident: String,
  pub location:           String,
  pub offenses:           Option<String>,
}

impl RawListing {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      incident_number:    row.get(1)?,
      campus:             row.get(2)?,
      reported_datetime:  row.get(3)?,
      occurred_start:     row.get(4)?,
      occurred_end:       row.get(5)?,
      nature_of_incident: row.get(6)?,
      location:           row.get(7)?,
      offenses:           row.get(8)?,
    })
  }

  pub fn into_listing(self) -> IncidentListing {
    IncidentListing {
      id:                 self.id,
      incident_number:    self.incident_number,
      campus:             self.campus,
      reported_datetime:  self.reported_datetime,
      occurred_start:     self.occurred_start,
      occurred_end:       self.occurred_end,
      nature_of_incident: self.nature_of_incident,
      location:           self.location,
      offenses:           self.offenses,
    }
  }
}

/// One row of `v_incidents_by_campus`.
pub struct RawCampusSummary {
  pub campus_name:     String,
  pub total_incidents: i64,
  pub earliest_report: Option<String>,
  pub latest_report:   Option<String>,
}

impl RawCampusSummary {
  pub fn into_summary(self) -> CampusSummary {
    CampusSummary {
      campus_name:     self.campus_name,
      total_incidents: count(self.total_incidents),
      earliest_report: self.earliest_report,
      latest_report:   self.latest_report,
    }
  }
}

/// One row of `v_top_offenses`.
pub struct RawOffenseFrequency {
  pub offense_code: String,
  pub frequency:    i64,
}

impl RawOffenseFrequency {
  pub fn into_frequency(self) -> OffenseFrequency {
    OffenseFrequency {
      offense_code: self.offense_code,
      frequency:    count(self.frequency),
    }
  }
}

pub struct RawCampusUsage {
  pub campus_code: String,
  pub campus_name: String,
  pub incidents:   i64,
}

impl RawCampusUsage {
  pub fn into_usage(self) -> CampusUsage {
    CampusUsage {
      campus_code: self.campus_code,
      campus_name: self.campus_name,
      incidents:   count(self.incidents),
    }
  }
}

pub struct RawCensus {
  pub campuses:  i64,
  pub incidents: i64,
  pub orphans:   i64,
}

impl RawCensus {
  pub fn into_census(self) -> Census {
    Census {
      campuses:  count(self.campuses),
      incidents: count(self.incidents),
      orphans:   count(self.orphans),
    }
  }
}

pub struct RawTotals {
  pub incidents:          i64,
  pub offense_types:      i64,
  pub campuses_with_data: i64,
}

impl RawTotals {
  pub fn into_totals(self) -> Totals {
    Totals {
      incidents:          count(self.incidents),
      offense_types:      count(self.offense_types),
      campuses_with_data: count(self.campuses_with_data),
    }
  }
}
