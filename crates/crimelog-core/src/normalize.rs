//! Raw record → [`NormalizedRecord`].
//!
//! Pipeline per record:
//!   RawRecord
//!     └─ acceptance filter       (number / reported / nature present?)
//!          └─ resolve_campus_code() → explicit, incident number, label
//!               └─ split_occurred()    → (start, end)
//!                    └─ split_offenses()    → ordered offense codes

use std::sync::OnceLock;

use regex::Regex;

use crate::{
  campus::Vocabulary,
  record::{NormalizedRecord, RawRecord},
};

/// Offense lines longer than this are extraction debris, not codes.
pub const MAX_OFFENSE_LEN: usize = 200;

const OCCURRED_SEPARATOR: &str = " to ";

fn incident_code_re() -> &'static Regex {
  static INCIDENT_CODE_RE: OnceLock<Regex> = OnceLock::new();
  INCIDENT_CODE_RE.get_or_init(|| {
    Regex::new(r"^\d{2}([A-Z]{2,4})").expect("valid incident code regex")
  })
}

// ─── Field helpers ───────────────────────────────────────────────────────────

/// Trimmed, non-empty contents of an optional field.
fn present(field: &Option<String>) -> Option<&str> {
  field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Campus code embedded in an incident number, e.g. `"24UP12345"` → `"UP"`.
pub fn campus_code_from_incident_number(number: &str) -> Option<&str> {
  incident_code_re()
    .captures(number.trim())
    .and_then(|c| c.get(1))
    .map(|m| m.as_str())
}

/// Split an occurred field on the first `" to "`.
///
/// Without a separator the whole (trimmed) field is the start and the end is
/// empty.
pub fn split_occurred(occurred: &str) -> (String, String) {
  match occurred.split_once(OCCURRED_SEPARATOR) {
    Some((start, end)) => (start.trim().to_owned(), end.trim().to_owned()),
    None => (occurred.trim().to_owned(), String::new()),
  }
}

/// One offense code per non-empty line, in source order. Duplicates are kept.
pub fn split_offenses(text: &str) -> Vec<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .filter(|line| line.chars().count() <= MAX_OFFENSE_LEN)
    .map(str::to_owned)
    .collect()
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Converts raw records using a borrowed [`Vocabulary`].
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'v> {
  vocab: &'v Vocabulary,
}

/// Accepted records in input order plus how many were dropped.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
  pub records: Vec<NormalizedRecord>,
  pub dropped: usize,
}

impl<'v> Normalizer<'v> {
  pub fn new(vocab: &'v Vocabulary) -> Self { Self { vocab } }

  /// Resolve the campus code: explicit code first, then the incident number,
  /// then an exact canonical name match on the label.
  pub fn resolve_campus_code(&self, raw: &RawRecord) -> Option<String> {
    if let Some(code) = present(&raw.campus_code) {
      return Some(code.to_owned());
    }
    if let Some(code) =
      present(&raw.incident_number).and_then(campus_code_from_incident_number)
    {
      return Some(code.to_owned());
    }
    present(&raw.campus_label)
      .and_then(|label| self.vocab.code_for_name(label))
      .map(str::to_owned)
  }

  /// Normalize one record, or `None` if it carries nothing identifying.
  pub fn normalize(&self, raw: &RawRecord) -> Option<NormalizedRecord> {
    let incident_number = present(&raw.incident_number).map(str::to_owned);
    let reported = present(&raw.reported_datetime).unwrap_or_default();
    let nature = present(&raw.nature_of_incident).unwrap_or_default();

    if incident_number.is_none() && reported.is_empty() && nature.is_empty() {
      tracing::debug!("dropping record with no incident number, report time or nature");
      return None;
    }

    let campus_code = self.resolve_campus_code(raw);
    let campus_name = present(&raw.campus_label).map(str::to_owned).or_else(|| {
      campus_code
        .as_deref()
        .filter(|code| self.vocab.is_known(code))
        .map(|code| self.vocab.name_for(code).to_owned())
    });

    let (occurred_start, occurred_end) =
      split_occurred(raw.occurred_datetime.as_deref().unwrap_or_default());
    let offenses = split_offenses(raw.offenses.as_deref().unwrap_or_default());

    Some(NormalizedRecord {
      incident_number,
      campus_code,
      campus_name,
      reported_datetime: reported.to_owned(),
      occurred_start,
      occurred_end,
      nature_of_incident: nature.to_owned(),
      location: present(&raw.location).unwrap_or_default().to_owned(),
      offenses,
    })
  }

  pub fn normalize_batch(&self, raws: &[RawRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for raw in raws {
      match self.normalize(raw) {
        Some(record) => batch.records.push(record),
        None => batch.dropped += 1,
      }
    }
    batch
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn vocab() -> Vocabulary { Vocabulary::penn_state().unwrap() }

  fn raw(number: &str) -> RawRecord {
    RawRecord {
      incident_number: Some(number.into()),
      ..RawRecord::default()
    }
  }

  #[test]
  fn extracts_code_from_incident_number() {
    assert_eq!(campus_code_from_incident_number("24UP12345"), Some("UP"));
    assert_eq!(campus_code_from_incident_number("24BKT00012"), Some("BKT"));
    assert_eq!(campus_code_from_incident_number("25PSHI0001"), Some("PSHI"));
    assert_eq!(campus_code_from_incident_number("UP12345"), None);
    assert_eq!(campus_code_from_incident_number("2UP12345"), None);
  }

  #[test]
  fn occurred_range_splits_into_trimmed_parts() {
    let (start, end) = split_occurred(" 01/02/2025 10:00 PM to  01/03/2025 01:00 AM ");
    assert_eq!(start, "01/02/2025 10:00 PM");
    assert_eq!(end, "01/03/2025 01:00 AM");
  }

  #[test]
  fn occurred_without_separator_has_empty_end() {
    let (start, end) = split_occurred("  01/02/2025 10:00 PM ");
    assert_eq!(start, "01/02/2025 10:00 PM");
    assert_eq!(end, "");

    assert_eq!(split_occurred(""), (String::new(), String::new()));
  }

  #[test]
  fn offense_split_drops_blank_and_oversized_lines() {
    let long = "X".repeat(MAX_OFFENSE_LEN + 1);
    let text = format!("THEFT\n\n  {long}\r\nDISORDERLY CONDUCT\nTHEFT\n");
    assert_eq!(
      split_offenses(&text),
      vec!["THEFT", "DISORDERLY CONDUCT", "THEFT"]
    );
  }

  #[test]
  fn offense_of_exactly_max_len_is_kept() {
    let exact = "Y".repeat(MAX_OFFENSE_LEN);
    assert_eq!(split_offenses(&exact), vec![exact]);
  }

  #[test]
  fn explicit_code_beats_incident_number() {
    let v = vocab();
    let n = Normalizer::new(&v);
    let mut r = raw("24UP00001");
    r.campus_code = Some("AL".into());
    assert_eq!(n.resolve_campus_code(&r).as_deref(), Some("AL"));
  }

  #[test]
  fn incident_number_beats_label() {
    let v = vocab();
    let n = Normalizer::new(&v);
    let mut r = raw("24HN00007");
    r.campus_label = Some("Altoona".into());
    assert_eq!(n.resolve_campus_code(&r).as_deref(), Some("HN"));
  }

  #[test]
  fn label_is_the_last_resort() {
    let v = vocab();
    let n = Normalizer::new(&v);
    let r = RawRecord {
      incident_number: Some("PSU-000123".into()),
      campus_label: Some("Erie (Behrend)".into()),
      ..RawRecord::default()
    };
    assert_eq!(n.resolve_campus_code(&r).as_deref(), Some("BE"));

    let r = RawRecord {
      campus_label: Some("Narnia".into()),
      ..RawRecord::default()
    };
    assert_eq!(n.resolve_campus_code(&r), None);
  }

  #[test]
  fn unknown_captured_code_is_kept_verbatim() {
    let v = vocab();
    let n = Normalizer::new(&v);
    let rec = n.normalize(&raw("24QQ00001")).unwrap();
    assert_eq!(rec.campus_code.as_deref(), Some("QQ"));
    assert_eq!(rec.campus_name, None);
  }

  #[test]
  fn campus_name_falls_back_to_vocabulary() {
    let v = vocab();
    let n = Normalizer::new(&v);
    let rec = n.normalize(&raw("24HN00007")).unwrap();
    assert_eq!(rec.campus_name.as_deref(), Some("Hershey"));
  }

  #[test]
  fn records_without_identifying_fields_are_dropped() {
    let v = vocab();
    let n = Normalizer::new(&v);
    let empty = RawRecord {
      incident_number: Some("   ".into()),
      location: Some("Somewhere".into()),
      offenses: Some("THEFT".into()),
      ..RawRecord::default()
    };
    assert!(n.normalize(&empty).is_none());

    let nature_only = RawRecord {
      nature_of_incident: Some("Theft of bicycle".into()),
      ..RawRecord::default()
    };
    let rec = n.normalize(&nature_only).unwrap();
    assert_eq!(rec.incident_number, None);
    assert_eq!(rec.campus_code, None);
  }

  #[test]
  fn batch_keeps_order_and_counts_drops() {
    let v = vocab();
    let n = Normalizer::new(&v);
    let batch = n.normalize_batch(&[
      raw("24UP00002"),
      RawRecord::default(),
      raw("24UP00001"),
    ]);
    assert_eq!(batch.dropped, 1);
    let numbers: Vec<_> = batch
      .records
      .iter()
      .map(|r| r.incident_number.as_deref().unwrap())
      .collect();
    assert_eq!(numbers, ["24UP00002", "24UP00001"]);
  }
}
