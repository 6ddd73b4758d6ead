//! Campus vocabulary: canonical codes, the alternate codes seen in the wild,
//! and the correction map between them.
//!
//! The vocabulary is built once at startup and handed by reference to the
//! normalizer, the store and the reconciliation pass. Construction fails if
//! the alternate table and the correction map disagree.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Returned by [`Vocabulary::name_for`] for codes outside the extended table.
pub const UNKNOWN_CAMPUS: &str = "unknown";

// ─── Built-in tables ─────────────────────────────────────────────────────────

const PSU_CANONICAL: &[(&str, &str)] = &[
  ("UP", "University Park"),
  ("AB", "Abington"),
  ("AL", "Altoona"),
  ("BK", "Beaver"),
  ("BE", "Erie (Behrend)"),
  ("BR", "Berks"),
  ("BW", "Brandywine"),
  ("DL", "Dickinson Law"),
  ("DB", "DuBois"),
  ("FA", "Fayette"),
  ("GA", "Greater Allegheny"),
  ("GV", "Great Valley"),
  ("HB", "Harrisburg"),
  ("HZ", "Hazleton"),
  ("HS", "Hershey"),
  ("LV", "Lehigh Valley"),
  ("MA", "Mont Alto"),
  ("NK", "New Kensington"),
  ("SK", "Schuylkill"),
  ("SH", "Shenango"),
  ("WB", "Wilkes-Barre"),
  ("WS", "Worthington Scranton"),
  ("YK", "York"),
];

/// Codes observed in incident numbers that are not canonical.
const PSU_ALTERNATES: &[(&str, &str)] = &[
  ("HN", "Hershey"),
  ("ER", "Erie (Behrend)"),
  ("BKT", "Beaver"),
  ("SL", "Schuylkill"),
  ("DS", "DuBois"),
  ("FE", "Fayette"),
  ("ABT", "Abington"),
  ("PSHI", "University Park"),
];

const PSU_CORRECTIONS: &[(&str, &str)] = &[
  ("HN", "HS"),
  ("ER", "BE"),
  ("BKT", "BK"),
  ("SL", "SK"),
  ("DS", "DB"),
  ("FE", "FA"),
  ("PSHI", "UP"),
  ("ABT", "AB"),
];

/// Values accepted by the crime log's `campus` query parameter, paired with
/// the display label used for reverse-mapping.
const PSU_FILTERS: &[(&str, &str)] = &[
  ("Univ Park", "University Park"),
  ("Abington", "Abington"),
  ("Altoona", "Altoona"),
  ("Beaver", "Beaver"),
  ("Behrend", "Erie (Behrend)"),
  ("Berks", "Berks"),
  ("Brandywine", "Brandywine"),
  ("Dickinson Law", "Dickinson Law"),
  ("DuBois", "DuBois"),
  ("Fayette", "Fayette"),
  ("Grtr Algny", "Greater Allegheny"),
  ("Grt Valley", "Great Valley"),
  ("Harrisburg", "Harrisburg"),
  ("Hazleton", "Hazleton"),
  ("Hershey", "Hershey"),
  ("Lehigh Val", "Lehigh Valley"),
  ("Mont Alto", "Mont Alto"),
  ("New Ken", "New Kensington"),
  ("Schuylkill", "Schuylkill"),
  ("Shenango", "Shenango"),
  ("Wlks-Barre", "Wilkes-Barre"),
  ("Wrthn Scrn", "Worthington Scranton"),
  ("York", "York"),
];

// ─── Types ───────────────────────────────────────────────────────────────────

/// One selectable campus on the source site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampusFilter {
  /// Value sent as the `campus` query parameter.
  pub filter: String,
  /// Human-readable campus name.
  pub label:  String,
}

/// A deprecated code and the canonical code that replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampusCorrection {
  pub deprecated: String,
  pub canonical:  String,
}

/// The campus code tables.
#[derive(Debug, Clone)]
pub struct Vocabulary {
  canonical:    BTreeMap<String, String>,
  alternates:   BTreeMap<String, String>,
  corrections:  BTreeMap<String, String>,
  name_to_code: HashMap<String, String>,
  filters:      Vec<CampusFilter>,
}

fn collect_table(rows: &[(&str, &str)]) -> BTreeMap<String, String> {
  rows
    .iter()
    .map(|&(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

impl Vocabulary {
  /// Build and validate a vocabulary.
  ///
  /// `alternates` holds only the non-canonical codes; the extended table is
  /// their union with `canonical`.
  pub fn new(
    canonical:   &[(&str, &str)],
    alternates:  &[(&str, &str)],
    corrections: &[(&str, &str)],
    filters:     &[(&str, &str)],
  ) -> Result<Self> {
    let canonical = collect_table(canonical);
    let alternates = collect_table(alternates);
    let corrections = collect_table(corrections);
    let filters = filters
      .iter()
      .map(|&(filter, label)| CampusFilter {
        filter: filter.to_owned(),
        label:  label.to_owned(),
      })
      .collect();

    let mut name_to_code = HashMap::with_capacity(canonical.len());
    for (code, name) in &canonical {
      if let Some(prev) = name_to_code.insert(name.clone(), code.clone()) {
        return Err(Error::Vocabulary(format!(
          "campus name {name:?} is used by both {prev} and {code}"
        )));
      }
    }

    let vocab = Self {
      canonical,
      alternates,
      corrections,
      name_to_code,
      filters,
    };
    vocab.check_consistency()?;
    Ok(vocab)
  }

  /// The Penn State crime log vocabulary.
  pub fn penn_state() -> Result<Self> {
    Self::new(PSU_CANONICAL, PSU_ALTERNATES, PSU_CORRECTIONS, PSU_FILTERS)
  }

  fn check_consistency(&self) -> Result<()> {
    for code in self.alternates.keys() {
      if self.canonical.contains_key(code) {
        return Err(Error::Vocabulary(format!(
          "alternate code {code} shadows a canonical code"
        )));
      }
      if !self.corrections.contains_key(code) {
        return Err(Error::Vocabulary(format!(
          "alternate code {code} has no correction"
        )));
      }
    }

    for (from, to) in &self.corrections {
      if !self.alternates.contains_key(from) {
        return Err(Error::Vocabulary(format!(
          "correction source {from} is not in the extended vocabulary"
        )));
      }
      if !self.canonical.contains_key(to) {
        return Err(Error::Vocabulary(format!(
          "correction {from} -> {to} targets a non-canonical code"
        )));
      }
    }

    Ok(())
  }

  // ── Tables ──────────────────────────────────────────────────────────────

  /// Canonical `code -> name` pairs, ordered by code.
  pub fn canonical(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
    self
      .canonical
      .iter()
      .map(|(c, n)| (c.as_str(), n.as_str()))
  }

  /// Canonical pairs followed by the alternate codes.
  pub fn extended(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
    self.canonical().chain(
      self
        .alternates
        .iter()
        .map(|(c, n)| (c.as_str(), n.as_str())),
    )
  }

  /// Deprecated → canonical corrections, ordered by deprecated code.
  pub fn corrections(&self) -> Vec<CampusCorrection> {
    self
      .corrections
      .iter()
      .map(|(from, to)| CampusCorrection {
        deprecated: from.clone(),
        canonical:  to.clone(),
      })
      .collect()
  }

  pub fn filters(&self) -> &[CampusFilter] { &self.filters }

  /// Rows to seed the `campuses` table with.
  ///
  /// Alternate codes get their code appended to the display name so that
  /// every seeded name is distinct.
  pub fn seed_rows(&self) -> Vec<(String, String)> {
    self
      .canonical
      .iter()
      .map(|(c, n)| (c.clone(), n.clone()))
      .chain(
        self
          .alternates
          .iter()
          .map(|(c, n)| (c.clone(), format!("{n} ({c})"))),
      )
      .collect()
  }

  // ── Lookups ─────────────────────────────────────────────────────────────

  pub fn is_canonical(&self, code: &str) -> bool {
    self.canonical.contains_key(code)
  }

  pub fn is_known(&self, code: &str) -> bool {
    self.is_canonical(code) || self.alternates.contains_key(code)
  }

  pub fn correction_for(&self, code: &str) -> Option<&str> {
    self.corrections.get(code).map(String::as_str)
  }

  /// Full name for any code in the extended table, or [`UNKNOWN_CAMPUS`].
  pub fn name_for(&self, code: &str) -> &str {
    self
      .canonical
      .get(code)
      .or_else(|| self.alternates.get(code))
      .map(String::as_str)
      .unwrap_or(UNKNOWN_CAMPUS)
  }

  /// Exact reverse lookup of a canonical campus name.
  pub fn code_for_name(&self, name: &str) -> Option<&str> {
    self.name_to_code.get(name).map(String::as_str)
  }

  /// First filter whose label contains `query`, ignoring case.
  pub fn find_filter(&self, query: &str) -> Option<&CampusFilter> {
    let needle = query.to_lowercase();
    self
      .filters
      .iter()
      .find(|f| f.label.to_lowercase().contains(&needle))
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn psu() -> Vocabulary { Vocabulary::penn_state().unwrap() }

  #[test]
  fn extended_is_superset_of_canonical() {
    let v = psu();
    let extended: Vec<_> = v.extended().collect();
    for pair in v.canonical() {
      assert!(extended.contains(&pair), "missing {pair:?}");
    }
    assert_eq!(extended.len(), 23 + 8);
  }

  #[test]
  fn corrections_cover_exactly_the_alternates() {
    let v = psu();
    let mut deprecated: Vec<_> =
      v.corrections().into_iter().map(|c| c.deprecated).collect();
    deprecated.sort();

    let mut alternates: Vec<_> = v
      .extended()
      .filter(|(code, _)| !v.is_canonical(code))
      .map(|(code, _)| code.to_owned())
      .collect();
    alternates.sort();

    assert_eq!(deprecated, alternates);
  }

  #[test]
  fn name_lookup_handles_alternates_and_unknowns() {
    let v = psu();
    assert_eq!(v.name_for("HS"), "Hershey");
    assert_eq!(v.name_for("HN"), "Hershey");
    assert_eq!(v.name_for("ZZ"), UNKNOWN_CAMPUS);
  }

  #[test]
  fn reverse_lookup_is_exact_and_canonical() {
    let v = psu();
    assert_eq!(v.code_for_name("Hershey"), Some("HS"));
    assert_eq!(v.code_for_name("Erie (Behrend)"), Some("BE"));
    assert_eq!(v.code_for_name("hershey"), None);
  }

  #[test]
  fn filter_matches_by_case_insensitive_containment() {
    let v = psu();
    let f = v.find_filter("university").unwrap();
    assert_eq!(f.filter, "Univ Park");
    assert_eq!(v.find_filter("behrend").unwrap().label, "Erie (Behrend)");
    assert!(v.find_filter("Narnia").is_none());
  }

  #[test]
  fn seed_names_are_unique() {
    let rows = psu().seed_rows();
    let mut names: Vec<_> = rows.iter().map(|(_, n)| n.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), rows.len());
    assert!(rows.contains(&("HN".into(), "Hershey (HN)".into())));
  }

  #[test]
  fn correction_without_alternate_is_rejected() {
    let err = Vocabulary::new(
      &[("HS", "Hershey")],
      &[],
      &[("HN", "HS")],
      &[],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Vocabulary(_)));
  }

  #[test]
  fn alternate_without_correction_is_rejected() {
    let err = Vocabulary::new(
      &[("HS", "Hershey")],
      &[("HN", "Hershey")],
      &[],
      &[],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Vocabulary(_)));
  }

  #[test]
  fn correction_to_non_canonical_code_is_rejected() {
    let err = Vocabulary::new(
      &[("HS", "Hershey")],
      &[("HN", "Hershey"), ("HX", "Hershey")],
      &[("HN", "HX"), ("HX", "HS")],
      &[],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Vocabulary(_)));
  }

  #[test]
  fn duplicate_canonical_names_are_rejected() {
    let err = Vocabulary::new(
      &[("HS", "Hershey"), ("HY", "Hershey")],
      &[],
      &[],
      &[],
    )
    .unwrap_err();
    assert!(matches!(err, Error::Vocabulary(_)));
  }
}
