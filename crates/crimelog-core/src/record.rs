//! Record shapes at the two ends of the normalizer.

use serde::{Deserialize, Serialize};

/// One incident as extracted from a crime log page. Every field is optional
/// and may be empty; extraction failures degrade to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
  pub incident_number:    Option<String>,
  /// Set when the extractor already knows the campus code.
  pub campus_code:        Option<String>,
  /// The campus display name the page was requested for.
  pub campus_label:       Option<String>,
  pub reported_datetime:  Option<String>,
  /// Either a single timestamp or a `"<start> to <end>"` range.
  pub occurred_datetime:  Option<String>,
  pub nature_of_incident: Option<String>,
  /// Newline-separated offense codes.
  pub offenses:           Option<String>,
  pub location:           Option<String>,
}

/// An incident ready for ingestion. This is also the element type of the JSON
/// mirror.
///
/// Date/time fields are opaque strings copied verbatim from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
  pub incident_number:    Option<String>,
  pub campus_code:        Option<String>,
  pub campus_name:        Option<String>,
  pub reported_datetime:  String,
  pub occurred_start:     String,
  pub occurred_end:       String,
  pub nature_of_incident: String,
  pub location:           String,
  #[serde(default)]
  pub offenses:           Vec<String>,
}
