//! One crime log page → [`RawRecord`]s.

use crimelog_core::record::RawRecord;

use crate::{
  scan::{find_all_by_class, find_first_by_class},
  text::text_content,
};

/// Class carried by each incident block on a listing page.
pub const BLOCK_CLASS: &str = "views-row";

const ITEM_CLASS: &str = "field__item";

const TITLE_FIELD: &str = "field--name-title";
const REPORTED_FIELD: &str = "field--name-field-reported";
const OCCURRED_FIELD: &str = "field--name-field-occurred";
const NATURE_FIELD: &str = "field--name-field-nature-of-incident1";
const OFFENSES_FIELD: &str = "field--name-field-offenses1";
const LOCATION_FIELD: &str = "field--name-field-location";

fn non_empty(s: String) -> Option<String> { (!s.is_empty()).then_some(s) }

/// Text of the field's `field__item` children, one line per item.
fn field_items(block: &str, field_class: &str) -> Option<String> {
  let field = find_first_by_class(block, field_class)?;
  let items: Vec<String> = find_all_by_class(field, ITEM_CLASS)
    .into_iter()
    .map(text_content)
    .filter(|t| !t.is_empty())
    .collect();
  non_empty(items.join("\n"))
}

fn parse_block(block: &str, campus_label: &str) -> RawRecord {
  RawRecord {
    incident_number:    find_first_by_class(block, TITLE_FIELD)
      .map(text_content)
      .and_then(non_empty),
    campus_code:        None,
    campus_label:       non_empty(campus_label.to_owned()),
    reported_datetime:  field_items(block, REPORTED_FIELD),
    occurred_datetime:  field_items(block, OCCURRED_FIELD),
    nature_of_incident: field_items(block, NATURE_FIELD),
    offenses:           field_items(block, OFFENSES_FIELD),
    location:           field_items(block, LOCATION_FIELD),
  }
}

/// Extract every incident block on a listing page fetched for
/// `campus_label`.
///
/// Blocks carrying none of incident number, reported time or nature are
/// skipped. A page without blocks yields an empty vec.
pub fn parse_page(html: &str, campus_label: &str) -> Vec<RawRecord> {
  let blocks = find_all_by_class(html, BLOCK_CLASS);
  if blocks.is_empty() {
    tracing::warn!(campus = campus_label, "no incident blocks on page");
    return Vec::new();
  }

  let mut records = Vec::with_capacity(blocks.len());
  for (idx, block) in blocks.into_iter().enumerate() {
    let record = parse_block(block, campus_label);
    let has_content = record.incident_number.is_some()
      || record.reported_datetime.is_some()
      || record.nature_of_incident.is_some();
    if has_content {
      records.push(record);
    } else {
      tracing::debug!(campus = campus_label, block = idx, "skipping empty incident block");
    }
  }
  records
}
