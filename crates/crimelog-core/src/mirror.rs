//! The JSON mirror: a flat array of [`NormalizedRecord`]s written next to the
//! database after ingestion.
//!
//! Nothing propagates between the store and the mirror once both exist; the
//! reconciliation pass edits the mirror's campus fields directly.

use std::{
  collections::BTreeSet,
  fs,
  io::{BufReader, BufWriter, Write as _},
  path::Path,
};

use serde::Serialize;

use crate::{Error, Result, campus::Vocabulary, record::NormalizedRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mirror {
  pub records: Vec<NormalizedRecord>,
}

/// Outcome of [`Mirror::apply_corrections`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MirrorReconciliation {
  pub records:     usize,
  pub fixes:       usize,
  /// Distinct campus codes left in the mirror; records without a code are
  /// not represented.
  pub codes_after: BTreeSet<String>,
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
  move |source| Error::MirrorIo {
    path: path.to_path_buf(),
    source,
  }
}

impl Mirror {
  pub fn new(records: Vec<NormalizedRecord>) -> Self { Self { records } }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(io_err(path))?;
    let records = serde_json::from_reader(BufReader::new(file))?;
    Ok(Self { records })
  }

  /// Replace `path` with the pretty-printed record array.
  ///
  /// The array is written to a temporary file in the same directory and
  /// renamed over `path`, so a failed write leaves the previous mirror intact.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
      Some(parent) => parent,
      None => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err(path))?;

    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err(path))?;
    let mut writer = BufWriter::new(tmp);
    serde_json::to_writer_pretty(&mut writer, &self.records)?;
    writer.write_all(b"\n").map_err(io_err(path))?;
    let tmp = writer.into_inner().map_err(|e| io_err(path)(e.into_error()))?;
    tmp.as_file().sync_all().map_err(io_err(path))?;
    tmp.persist(path).map_err(|e| io_err(path)(e.error))?;
    Ok(())
  }

  /// Rewrite every deprecated campus code to its canonical code and name.
  pub fn apply_corrections(&mut self, vocab: &Vocabulary) -> MirrorReconciliation {
    let mut fixes = 0;
    for record in &mut self.records {
      let Some(canonical) = record
        .campus_code
        .as_deref()
        .and_then(|code| vocab.correction_for(code))
      else {
        continue;
      };
      record.campus_name = Some(vocab.name_for(canonical).to_owned());
      record.campus_code = Some(canonical.to_owned());
      fixes += 1;
    }

    MirrorReconciliation {
      records: self.records.len(),
      fixes,
      codes_after: self.campus_codes(),
    }
  }

  pub fn campus_codes(&self) -> BTreeSet<String> {
    self
      .records
      .iter()
      .filter_map(|r| r.campus_code.clone())
      .collect()
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn record(number: &str, code: &str, name: &str) -> NormalizedRecord {
    NormalizedRecord {
      incident_number: Some(number.into()),
      campus_code: Some(code.into()),
      campus_name: Some(name.into()),
      ..NormalizedRecord::default()
    }
  }

  #[test]
  fn corrections_rewrite_code_and_name() {
    let vocab = Vocabulary::penn_state().unwrap();
    let mut mirror = Mirror::new(vec![
      record("24HN00007", "HN", "Hershey"),
      record("24UP00001", "UP", "University Park"),
      record("24PSHI0003", "PSHI", "University Park"),
    ]);

    let report = mirror.apply_corrections(&vocab);
    assert_eq!(report.records, 3);
    assert_eq!(report.fixes, 2);
    assert_eq!(
      report.codes_after.iter().map(String::as_str).collect::<Vec<_>>(),
      ["HS", "UP"]
    );
    assert_eq!(mirror.records[0].campus_code.as_deref(), Some("HS"));
    assert_eq!(mirror.records[0].campus_name.as_deref(), Some("Hershey"));
  }

  #[test]
  fn second_pass_applies_nothing() {
    let vocab = Vocabulary::penn_state().unwrap();
    let mut mirror = Mirror::new(vec![record("24ER00002", "ER", "Erie (Behrend)")]);

    let first = mirror.apply_corrections(&vocab);
    let second = mirror.apply_corrections(&vocab);
    assert_eq!(first.fixes, 1);
    assert_eq!(second.fixes, 0);
    assert_eq!(first.codes_after, second.codes_after);
  }

  #[test]
  fn save_and_load_preserve_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("records.json");

    let mut rec = record("24UP00001", "UP", "University Park");
    rec.offenses = vec!["THEFT".into(), "DISORDERLY CONDUCT".into()];
    let mirror = Mirror::new(vec![rec, NormalizedRecord::default()]);
    mirror.save(&path).unwrap();

    assert_eq!(Mirror::load(&path).unwrap(), mirror);
  }

  #[test]
  fn save_replaces_existing_mirror_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    fs::write(&path, "stale, not json").unwrap();

    let mirror = Mirror::new(vec![record("24HS00001", "HS", "Hershey")]);
    mirror.save(&path).unwrap();

    assert_eq!(Mirror::load(&path).unwrap(), mirror);
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
  }

  #[test]
  fn failed_save_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    // A non-empty directory at the target makes the final rename fail.
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), "x").unwrap();

    let mirror = Mirror::new(vec![record("24UP00001", "UP", "University Park")]);
    let err = mirror.save(&path).unwrap_err();
    assert!(matches!(err, Error::MirrorIo { .. }));

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
    assert!(path.join("keep").exists());
  }

  #[test]
  fn load_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = Mirror::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::MirrorIo { .. }));
  }
}
