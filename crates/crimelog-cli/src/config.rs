//! Runtime configuration, deserialised from `crimelog.toml` and `CRIMELOG_*`
//! environment variables.

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use serde::Deserialize;

/// Settings for a crawl and for where its outputs land.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
  /// Listing page of the crime log.
  pub base_url:              String,
  pub database_path:         PathBuf,
  /// JSON mirror of the normalized records.
  pub mirror_path:           PathBuf,
  /// Destination of CSV exports and the database copy.
  pub data_dir:              PathBuf,
  /// Reported-date window, counted back from today.
  pub days:                  u32,
  pub max_pages:             u32,
  pub max_consecutive_empty: u32,
  pub page_delay_ms:         u64,
  pub campus_delay_ms:       u64,
  pub request_timeout_secs:  u64,
  /// Responses shorter than this end pagination for the campus.
  pub min_page_bytes:        usize,
  pub user_agent:            String,
  /// Raw pages are saved here when running with `--debug`.
  pub debug_html_dir:        PathBuf,
}

impl Default for CrawlerConfig {
  fn default() -> Self {
    Self {
      base_url:              "https://www.police.psu.edu/daily-crime-log".to_string(),
      database_path:         PathBuf::from("psu_crime_log.db"),
      mirror_path:           PathBuf::from("psu_crime_log_records.json"),
      data_dir:              PathBuf::from("data"),
      days:                  30,
      max_pages:             100,
      max_consecutive_empty: 3,
      page_delay_ms:         1_000,
      campus_delay_ms:       2_000,
      request_timeout_secs:  30,
      min_page_bytes:        500,
      user_agent:            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
        .to_string(),
      debug_html_dir:        PathBuf::from("debug_html"),
    }
  }
}

impl CrawlerConfig {
  /// Layer `path` (optional) under `CRIMELOG_*` environment variables.
  pub fn load(path: PathBuf) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CRIMELOG"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise CrawlerConfig")
  }

  pub fn page_delay(&self) -> Duration { Duration::from_millis(self.page_delay_ms) }

  pub fn campus_delay(&self) -> Duration { Duration::from_millis(self.campus_delay_ms) }

  pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }

  /// File name of the database copy written by exports.
  pub fn database_file_name(&self) -> String {
    self
      .database_path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "psu_crime_log.db".to_string())
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = CrawlerConfig::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.max_pages, 100);
    assert_eq!(cfg.max_consecutive_empty, 3);
    assert_eq!(cfg.min_page_bytes, 500);
    assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crimelog.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "days = 7\ndata_dir = \"out\"\npage_delay_ms = 0").unwrap();

    let cfg = CrawlerConfig::load(path).unwrap();
    assert_eq!(cfg.days, 7);
    assert_eq!(cfg.data_dir, PathBuf::from("out"));
    assert_eq!(cfg.page_delay(), Duration::ZERO);
    assert_eq!(cfg.campus_delay_ms, 2_000);
  }

  #[test]
  fn database_file_name_strips_directories() {
    let cfg = CrawlerConfig {
      database_path: PathBuf::from("/var/lib/crimelog/log.db"),
      ..CrawlerConfig::default()
    };
    assert_eq!(cfg.database_file_name(), "log.db");
  }
}
