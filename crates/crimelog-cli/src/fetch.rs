//! Paginated crawl of the crime log listing pages.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Days, NaiveDate};
use crimelog_core::{campus::CampusFilter, record::RawRecord};
use reqwest::{
  Client,
  header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue},
};

use crate::config::CrawlerConfig;

const DATE_FORMAT: &str = "%m/%d/%Y";

// ─── Query construction ──────────────────────────────────────────────────────

/// Inclusive reported-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
  pub start: NaiveDate,
  pub end:   NaiveDate,
}

impl DateRange {
  /// The `days` days up to and including `today`.
  pub fn ending_on(today: NaiveDate, days: u32) -> Self {
    let start = today
      .checked_sub_days(Days::new(u64::from(days)))
      .unwrap_or(NaiveDate::MIN);
    Self { start, end: today }
  }

  pub fn start_param(&self) -> String { self.start.format(DATE_FORMAT).to_string() }

  pub fn end_param(&self) -> String { self.end.format(DATE_FORMAT).to_string() }
}

/// Query parameters for one listing page.
pub fn page_query(filter: &str, page: u32, range: &DateRange) -> Vec<(&'static str, String)> {
  vec![
    ("campus", filter.to_owned()),
    ("page", page.to_string()),
    ("field_reported_date_value[min]", range.start_param()),
    ("field_reported_date_value[max]", range.end_param()),
  ]
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// Tracks when to stop paging through one campus.
#[derive(Debug)]
pub struct Pager {
  page:              u32,
  consecutive_empty: u32,
  max_pages:         u32,
  max_empty:         u32,
}

impl Pager {
  pub fn new(max_pages: u32, max_empty: u32) -> Self {
    Self { page: 0, consecutive_empty: 0, max_pages, max_empty }
  }

  /// Next page to fetch, or `None` once the page cap is reached.
  pub fn current(&self) -> Option<u32> { (self.page < self.max_pages).then_some(self.page) }

  /// Record how many incidents the current page held and advance. Returns
  /// `false` when the empty-page limit ends the crawl.
  pub fn advance(&mut self, found: usize) -> bool {
    if found == 0 {
      self.consecutive_empty += 1;
    } else {
      self.consecutive_empty = 0;
    }
    self.page += 1;
    self.consecutive_empty < self.max_empty
  }

  pub fn consecutive_empty(&self) -> u32 { self.consecutive_empty }
}

// ─── Fetcher ─────────────────────────────────────────────────────────────────

/// HTTP client for the listing pages.
pub struct Fetcher {
  client:    Client,
  config:    CrawlerConfig,
  save_html: Option<PathBuf>,
}

impl Fetcher {
  /// `save_pages` writes every fetched page under the configured debug directory.
  pub fn new(config: CrawlerConfig, save_pages: bool) -> Result<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(
      ACCEPT,
      HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    let client = Client::builder()
      .timeout(config.request_timeout())
      .user_agent(config.user_agent.clone())
      .default_headers(headers)
      .build()
      .context("failed to build HTTP client")?;

    let save_html = save_pages.then(|| config.debug_html_dir.clone());
    Ok(Self { client, config, save_html })
  }

  async fn fetch_page(&self, filter: &CampusFilter, page: u32, range: &DateRange) -> Result<String> {
    let resp = self
      .client
      .get(&self.config.base_url)
      .query(&page_query(&filter.filter, page, range))
      .send()
      .await
      .with_context(|| format!("GET {} page {page} failed", filter.label))?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET {} page {page} → {}", filter.label, resp.status()));
    }
    resp.text().await.context("reading response body")
  }

  async fn save_page(&self, label: &str, page: u32, html: &str) {
    let Some(dir) = &self.save_html else { return };
    let path = dir.join(format!("{}_page{page}.html", label.replace(' ', "_")));
    let result = async {
      tokio::fs::create_dir_all(dir).await?;
      tokio::fs::write(&path, html).await
    }
    .await;
    match result {
      Ok(()) => tracing::debug!(path = %path.display(), "saved page html"),
      Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not save page html"),
    }
  }

  /// Every raw record for one campus. Transport failures end this campus
  /// and keep what was gathered so far.
  pub async fn scrape_campus(&self, filter: &CampusFilter, range: &DateRange) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut pager = Pager::new(self.config.max_pages, self.config.max_consecutive_empty);

    while let Some(page) = pager.current() {
      tracing::info!(campus = %filter.label, page, "fetching page");
      let html = match self.fetch_page(filter, page, range).await {
        Ok(html) => html,
        Err(e) => {
          tracing::error!(campus = %filter.label, page, error = %format!("{e:#}"), "fetch failed");
          break;
        }
      };
      self.save_page(&filter.label, page, &html).await;

      if html.len() < self.config.min_page_bytes {
        tracing::warn!(campus = %filter.label, page, bytes = html.len(), "suspiciously short response");
        break;
      }

      let found = crimelog_html::parse_page(&html, &filter.label);
      let count = found.len();
      records.extend(found);
      let more = pager.advance(count);
      if count == 0 {
        tracing::info!(
          campus = %filter.label,
          page,
          empty = pager.consecutive_empty(),
          "no incidents on page"
        );
      } else {
        tracing::info!(campus = %filter.label, page, count, total = records.len(), "found incidents");
      }
      if !more {
        tracing::info!(campus = %filter.label, "stopping after consecutive empty pages");
        break;
      }

      tokio::time::sleep(self.config.page_delay()).await;
    }
    records
  }

  /// Crawl each campus in turn.
  pub async fn scrape_all(&self, filters: &[CampusFilter], range: &DateRange) -> Vec<RawRecord> {
    tracing::info!(from = %range.start_param(), to = %range.end_param(), "date range");
    let mut all = Vec::new();
    for (i, filter) in filters.iter().enumerate() {
      if i > 0 {
        tokio::time::sleep(self.config.campus_delay()).await;
      }
      tracing::info!(campus = %filter.label, filter = %filter.filter, "scraping campus");
      let records = self.scrape_campus(filter, range).await;
      tracing::info!(campus = %filter.label, count = records.len(), "campus done");
      all.extend(records);
    }
    all
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  #[test]
  fn range_counts_back_from_today() {
    let range = DateRange::ending_on(date(2024, 3, 1), 30);
    assert_eq!(range.start, date(2024, 1, 31));
    assert_eq!(range.start_param(), "01/31/2024");
    assert_eq!(range.end_param(), "03/01/2024");
  }

  #[test]
  fn query_carries_campus_page_and_window() {
    let range = DateRange::ending_on(date(2024, 1, 15), 0);
    let query = page_query("Univ Park", 2, &range);
    assert_eq!(query, vec![
      ("campus", "Univ Park".to_string()),
      ("page", "2".to_string()),
      ("field_reported_date_value[min]", "01/15/2024".to_string()),
      ("field_reported_date_value[max]", "01/15/2024".to_string()),
    ]);
  }

  #[test]
  fn pager_stops_after_consecutive_empty_pages() {
    let mut pager = Pager::new(100, 3);
    assert!(pager.advance(5));
    assert!(pager.advance(0));
    assert!(pager.advance(0));
    assert!(pager.advance(2));
    assert!(pager.advance(0));
    assert!(pager.advance(0));
    assert!(!pager.advance(0));
    assert_eq!(pager.current(), Some(7));
  }

  #[test]
  fn pager_respects_page_cap() {
    let mut pager = Pager::new(2, 3);
    assert_eq!(pager.current(), Some(0));
    pager.advance(1);
    pager.advance(1);
    assert_eq!(pager.current(), None);
  }
}
