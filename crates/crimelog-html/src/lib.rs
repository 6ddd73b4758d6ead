//! HTML field extraction for the crime log pages.
//!
//! Converts one page of markup into [`RawRecord`]s. Pure synchronous; no HTTP
//! dependencies. Extraction never fails: missing or malformed markup yields
//! fewer records or records with empty fields.
//!
//! # Quick start
//!
//! ```no_run
//! let html = std::fs::read_to_string("page0.html").unwrap();
//! let records = crimelog_html::parse_page(&html, "University Park");
//! println!("{} incidents", records.len());
//! ```

mod page;
mod scan;
mod text;

pub use page::{BLOCK_CLASS, parse_page};
pub use text::text_content;
