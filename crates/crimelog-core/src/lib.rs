//! Core types and trait definitions for the crimelog pipeline.
//!
//! This crate has no HTTP or database dependencies. It owns
//! the campus vocabulary, the record normalizer, the JSON mirror and the
//! reconciliation pass; storage backends implement [`store::IncidentStore`].

// Native `async fn` in traits; the trait spells out the `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod campus;
pub mod error;
pub mod mirror;
pub mod normalize;
pub mod reconcile;
pub mod record;
pub mod store;

pub use error::{Error, Result};
