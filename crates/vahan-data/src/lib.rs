//! Spreadsheet ingestion and aggregation layer for the Vahan dashboard.
//!
//! Responsible for reading per-state workbooks, normalizing their loosely
//! structured sheets into [`SalesRecord`](vahan_core::models::SalesRecord)s
//! and folding record sets into the shapes the HTTP API returns.

pub mod aggregator;
pub mod analysis;
pub mod normalizer;
pub mod reader;

pub use vahan_core as core;
