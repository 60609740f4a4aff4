//! Async runtime layer for the Vahan dashboard.
//!
//! Provides the record store behind every query, the aggregation engine the
//! HTTP handlers call into and the orchestrator that loads workbooks into
//! the store.

pub mod engine;
pub mod orchestrator;
pub mod store;

pub use engine::AggregationEngine;
pub use store::{LocalStore, RecordStore};
