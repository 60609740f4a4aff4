//! Shared domain layer for the Vahan sales dashboard.
//!
//! Holds the sales-record data model, canonical month codes, numeric
//! coercion of loosely typed sales cells, the EV classification rule, the
//! growth and share arithmetic used by the analytics views, the error type
//! and the command-line settings.

pub mod calculations;
pub mod data_processors;
pub mod error;
pub mod models;
pub mod settings;

pub use error::{Result, VahanError};
