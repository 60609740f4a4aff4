//! Spreadsheet ingestion orchestrator.
//!
//! Walks `<root>/<YYYY>/<state>.xlsx` and, per file, replaces the records of
//! that (state, year) in the target collection: delete, parse, insert. Files
//! are independent; a failing file is logged, counted and skipped.
//!
//! Two runs touching the same (state, year) must not overlap; callers are
//! expected to serialize ingestion runs.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use vahan_core::models::{RecordFilter, SalesRecord, VehicleClass};
use vahan_core::{Result, VahanError};
use vahan_data::normalizer::normalize_sheet;
use vahan_data::reader::{discover_state_files, read_first_sheet, StateFile};

use crate::store::RecordStore;

// ── IngestReport ──────────────────────────────────────────────────────────────

/// Counters for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files_seen: usize,
    pub files_ingested: usize,
    pub files_failed: usize,
    pub records_deleted: usize,
    pub records_inserted: usize,
}

// ── IngestionOrchestrator ─────────────────────────────────────────────────────

/// Loads workbooks into one class collection.
pub struct IngestionOrchestrator {
    store: Arc<dyn RecordStore>,
    class: VehicleClass,
}

impl IngestionOrchestrator {
    pub fn new(store: Arc<dyn RecordStore>, class: VehicleClass) -> Self {
        Self { store, class }
    }

    /// Ingest every workbook under `root`.
    ///
    /// Only a missing `root` fails the run; per-file errors are reported in
    /// [`IngestReport::files_failed`].
    pub async fn run(&self, root: &Path) -> Result<IngestReport> {
        let files = discover_state_files(root)?;
        let mut report = IngestReport::default();

        for file in &files {
            report.files_seen += 1;
            info!(
                year = %file.year,
                state = %file.state,
                "Processing {}",
                file.path.display()
            );

            match self.clear_slice(file).await {
                Ok(deleted) => report.records_deleted += deleted,
                Err(err) => {
                    report.files_failed += 1;
                    warn!(error = %err, path = %file.path.display(), "Skipping workbook");
                    continue;
                }
            }

            match self.load_slice(file).await {
                Ok(inserted) => {
                    report.files_ingested += 1;
                    report.records_inserted += inserted;
                }
                Err(err) => {
                    report.files_failed += 1;
                    warn!(error = %err, path = %file.path.display(), "Skipping workbook");
                }
            }
        }

        Ok(report)
    }

    /// Delete the stored records of the (state, year) of `file`.
    ///
    /// Runs before the workbook is parsed, so a file that fails to parse
    /// leaves its slice empty.
    async fn clear_slice(&self, file: &StateFile) -> Result<usize> {
        let filter = RecordFilter::new()
            .with_year(Some(file.year.clone()))
            .with_state(Some(file.state.clone()));
        let deleted = self.store.delete_many(self.class, &filter).await?;
        info!(
            deleted,
            collection = self.class.collection_name(),
            "Deleted existing records for {} {}",
            file.state,
            file.year
        );
        Ok(deleted)
    }

    /// Parse `file` and insert its records; returns how many were inserted.
    async fn load_slice(&self, file: &StateFile) -> Result<usize> {
        let records = Self::parse(file).await?;
        if records.is_empty() {
            info!("No valid data found in {}", file.path.display());
            return Ok(0);
        }

        let inserted = self.store.insert_many(self.class, records).await?;
        info!(inserted, "Inserted records for {} {}", file.state, file.year);
        Ok(inserted)
    }

    /// Read and normalize the workbook on the blocking pool.
    async fn parse(file: &StateFile) -> Result<Vec<SalesRecord>> {
        let (path, year, state) = (file.path.clone(), file.year.clone(), file.state.clone());
        tokio::task::spawn_blocking(move || {
            let grid = read_first_sheet(&path)?;
            normalize_sheet(&grid, &year, &state)
        })
        .await
        .map_err(|err| VahanError::Other(err.into()))?
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
