//! Heuristic conversion of a raw sheet grid into sales records.
//!
//! Export sheets carry banner rows, serial-number columns and total rows in
//! no fixed position. The header row is located by an ordered table of named
//! rules ([`HeaderRule`]); the maker and month columns are then read off
//! that row and every following row becomes at most one [`SalesRecord`].
//! Nothing in this module touches the filesystem.

use vahan_core::data_processors::SalesCoercion;
use vahan_core::models::{SalesRecord, SalesValue};
use vahan_core::{Result, VahanError};

// ── Grid model ────────────────────────────────────────────────────────────────

/// One cell of a sheet as delivered by the workbook reader.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl SheetCell {
    /// The cell's text, `None` for non-textual cells.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SheetCell::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Text of a textual, non-empty cell.
    fn label(&self) -> Option<&str> {
        self.as_text().filter(|text| !text.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SheetCell::Empty)
    }
}

impl From<&str> for SheetCell {
    fn from(value: &str) -> Self {
        SheetCell::Text(value.to_string())
    }
}

impl From<f64> for SheetCell {
    fn from(value: f64) -> Self {
        SheetCell::Number(value)
    }
}

/// Rows of cells, row 0 first.
pub type SheetGrid = Vec<Vec<SheetCell>>;

/// Length of `row` once trailing empty cells are dropped.
fn occupied_len(row: &[SheetCell]) -> usize {
    row.iter()
        .rposition(|cell| !cell.is_empty())
        .map_or(0, |last| last + 1)
}

fn is_blank(row: &[SheetCell]) -> bool {
    occupied_len(row) == 0
}

// ── Header rules ──────────────────────────────────────────────────────────────

/// Rows examined when looking for the header.
pub const HEADER_SCAN_ROWS: usize = 10;

/// Month-name fragments; a header row holds at least two cells containing one.
const MONTH_NAME_FRAGMENTS: &[&str] = &[
    "january", "jan", "february", "feb", "march", "mar", "april", "apr",
];

/// Labels marking serial-number columns and rows.
const SERIAL_MARKERS: &[&str] = &["S.No", "S No", "Sl.No"];

/// Header labels that are never month columns.
const NON_MONTH_MARKERS: &[&str] = &["S.No", "S No", "Sl.No", "Total", "Index"];

/// Maker cells that mark a summary or repeated header row.
const SKIPPED_MAKER_MARKERS: &[&str] = &["Total", "S.No", "S No", "Sl.No"];

/// A named test deciding whether a row is the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderRule {
    /// At least two cells mention a month name.
    MonthNames,
    /// A cell contains `Maker` or equals `Brand` / `Company`; fixes the maker column.
    MakerLabel,
    /// A cell carries a serial-number label.
    SerialNumber,
}

/// Rules grouped into passes. Every row of a pass is tried before the next
/// pass starts; within a row the rules are tried in order.
pub const HEADER_PASSES: &[&[HeaderRule]] = &[
    &[HeaderRule::MonthNames, HeaderRule::MakerLabel],
    &[HeaderRule::SerialNumber],
];

/// Outcome of a successful rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleHit {
    /// Maker column fixed by the rule, if any.
    pub maker_column: Option<usize>,
}

impl HeaderRule {
    pub fn name(self) -> &'static str {
        match self {
            HeaderRule::MonthNames => "month_names",
            HeaderRule::MakerLabel => "maker_label",
            HeaderRule::SerialNumber => "serial_number",
        }
    }

    /// Test `row`, returning a hit when it looks like a header.
    pub fn evaluate(self, row: &[SheetCell]) -> Option<RuleHit> {
        match self {
            HeaderRule::MonthNames => {
                let month_cells = row
                    .iter()
                    .filter_map(SheetCell::label)
                    .filter(|text| {
                        let lower = text.to_lowercase();
                        MONTH_NAME_FRAGMENTS.iter().any(|frag| lower.contains(frag))
                    })
                    .count();
                (month_cells >= 2).then_some(RuleHit { maker_column: None })
            }
            HeaderRule::MakerLabel => row
                .iter()
                .position(|cell| {
                    cell.label().is_some_and(|text| {
                        text.contains("Maker") || text == "Brand" || text == "Company"
                    })
                })
                .map(|index| RuleHit {
                    maker_column: Some(index),
                }),
            HeaderRule::SerialNumber => row
                .iter()
                .filter_map(SheetCell::label)
                .any(|text| SERIAL_MARKERS.iter().any(|marker| text.contains(marker)))
                .then_some(RuleHit { maker_column: None }),
        }
    }
}

/// Where the header row is and which rule found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    pub row: usize,
    pub maker_column: Option<usize>,
    /// `None` when no rule matched and row 0 was assumed.
    pub rule: Option<HeaderRule>,
}

/// Run [`HEADER_PASSES`] over the first [`HEADER_SCAN_ROWS`] rows.
pub fn locate_header(grid: &[Vec<SheetCell>]) -> HeaderLocation {
    let scanned = &grid[..grid.len().min(HEADER_SCAN_ROWS)];

    for pass in HEADER_PASSES {
        for (index, row) in scanned.iter().enumerate() {
            if is_blank(row) {
                continue;
            }
            for rule in pass.iter() {
                if let Some(hit) = rule.evaluate(row) {
                    return HeaderLocation {
                        row: index,
                        maker_column: hit.maker_column,
                        rule: Some(*rule),
                    };
                }
            }
        }
    }

    HeaderLocation {
        row: 0,
        maker_column: None,
        rule: None,
    }
}

// ── Column layout ─────────────────────────────────────────────────────────────

/// A header column treated as a month; `key` is the literal header text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthColumn {
    pub index: usize,
    pub key: String,
}

/// Maker column when the header rule did not fix one.
pub fn resolve_maker_column(header: &[SheetCell]) -> usize {
    header
        .iter()
        .position(|cell| {
            cell.label().is_some_and(|text| {
                text.contains("Maker")
                    || text.contains("Brand")
                    || text.contains("Company")
                    || text == "Vehicle"
            })
        })
        .unwrap_or(if header.len() > 1 { 1 } else { 0 })
}

/// Every labelled header column other than the maker column and the
/// serial/total/index columns.
pub fn month_columns(header: &[SheetCell], maker_column: usize) -> Vec<MonthColumn> {
    header
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != maker_column)
        .filter_map(|(index, cell)| cell.label().map(|text| (index, text)))
        .filter(|(_, text)| !NON_MONTH_MARKERS.iter().any(|marker| text.contains(marker)))
        .map(|(index, text)| MonthColumn {
            index,
            key: text.to_string(),
        })
        .collect()
}

// ── Row extraction ────────────────────────────────────────────────────────────

/// Stored value of a month cell, `None` for empty cells.
fn month_value(cell: &SheetCell) -> Option<SalesValue> {
    match cell {
        SheetCell::Empty => None,
        SheetCell::Number(n) => Some(SalesValue::Number(*n)),
        SheetCell::Text(text) => Some(SalesCoercion::from_text(text)),
        SheetCell::Bool(b) => Some(SalesValue::Text(b.to_string())),
    }
}

/// Build the record for one data row, if it carries a maker and month data.
fn extract_row(
    row: &[SheetCell],
    maker_column: usize,
    months: &[MonthColumn],
    year: &str,
    state: &str,
) -> Option<SalesRecord> {
    if occupied_len(row) < maker_column + 1 {
        return None;
    }

    let maker = row[maker_column].as_text()?;
    if maker.trim().is_empty()
        || SKIPPED_MAKER_MARKERS
            .iter()
            .any(|marker| maker.contains(marker))
    {
        return None;
    }

    let mut record = SalesRecord::new(year, state, maker.trim());
    for column in months {
        if let Some(value) = row.get(column.index).and_then(month_value) {
            record.monthly_data.insert(column.key.clone(), value);
        }
    }

    (!record.monthly_data.is_empty()).then_some(record)
}

/// Normalize a sheet grid into records for `(year, state)`.
///
/// Fails with [`VahanError::InsufficientRows`] when the grid cannot hold a
/// header and a data row.
pub fn normalize_sheet(
    grid: &[Vec<SheetCell>],
    year: &str,
    state: &str,
) -> Result<Vec<SalesRecord>> {
    if grid.len() < 2 {
        return Err(VahanError::InsufficientRows { rows: grid.len() });
    }

    let location = locate_header(grid);
    let header = &grid[location.row];
    let maker_column = location
        .maker_column
        .unwrap_or_else(|| resolve_maker_column(header));
    let months = month_columns(header, maker_column);

    tracing::debug!(
        state,
        year,
        header_row = location.row,
        rule = location.rule.map_or("first_row", HeaderRule::name),
        maker_column,
        month_columns = months.len(),
        "Located sheet header"
    );

    let records = grid[location.row + 1..]
        .iter()
        .filter(|row| !is_blank(row))
        .filter_map(|row| extract_row(row, maker_column, &months, year, state))
        .collect();

    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
