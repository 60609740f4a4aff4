//! Workbook discovery and loading.
//!
//! Source exports live at `<root>/<YYYY>/<state>.xlsx`. This module finds
//! them, derives the state name from the file name and reads the first
//! worksheet into a [`SheetGrid`] anchored at cell A1.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use regex::Regex;
use tracing::{debug, warn};
use vahan_core::{Result, VahanError};

use crate::normalizer::{SheetCell, SheetGrid};

// ── State files ───────────────────────────────────────────────────────────────

/// One workbook to ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    /// Name of the enclosing year directory.
    pub year: String,
    /// State derived from the file name.
    pub state: String,
    pub path: PathBuf,
}

fn year_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4}$").expect("regex is valid"))
}

fn export_stamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_\d{4}_\d{8}_\d{6}$").expect("regex is valid"))
}

fn year_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_\d{4}$").expect("regex is valid"))
}

/// State name for an export file name.
///
/// `Kerala_2023_20250428_163131.xlsx` and `Kerala_2023.xlsx` both yield
/// `Kerala`.
pub fn derive_state_name(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".xlsx").unwrap_or(file_name);
    let stem = export_stamp_pattern().replace(stem, "");
    year_suffix_pattern().replace(&stem, "").into_owned()
}

/// Find every `.xlsx` file one level below a four-digit year directory of
/// `root`, sorted by path.
pub fn discover_state_files(root: &Path) -> Result<Vec<StateFile>> {
    if !root.is_dir() {
        return Err(VahanError::DataPathNotFound(root.to_path_buf()));
    }

    let mut files: Vec<StateFile> = walkdir::WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "xlsx")
                    .unwrap_or(false)
        })
        .filter_map(|entry| {
            let year = entry
                .path()
                .parent()?
                .file_name()?
                .to_str()
                .filter(|name| year_dir_pattern().is_match(name))?
                .to_string();
            let state = derive_state_name(entry.file_name().to_str()?);
            Some(StateFile {
                year,
                state,
                path: entry.into_path(),
            })
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("Discovered {} workbook(s) under {}", files.len(), root.display());
    Ok(files)
}

// ── Workbook loading ──────────────────────────────────────────────────────────

impl From<&Data> for SheetCell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => SheetCell::Empty,
            Data::String(s) => SheetCell::Text(s.clone()),
            Data::Int(i) => SheetCell::Number(*i as f64),
            Data::Float(f) => SheetCell::Number(*f),
            Data::Bool(b) => SheetCell::Bool(*b),
            Data::DateTime(dt) => SheetCell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => SheetCell::Text(s.clone()),
        }
    }
}

fn workbook_error(path: &Path, err: impl std::fmt::Display) -> VahanError {
    VahanError::Workbook {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Read the first worksheet of `path`.
///
/// The used range of a sheet may start below or right of A1; leading rows
/// and columns are padded with [`SheetCell::Empty`] so indices match the sheet.
pub fn read_first_sheet(path: &Path) -> Result<SheetGrid> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|err: XlsxError| workbook_error(path, err))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(workbook_error(path, "workbook has no worksheets"));
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| workbook_error(path, err))?;

    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut grid: SheetGrid = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![SheetCell::Empty; col_offset];
        cells.extend(row.iter().map(SheetCell::from));
        grid.push(cells);
    }

    if grid.is_empty() {
        warn!("Worksheet '{}' of {} is empty", sheet_name, path.display());
    }
    Ok(grid)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    // ── derive_state_name ─────────────────────────────────────────────────────

    #[test]
    fn test_derive_state_name_strips_export_stamp() {
        assert_eq!(derive_state_name("Kerala_2022_20250428_163131.xlsx"), "Kerala");
    }

    #[test]
    fn test_derive_state_name_strips_year_suffix() {
        assert_eq!(derive_state_name("Tamil Nadu_2023.xlsx"), "Tamil Nadu");
        assert_eq!(derive_state_name("Goa.xlsx"), "Goa");
    }

    #[test]
    fn test_derive_state_name_keeps_inner_digits() {
        assert_eq!(derive_state_name("Zone_12.xlsx"), "Zone_12");
    }

    // ── discover_state_files ──────────────────────────────────────────────────

    #[test]
    fn test_discover_only_year_directories() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("2023/Kerala_2023.xlsx"));
        touch(&dir.path().join("2022/Goa.xlsx"));
        touch(&dir.path().join("2022/notes.txt"));
        touch(&dir.path().join("archive/Delhi.xlsx"));
        touch(&dir.path().join("Punjab.xlsx"));
        touch(&dir.path().join("2022/nested/Bihar.xlsx"));

        let files = discover_state_files(dir.path()).unwrap();
        let found: Vec<(&str, &str)> = files
            .iter()
            .map(|f| (f.year.as_str(), f.state.as_str()))
            .collect();
        assert_eq!(found, vec![("2022", "Goa"), ("2023", "Kerala")]);
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = discover_state_files(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, VahanError::DataPathNotFound(_)));
    }

    // ── read_first_sheet ──────────────────────────────────────────────────────

    #[test]
    fn test_read_first_sheet_anchors_at_a1() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Goa.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(2, 1, "Maker").unwrap();
        sheet.write_string(2, 2, "JAN").unwrap();
        sheet.write_string(3, 1, "OLA").unwrap();
        sheet.write_number(3, 2, 42.0).unwrap();
        workbook.save(&path).unwrap();

        let grid = read_first_sheet(&path).unwrap();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[2][1], SheetCell::from("Maker"));
        assert_eq!(grid[3][1], SheetCell::from("OLA"));
        assert_eq!(grid[3][2], SheetCell::Number(42.0));
        assert!(grid[3][0].is_empty());
    }

    #[test]
    fn test_read_first_sheet_rejects_non_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Broken.xlsx");
        fs::write(&path, b"not a zip archive").unwrap();

        let err = read_first_sheet(&path).unwrap_err();
        assert!(matches!(err, VahanError::Workbook { .. }));
    }
}
