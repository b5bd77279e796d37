//! Workbook access backed by calamine
//!
//! The compiler addresses sheets by position and rows by absolute index, so
//! ranges are padded back to the sheet origin when a workbook is loaded.

use crate::diagnostics::RowError;
use crate::{Error, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

pub const DATA_SHEET: usize = 0;
pub const CONTROL_SHEET: usize = 1;

/// File extensions recognized as workbooks.
pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Error(String),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The raw string of a text cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Renders a populated cell as text; empty cells render as "".
    pub fn text(&self) -> std::result::Result<String, RowError> {
        match self {
            Cell::Empty => Ok(String::new()),
            Cell::Text(s) => Ok(s.clone()),
            Cell::Int(i) => Ok(i.to_string()),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Ok(format!("{}", *f as i64)),
            Cell::Float(f) => Ok(f.to_string()),
            Cell::Bool(b) => Ok(b.to_string()),
            Cell::Error(e) => Err(RowError(format!("cell holds an error value: {}", e))),
        }
    }

    /// Integer value of a numeric cell or of integer text. Floats truncate
    /// toward zero.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Int(i) => Some(*i),
            Cell::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Finite numeric value; "NaN" and "inf" text are not numbers here.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        };
        value.filter(|v: &f64| v.is_finite())
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => Cell::Float(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Error(format!("{e:?}")),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Builds a sheet from string cells; "" is an empty cell.
    pub fn from_strings(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|s| Cell::from(*s)).collect())
            .collect();
        Self::from_rows(name, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> &[Cell] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Cell `col` of `row`, or an empty cell past the end of the row.
pub fn cell(row: &[Cell], col: usize) -> &Cell {
    row.get(col).unwrap_or(&EMPTY)
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| Error::Workbook(format!("Failed to open {}: {}", path.display(), e)))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| Error::Workbook(format!("Failed to read sheet '{}': {}", name, e)))?;

            let (row_offset, col_offset) = range
                .start()
                .map(|(r, c)| (r as usize, c as usize))
                .unwrap_or((0, 0));
            let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
            for data_row in range.rows() {
                let mut row = vec![Cell::Empty; col_offset];
                row.extend(data_row.iter().map(Cell::from));
                rows.push(row);
            }
            sheets.push(Sheet::from_rows(name, rows));
        }
        Ok(Self { sheets })
    }

    pub fn sheet(&self, index: usize) -> Result<&Sheet> {
        self.sheets
            .get(index)
            .ok_or(Error::MissingSheet(index))
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Whether `path` names a workbook format this crate can read.
pub fn is_workbook_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| WORKBOOK_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}
