//! Scalar cell values and raw spreadsheet rows

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single spreadsheet cell value.
///
/// Stored untagged so the persisted JSON reads like the spreadsheet did:
/// text as strings, numbers as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::empty()
    }
}

impl fmt::Display for CellValue {
    /// Numbers with no fractional part print without a decimal point, so a
    /// phone number read as `9876543210.0` becomes `9876543210`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One spreadsheet data row: column name (as authored) to value, in column order.
///
/// Every row of a sheet carries the same key set; empty cells are kept as
/// empty text rather than omitted.
pub type RawRow = IndexMap<String, CellValue>;
