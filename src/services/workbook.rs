//! Spreadsheet decode/encode
//!
//! Decoding accepts xlsx, xls and ods (via calamine) and UTF-8 CSV (via the
//! csv crate). Encoding writes xlsx (via rust_xlsxwriter) or CSV.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use indexmap::IndexMap;
use rust_xlsxwriter::XlsxError;
use tracing::debug;

use crate::types::{CellValue, RawRow};

/// Name given to blank header cells
const EMPTY_HEADER: &str = "__EMPTY";

/// Sheet name used for CSV input and for exported workbooks
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unrecognized file format (expected .xlsx, .xls, .ods or .csv)")]
    Unrecognized,

    #[error("unreadable workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Cell grid of one sheet, header row included.
pub type Grid = Vec<Vec<CellValue>>;

/// Input container detected from leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// xlsx/ods (zip) or xls (OLE2)
    Workbook,
    Csv,
}

impl SourceFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            return Some(SourceFormat::Workbook);
        }
        if std::str::from_utf8(bytes).is_ok() {
            return Some(SourceFormat::Csv);
        }
        None
    }
}

/// Decoded workbook: sheet names in file order and their grids.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheet_names: Vec<String>,
    pub sheets: IndexMap<String, Grid>,
}

impl Workbook {
    pub fn first_sheet(&self) -> Option<(&str, &Grid)> {
        let name = self.sheet_names.first()?;
        self.sheets.get(name).map(|grid| (name.as_str(), grid))
    }
}

pub fn read(bytes: &[u8]) -> Result<Workbook, DecodeError> {
    match SourceFormat::sniff(bytes) {
        Some(SourceFormat::Workbook) => read_workbook(bytes),
        Some(SourceFormat::Csv) => read_csv(bytes),
        None => Err(DecodeError::Unrecognized),
    }
}

fn read_workbook(bytes: &[u8]) -> Result<Workbook, DecodeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let sheet_names = workbook.sheet_names();

    let mut sheets = IndexMap::new();
    for name in &sheet_names {
        let range = workbook.worksheet_range(name)?;
        let grid: Grid = range
            .rows()
            .map(|row| row.iter().map(cell_from).collect())
            .collect();
        debug!("Read sheet '{}' with {} rows", name, grid.len());
        sheets.insert(name.clone(), grid);
    }

    Ok(Workbook {
        sheet_names,
        sheets,
    })
}

fn read_csv(bytes: &[u8]) -> Result<Workbook, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::Unrecognized)?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut grid = Grid::new();
    for result in reader.records() {
        let record = result?;
        grid.push(record.iter().map(csv_cell).collect());
    }
    debug!("Read CSV with {} rows", grid.len());

    let mut sheets = IndexMap::new();
    sheets.insert(DEFAULT_SHEET_NAME.to_string(), grid);
    Ok(Workbook {
        sheet_names: vec![DEFAULT_SHEET_NAME.to_string()],
        sheets,
    })
}

/// CSV cells are text unless they read back unchanged as a number or
/// boolean. `"4"` and `"45.5"` become numbers; `"0098"` and `"+91 98"` stay text.
fn csv_cell(text: &str) -> CellValue {
    if text.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }
    if let Ok(n) = text.parse::<f64>() {
        let number = CellValue::Number(n);
        if n.is_finite() && number.to_string() == text {
            return number;
        }
    }
    CellValue::from(text)
}

fn cell_from(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::empty(),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}

/// Unique column names for a header row.
///
/// Blank headers become `__EMPTY`, `__EMPTY_1`, ...; repeated names get
/// `_1`, `_2`, ... suffixes in order of appearance.
pub fn column_names(header: &[CellValue]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for cell in header {
        let text = cell.to_string();
        let base = if text.trim().is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            text
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while names.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        names.push(candidate);
    }
    names
}

/// Header row plus data rows as keyed rows.
///
/// Every row has every column; short rows are padded with empty text.
/// Rows with no non-empty cell are skipped.
pub fn rows_to_objects(grid: &Grid) -> (Vec<String>, Vec<RawRow>) {
    let Some((header, data)) = grid.split_first() else {
        return (Vec::new(), Vec::new());
    };

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let mut header = header.clone();
    header.resize(width, CellValue::empty());
    let columns = column_names(&header);

    let rows: Vec<RawRow> = data
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| {
            columns
                .iter()
                .enumerate()
                .map(|(i, column)| (column.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect::<RawRow>()
        })
        .collect();

    (columns, rows)
}

/// Quote a CSV field if it contains a comma, a double quote or a newline,
/// doubling embedded quotes.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains(|c| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV text with CRLF row separators.
pub fn write_csv(header: &[String], rows: &[Vec<CellValue>]) -> Vec<u8> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(
        header
            .iter()
            .map(|h| escape_csv_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in rows {
        lines.push(
            row.iter()
                .map(|cell| escape_csv_field(&cell.to_string()))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\r\n").into_bytes()
}

/// Single-sheet xlsx workbook.
pub fn write_xlsx(
    header: &[String],
    rows: &[Vec<CellValue>],
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(DEFAULT_SHEET_NAME)?;

    for (col, name) in header.iter().enumerate() {
        worksheet.write_string(0, column_index(col)?, name.as_str())?;
    }

    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, cell) in row.iter().enumerate() {
            let col = column_index(col)?;
            match cell {
                CellValue::Text(s) if s.is_empty() => {}
                CellValue::Text(s) => {
                    worksheet.write_string(r, col, s.as_str())?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(r, col, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, col, *b)?;
                }
            }
        }
    }

    workbook.save_to_buffer()
}

fn column_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}
