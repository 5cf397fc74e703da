//! Export pipeline: record set to a downloadable xlsx or CSV file
//!
//! Export reads the record set and never changes it. Internal record ids
//! are not exported.

use indexmap::IndexSet;
use tracing::info;

use super::workbook::{write_csv, write_xlsx};
use crate::defaults::export_basename;
use crate::types::{
    CellValue, DynamicRecord, ExportFile, ExportFilter, ExportFormat, LogicalField, RecordSet,
    SurveyRecord,
};

const STATUS_COLUMN: &str = "status";
const VOLUNTEER_COLUMN: &str = "volunteerId";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no records to export")]
    NothingToExport,

    #[error("failed to write spreadsheet: {0}")]
    Encode(#[from] rust_xlsxwriter::XlsxError),
}

/// Header row and one flat row per record.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

fn keep(updated: bool, filter: ExportFilter) -> bool {
    match filter {
        ExportFilter::All => true,
        ExportFilter::OnlyUpdated => updated,
    }
}

/// Named fields in declared order, then status.
pub fn flatten_fixed(users: &[&SurveyRecord]) -> FlatTable {
    let mut header: Vec<String> = LogicalField::ALL
        .iter()
        .map(|field| field.to_string())
        .collect();
    header.push(STATUS_COLUMN.to_string());

    let rows = users
        .iter()
        .map(|user| {
            let mut row: Vec<CellValue> = LogicalField::ALL
                .into_iter()
                .map(|field| CellValue::Text(user.field(field)))
                .collect();
            row.push(CellValue::from(user.status.as_str()));
            row
        })
        .collect();

    FlatTable { header, rows }
}

/// `volunteerId`, `status`, then every data column in first-seen order.
/// A record lacking a column exports an empty cell.
pub fn flatten_dynamic(users: &[&DynamicRecord]) -> FlatTable {
    let columns: IndexSet<&str> = users
        .iter()
        .flat_map(|user| user.data.keys().map(String::as_str))
        .collect();

    let mut header = vec![VOLUNTEER_COLUMN.to_string(), STATUS_COLUMN.to_string()];
    header.extend(columns.iter().map(|c| c.to_string()));

    let rows = users
        .iter()
        .map(|user| {
            let mut row = vec![
                CellValue::from(user.volunteer_id.as_str()),
                CellValue::from(user.status.as_str()),
            ];
            row.extend(
                columns
                    .iter()
                    .map(|c| user.data.get(*c).cloned().unwrap_or_default()),
            );
            row
        })
        .collect();

    FlatTable { header, rows }
}

/// Filter, preserving order, and flatten.
pub fn flatten(records: &RecordSet, filter: ExportFilter) -> FlatTable {
    match records {
        RecordSet::Fixed { users, .. } => {
            let kept: Vec<&SurveyRecord> = users
                .iter()
                .filter(|u| keep(u.is_updated(), filter))
                .collect();
            flatten_fixed(&kept)
        }
        RecordSet::Dynamic { users, .. } => {
            let kept: Vec<&DynamicRecord> = users
                .iter()
                .filter(|u| keep(u.is_updated(), filter))
                .collect();
            flatten_dynamic(&kept)
        }
    }
}

pub fn export(
    records: &RecordSet,
    filter: ExportFilter,
    format: ExportFormat,
) -> Result<ExportFile, ExportError> {
    let table = flatten(records, filter);
    if table.rows.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let bytes = match format {
        ExportFormat::Xlsx => write_xlsx(&table.header, &table.rows)?,
        ExportFormat::Csv => write_csv(&table.header, &table.rows),
    };
    let filename = format!(
        "{}.{}",
        export_basename(filter == ExportFilter::OnlyUpdated),
        format.extension()
    );
    info!(
        "Exported {} of {} records to {} ({} bytes)",
        table.rows.len(),
        records.len(),
        filename,
        bytes.len()
    );

    Ok(ExportFile {
        filename,
        content_type: format.content_type(),
        bytes,
        row_count: table.rows.len(),
    })
}
