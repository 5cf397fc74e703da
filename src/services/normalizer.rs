//! Record normalization: one raw spreadsheet row to one canonical record
//!
//! Every rule is stated as data:
//! - absent column or cell → empty string
//! - numbers → decimal text
//! - gender → one of [`Gender::ALL`], anything else → [`Gender::FALLBACK`]
//! - status → the "not yet edited" value
//!
//! Volunteer ids are left unset here; the partitioner assigns them.

use indexmap::IndexMap;

use crate::types::{
    DynamicRecord, DynamicStatus, Gender, HeaderMap, ImportIssue, ImportIssueLevel,
    LogicalField, RawRow, RecordStatus, SurveyRecord,
};

/// Columns written by an export that are re-derived, not data, on re-import
pub const RESERVED_DYNAMIC_COLUMNS: [&str; 3] = ["id", "volunteerId", "status"];

pub fn is_reserved_column(column: &str) -> bool {
    RESERVED_DYNAMIC_COLUMNS.contains(&column)
}

/// Text of a logical field's cell, or empty when unresolved or absent.
pub fn field_text(row: &RawRow, headers: &HeaderMap, field: LogicalField) -> String {
    headers
        .column(field)
        .and_then(|column| row.get(column))
        .map(|value| value.to_string())
        .unwrap_or_default()
}

/// Fixed-schema normalization. `index` is the 0-based row position in the file.
pub fn normalize(row: &RawRow, headers: &HeaderMap, index: usize) -> SurveyRecord {
    let text = |field| field_text(row, headers, field);

    SurveyRecord {
        id: index as u32,
        volunteer_id: 0,
        name: text(LogicalField::Name),
        email: text(LogicalField::Email),
        phone: text(LogicalField::Phone),
        gender: Gender::coerce(&text(LogicalField::Gender)),
        city: text(LogicalField::City),
        country: text(LogicalField::Country),
        status: RecordStatus::NotUpdated,
    }
}

/// Warning for a non-empty gender cell that will be coerced.
pub fn gender_issue(row: &RawRow, headers: &HeaderMap, index: usize) -> Option<ImportIssue> {
    let raw = field_text(row, headers, LogicalField::Gender);
    if raw.trim().is_empty() || Gender::parse(&raw).is_some() {
        return None;
    }
    Some(ImportIssue {
        row_number: index as u32 + 1,
        level: ImportIssueLevel::Warning,
        field: LogicalField::Gender.to_string(),
        message: format!(
            "unrecognized gender '{}', stored as '{}'",
            raw,
            Gender::FALLBACK
        ),
        original_value: Some(raw),
    })
}

/// Collision-resistant dynamic id: import timestamp plus row index.
pub fn dynamic_id(import_stamp_ms: i64, index: usize) -> String {
    format!("{}-{}", import_stamp_ms, index)
}

/// Dynamic-schema normalization: every non-reserved column, in sheet order.
pub fn normalize_dynamic(row: &RawRow, index: usize, import_stamp_ms: i64) -> DynamicRecord {
    let data: IndexMap<_, _> = row
        .iter()
        .filter(|(column, _)| !is_reserved_column(column))
        .map(|(column, value)| (column.clone(), value.clone()))
        .collect();

    DynamicRecord {
        id: dynamic_id(import_stamp_ms, index),
        volunteer_id: String::new(),
        status: DynamicStatus::Pending,
        data,
    }
}
