//! Import pipeline: file bytes to a normalized, volunteer-assigned record set
//!
//! Steps run in order, each a precondition for the next:
//! decode → first sheet → keyed rows → header resolution → normalization
//! → assignment. Any failure discards all work. The pipeline never touches
//! storage; persisting the result is the caller's job.

use tracing::{debug, info};

use super::header_resolver::{missing_mandatory, resolve};
use super::normalizer::{gender_issue, is_reserved_column, normalize, normalize_dynamic};
use super::partitioner::{assign, AssignmentPolicy};
use super::workbook::{self, DecodeError};
use crate::types::{
    survey_field_keywords, DynamicRecord, HeaderMap, ImportIssue, ImportIssueLevel, ImportOutput, ImportReport,
    LogicalField, RawRow, RecordSet, SchemaMode,
};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to process the file, please ensure it's a valid .xlsx, .xls or .csv file: {0}")]
    Decode(#[from] DecodeError),

    #[error("the file is empty or could not be read")]
    EmptySheet,

    #[error("could not find a '{}' column, please ensure your file has one (e.g. {})", .0, keyword_examples(.0))]
    MissingColumn(LogicalField),
}

fn keyword_examples(field: &LogicalField) -> String {
    field
        .keywords()
        .iter()
        .map(|k| format!("'{}'", k))
        .collect::<Vec<_>>()
        .join(" or ")
}

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    pub schema: SchemaMode,
    pub policy: AssignmentPolicy,
    /// Wall-clock milliseconds, used for dynamic record ids
    pub import_stamp_ms: i64,
}

pub fn import(bytes: &[u8], options: &ImportOptions) -> Result<ImportOutput, ImportError> {
    let workbook = workbook::read(bytes)?;
    let (sheet_name, grid) = workbook.first_sheet().ok_or(ImportError::EmptySheet)?;
    let (columns, rows) = workbook::rows_to_objects(grid);
    if rows.is_empty() {
        return Err(ImportError::EmptySheet);
    }
    debug!(
        "Sheet '{}': {} columns, {} data rows",
        sheet_name,
        columns.len(),
        rows.len()
    );

    let output = match options.schema {
        SchemaMode::Fixed => import_fixed(&columns, &rows, options.policy)?,
        SchemaMode::Dynamic => import_dynamic(&columns, &rows, options),
    };

    info!(
        "Imported {} records into {} volunteer buckets ({} warnings)",
        output.report.total_rows,
        output.report.volunteer_count,
        output.report.warning_count()
    );
    Ok(output)
}

fn import_fixed(
    columns: &[String],
    rows: &[RawRow],
    policy: AssignmentPolicy,
) -> Result<ImportOutput, ImportError> {
    let headers = resolve(columns, &survey_field_keywords());
    if let Some(field) = missing_mandatory(&headers) {
        return Err(ImportError::MissingColumn(field));
    }

    let mut issues = unresolved_field_issues(&headers);
    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        issues.extend(gender_issue(row, &headers, index));
        records.push(normalize(row, &headers, index));
    }
    let users = assign(records, policy);

    let report = ImportReport {
        total_rows: users.len(),
        volunteer_count: policy.bucket_count(users.len()),
        headers: Some(headers.clone()),
        issues,
    };
    Ok(ImportOutput {
        records: RecordSet::Fixed { users, headers },
        report,
    })
}

fn import_dynamic(columns: &[String], rows: &[RawRow], options: &ImportOptions) -> ImportOutput {
    let records: Vec<DynamicRecord> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| normalize_dynamic(row, index, options.import_stamp_ms))
        .collect();
    let users = assign(records, options.policy);

    let columns: Vec<String> = columns
        .iter()
        .filter(|c| !is_reserved_column(c))
        .cloned()
        .collect();

    let report = ImportReport {
        total_rows: users.len(),
        volunteer_count: options.policy.bucket_count(users.len()),
        headers: None,
        issues: Vec::new(),
    };
    ImportOutput {
        records: RecordSet::Dynamic { users, columns },
        report,
    }
}

fn unresolved_field_issues(headers: &HeaderMap) -> Vec<ImportIssue> {
    LogicalField::ALL
        .into_iter()
        .filter(|field| !headers.contains(*field))
        .map(|field| ImportIssue {
            row_number: 0,
            level: ImportIssueLevel::Info,
            field: field.to_string(),
            message: format!("no '{}' column found, values left empty", field),
            original_value: None,
        })
        .collect()
}
