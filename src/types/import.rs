//! Import report types

use serde::{Deserialize, Serialize};

use super::{HeaderMap, RecordSet};

/// Maximum number of issues listed in a text report
const REPORT_ISSUE_LIMIT: usize = 20;

/// Import issue level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportIssueLevel {
    Info,
    Warning,
}

/// Single import issue. Issues never abort an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportIssue {
    /// 1-based data row number, 0 for file-level issues
    pub row_number: u32,
    pub level: ImportIssueLevel,
    pub field: String,
    pub message: String,
    pub original_value: Option<String>,
}

/// Summary of one import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_rows: usize,
    pub volunteer_count: usize,
    /// Resolved headers (fixed schema only)
    pub headers: Option<HeaderMap>,
    pub issues: Vec<ImportIssue>,
}

impl ImportReport {
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.level == ImportIssueLevel::Warning)
            .count()
    }

    /// Human-readable summary with at most the first 20 issues.
    pub fn summary_text(&self, filename: &str) -> String {
        let mut report = format!("Import from '{}'\n", filename);
        report.push_str(&format!("Records: {}\n", self.total_rows));
        report.push_str(&format!("Volunteers: {}\n", self.volunteer_count));

        if let Some(headers) = &self.headers {
            for (field, column) in headers.iter() {
                report.push_str(&format!("  {} <- '{}'\n", field, column));
            }
        }

        if !self.issues.is_empty() {
            report.push_str("\nNotes:\n");
            for (i, issue) in self.issues.iter().take(REPORT_ISSUE_LIMIT).enumerate() {
                let location = if issue.row_number == 0 {
                    String::new()
                } else {
                    format!("row {}: ", issue.row_number)
                };
                report.push_str(&format!("{}. {}{}\n", i + 1, location, issue.message));
            }
            if self.issues.len() > REPORT_ISSUE_LIMIT {
                report.push_str(&format!(
                    "... and {} more\n",
                    self.issues.len() - REPORT_ISSUE_LIMIT
                ));
            }
        }

        report
    }
}

/// Result of a successful import, ready for the caller to persist
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutput {
    pub records: RecordSet,
    pub report: ImportReport,
}
