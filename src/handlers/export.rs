//! Export handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::KeyValueStore;
use crate::services::export_pipeline::ExportError;
use crate::services::{SurveyError, SurveyService};
use crate::types::{ExportFilter, ExportFormat};

pub async fn handle_export<S: KeyValueStore>(
    service: &SurveyService<S>,
    all: bool,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let filter = if all {
        ExportFilter::All
    } else {
        ExportFilter::OnlyUpdated
    };

    let file = match service.export(filter, format) {
        Ok(file) => file,
        Err(SurveyError::Export(ExportError::NothingToExport)) => {
            let hint = match filter {
                ExportFilter::OnlyUpdated => " (no record has been updated yet, use --all to export everything)",
                ExportFilter::All => "",
            };
            anyhow::bail!("No records to export{}", hint);
        }
        Err(e) => return Err(e).context("Export failed"),
    };

    let path = output.unwrap_or_else(|| PathBuf::from(&file.filename));
    tokio::fs::write(&path, &file.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote {} bytes ({})", file.bytes.len(), file.content_type);
    println!("Exported {} records to {}", file.row_count, path.display());
    Ok(())
}
