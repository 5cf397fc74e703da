//! Import handler

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::db::KeyValueStore;
use crate::services::SurveyService;

pub async fn handle_import<S: KeyValueStore>(
    service: &mut SurveyService<S>,
    file: &Path,
) -> Result<()> {
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    info!("Importing {}", file.display());
    let report = service
        .import_file(file)
        .await
        .with_context(|| format!("Import of '{}' failed", filename))?;

    print!("{}", report.summary_text(&filename));
    Ok(())
}
