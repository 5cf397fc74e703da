//! Command handlers
//!
//! One handler per CLI command. Handlers print command output to stdout;
//! logs go to stderr and the log file.

pub mod export;
pub mod import;
pub mod records;

use anyhow::Result;
use tracing::info;

use crate::cli::Command;
use crate::config::Config;
use crate::db::{FileStore, SurveyRepository};
use crate::services::SurveyService;
use crate::types::ExportFormat;

/// Open the stored survey data and run one command against it.
pub async fn dispatch(command: Command, config: &Config) -> Result<()> {
    let store = FileStore::new(&config.data_dir);
    info!("Using data directory {}", store.dir().display());
    let mut service = SurveyService::open(SurveyRepository::new(store), config.survey_settings());

    match command {
        Command::Import { file } => import::handle_import(&mut service, &file).await,
        Command::Volunteers => records::handle_volunteers(&service),
        Command::List { volunteer } => records::handle_list(&service, volunteer.as_deref()),
        Command::Links { volunteer } => records::handle_links(&service, volunteer.as_deref()),
        Command::Update { id, set } => records::handle_update(&mut service, &id, &set),
        Command::Export {
            all,
            format,
            output,
        } => {
            let format = format.map(ExportFormat::from).unwrap_or(config.export_format);
            export::handle_export(&service, all, format, output).await
        }
        Command::Reset { yes } => records::handle_reset(&mut service, yes),
    }
}
