//! Configuration management

use std::num::NonZeroU32;
use std::path::PathBuf;

use anyhow::{self, Context, Result};

use crate::defaults::{DEFAULT_BATCH_SIZE, DEFAULT_FORM_BASE_URL, DEFAULT_VOLUNTEER_COUNT};
use crate::services::partitioner::AssignmentPolicy;
use crate::services::SurveySettings;
use crate::types::{ExportFormat, SchemaMode};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of the file key-value store
    pub data_dir: PathBuf,

    pub schema: SchemaMode,

    /// How imported records are spread over volunteers
    pub policy: AssignmentPolicy,

    /// Format used by `export` when none is given
    pub export_format: ExportFormat,

    /// Base URL the share links point at
    pub form_base_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from any variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = var("SURVEY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let schema = match var("SURVEY_SCHEMA") {
            Some(value) => SchemaMode::parse(&value).with_context(|| {
                format!("SURVEY_SCHEMA must be 'fixed' or 'dynamic', got '{}'", value)
            })?,
            None => SchemaMode::Fixed,
        };

        let batch_size = positive(&var, "SURVEY_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        let volunteer_count = positive(&var, "SURVEY_VOLUNTEER_COUNT", DEFAULT_VOLUNTEER_COUNT)?;

        let assignment = var("SURVEY_ASSIGNMENT").unwrap_or_else(|| "chunked".to_string());
        let policy = match assignment.trim().to_lowercase().as_str() {
            "chunked" => AssignmentPolicy::Chunked { batch_size },
            "round-robin" | "round_robin" | "roundrobin" => {
                AssignmentPolicy::RoundRobin { volunteer_count }
            }
            other => anyhow::bail!(
                "SURVEY_ASSIGNMENT must be 'chunked' or 'round-robin', got '{}'",
                other
            ),
        };

        let export_format = match var("SURVEY_EXPORT_FORMAT") {
            Some(value) => ExportFormat::parse(&value).with_context(|| {
                format!("SURVEY_EXPORT_FORMAT must be 'xlsx' or 'csv', got '{}'", value)
            })?,
            None => ExportFormat::Xlsx,
        };

        let form_base_url =
            var("SURVEY_FORM_BASE_URL").unwrap_or_else(|| DEFAULT_FORM_BASE_URL.to_string());

        Ok(Self {
            data_dir,
            schema,
            policy,
            export_format,
            form_base_url,
        })
    }

    pub fn survey_settings(&self) -> SurveySettings {
        SurveySettings {
            schema: self.schema,
            policy: self.policy,
            form_base_url: self.form_base_url.clone(),
        }
    }
}

fn positive<F>(var: &F, key: &str, default: u32) -> Result<NonZeroU32>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("{} must be a whole number, got '{}'", key, raw))?,
        None => default,
    };
    NonZeroU32::new(value).with_context(|| format!("{} must be greater than zero", key))
}
