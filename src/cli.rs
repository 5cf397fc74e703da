//! CLI argument parsing for the survey-admin binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::ExportFormat;

#[derive(Parser)]
#[command(
    name = "survey-admin",
    about = "Import survey spreadsheets, assign volunteers, track and export updates"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import an .xlsx, .xls or .csv file, replacing all current records
    Import {
        /// Spreadsheet to import
        file: PathBuf,
    },
    /// Show each volunteer's record count and progress
    Volunteers,
    /// List records, optionally for one volunteer
    List {
        /// Volunteer id, e.g. 3 or V3
        #[arg(long)]
        volunteer: Option<String>,
    },
    /// Print form and WhatsApp share links
    Links {
        /// Volunteer id, e.g. 3 or V3
        #[arg(long)]
        volunteer: Option<String>,
    },
    /// Edit one record and mark it updated
    Update {
        /// Record id
        id: String,
        /// Field to change, as field=value (repeatable)
        #[arg(long = "set", value_parser = parse_key_value, required = true)]
        set: Vec<(String, String)>,
    },
    /// Write records to a spreadsheet file
    Export {
        /// Include records that were never updated
        #[arg(long)]
        all: bool,
        /// Output format (defaults to SURVEY_EXPORT_FORMAT)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// Output path (defaults to the standard file name in the current directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete all stored survey data
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
