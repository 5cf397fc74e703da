//! Business logic services

pub mod export_pipeline;
pub mod header_resolver;
pub mod import_pipeline;
pub mod links;
pub mod normalizer;
pub mod partitioner;
pub mod survey;
pub mod workbook;

pub use survey::{SurveyError, SurveyService, SurveySettings};
