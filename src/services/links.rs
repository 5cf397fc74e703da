//! Per-record share links for the survey form and WhatsApp

use serde::Serialize;

use super::header_resolver::find_column;
use crate::types::{DynamicRecord, LogicalField, SurveyRecord};

const WHATSAPP_BASE: &str = "https://wa.me/?text=";
const FALLBACK_GREETING_NAME: &str = "there";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub record_id: String,
    pub name: String,
    pub form_url: String,
    pub whatsapp_url: String,
}

pub fn form_url(base_url: &str, record_id: &str) -> String {
    format!("{}#/form/{}", base_url, record_id)
}

pub fn share_message(name: &str, form_url: &str) -> String {
    format!("Hi {}, please update your info here: {}", name, form_url)
}

fn build(base_url: &str, record_id: String, name: String) -> ShareLink {
    let form_url = form_url(base_url, &record_id);
    let whatsapp_url = format!(
        "{}{}",
        WHATSAPP_BASE,
        urlencoding::encode(&share_message(&name, &form_url))
    );
    ShareLink {
        record_id,
        name,
        form_url,
        whatsapp_url,
    }
}

pub fn fixed_link(base_url: &str, record: &SurveyRecord) -> ShareLink {
    build(base_url, record.id.to_string(), record.name.clone())
}

/// Greeting name for a dynamic record: the first column that looks like a
/// name column, else "there".
pub fn dynamic_name(record: &DynamicRecord) -> String {
    let columns: Vec<&str> = record.data.keys().map(String::as_str).collect();
    find_column(&columns, LogicalField::Name.keywords())
        .and_then(|column| record.data.get(column))
        .map(|value| value.to_string())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_GREETING_NAME.to_string())
}

pub fn dynamic_link(base_url: &str, record: &DynamicRecord) -> ShareLink {
    build(base_url, record.id.clone(), dynamic_name(record))
}
