//! Survey record types
//!
//! Two record shapes exist, one per deployment schema mode:
//! - [`SurveyRecord`] for the fixed bilingual survey layout
//! - [`DynamicRecord`] carrying arbitrary spreadsheet columns

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{CellValue, HeaderMap, LogicalField};

/// Closed gender enumeration offered by the edit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
    #[serde(rename = "Prefer not to say")]
    PreferNotToSay,
}

/// Accepted spellings per gender, compared trimmed and case-insensitively.
const GENDER_SYNONYMS: &[(Gender, &[&str])] = &[
    (Gender::Male, &["male", "ஆண்"]),
    (Gender::Female, &["female", "பெண்"]),
    (Gender::Other, &["other", "மற்றவை", "மற்றவர்"]),
    (Gender::PreferNotToSay, &["prefer not to say"]),
];

impl Gender {
    pub const ALL: [Gender; 4] = [
        Gender::Male,
        Gender::Female,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    /// Value used for absent or unrecognized input.
    pub const FALLBACK: Gender = Gender::PreferNotToSay;

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
            Gender::PreferNotToSay => "Prefer not to say",
        }
    }

    /// Strict parse against the enumeration and its synonyms.
    pub fn parse(s: &str) -> Option<Gender> {
        let lower = s.trim().to_lowercase();
        GENDER_SYNONYMS
            .iter()
            .find(|(_, synonyms)| synonyms.iter().any(|syn| *syn == lower))
            .map(|(gender, _)| *gender)
    }

    /// Exact match against one of the four labels, as offered by the edit form.
    pub fn from_label(s: &str) -> Option<Gender> {
        let s = s.trim();
        Self::ALL.into_iter().find(|gender| gender.label() == s)
    }

    /// Lenient parse used at import: anything unknown becomes [`Gender::FALLBACK`].
    pub fn coerce(s: &str) -> Gender {
        Self::parse(s).unwrap_or(Self::FALLBACK)
    }
}

impl Default for Gender {
    fn default() -> Self {
        Gender::FALLBACK
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed-schema lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "Not Updated")]
    NotUpdated,
    Updated,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::NotUpdated => "Not Updated",
            RecordStatus::Updated => "Updated",
        }
    }
}

/// Dynamic-schema lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicStatus {
    Pending,
    Updated,
}

impl DynamicStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DynamicStatus::Pending => "Pending",
            DynamicStatus::Updated => "Updated",
        }
    }
}

/// Fixed-schema survey respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyRecord {
    /// 0-based import order
    pub id: u32,
    /// 1-based volunteer bucket
    pub volunteer_id: u32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: Gender,
    pub city: String,
    pub country: String,
    pub status: RecordStatus,
}

impl SurveyRecord {
    pub fn field(&self, field: LogicalField) -> String {
        match field {
            LogicalField::Name => self.name.clone(),
            LogicalField::Email => self.email.clone(),
            LogicalField::Phone => self.phone.clone(),
            LogicalField::Gender => self.gender.label().to_string(),
            LogicalField::City => self.city.clone(),
            LogicalField::Country => self.country.clone(),
        }
    }

    pub fn is_updated(&self) -> bool {
        self.status == RecordStatus::Updated
    }
}

/// Dynamic-schema record: arbitrary columns in their spreadsheet order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicRecord {
    /// Import timestamp (ms) and row index, e.g. `1718000000000-7`
    pub id: String,
    /// Volunteer label, e.g. `V3`
    pub volunteer_id: String,
    pub status: DynamicStatus,
    pub data: IndexMap<String, CellValue>,
}

impl DynamicRecord {
    pub fn is_updated(&self) -> bool {
        self.status == DynamicStatus::Updated
    }
}

/// Formats a 1-based bucket number as a dynamic-schema volunteer label.
pub fn volunteer_label(bucket: u32) -> String {
    format!("V{}", bucket)
}

/// The full result of the most recent import, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum RecordSet {
    Fixed {
        users: Vec<SurveyRecord>,
        headers: HeaderMap,
    },
    Dynamic {
        users: Vec<DynamicRecord>,
        columns: Vec<String>,
    },
}

impl RecordSet {
    pub fn len(&self) -> usize {
        match self {
            RecordSet::Fixed { users, .. } => users.len(),
            RecordSet::Dynamic { users, .. } => users.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn schema(&self) -> SchemaMode {
        match self {
            RecordSet::Fixed { .. } => SchemaMode::Fixed,
            RecordSet::Dynamic { .. } => SchemaMode::Dynamic,
        }
    }

    pub fn updated_count(&self) -> usize {
        match self {
            RecordSet::Fixed { users, .. } => users.iter().filter(|u| u.is_updated()).count(),
            RecordSet::Dynamic { users, .. } => users.iter().filter(|u| u.is_updated()).count(),
        }
    }
}

/// Record schema chosen per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaMode {
    Fixed,
    Dynamic,
}

impl SchemaMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Some(SchemaMode::Fixed),
            "dynamic" => Some(SchemaMode::Dynamic),
            _ => None,
        }
    }
}

/// Partial edit of a fixed-schema record. `id` and `volunteerId` are not editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<Gender>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl RecordPatch {
    pub fn apply(self, record: &mut SurveyRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(email) = self.email {
            record.email = email;
        }
        if let Some(phone) = self.phone {
            record.phone = phone;
        }
        if let Some(gender) = self.gender {
            record.gender = gender;
        }
        if let Some(city) = self.city {
            record.city = city;
        }
        if let Some(country) = self.country {
            record.country = country;
        }
    }
}

/// One volunteer bucket's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerSummary {
    pub volunteer_id: String,
    pub total: usize,
    pub updated: usize,
}
