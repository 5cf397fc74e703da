//! Logical survey fields and the header map resolved for an import

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Fixed-schema logical field, independent of the spreadsheet's column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalField {
    Name,
    Email,
    Phone,
    Gender,
    City,
    Country,
}

impl LogicalField {
    /// Resolution and export order.
    pub const ALL: [LogicalField; 6] = [
        LogicalField::Name,
        LogicalField::Email,
        LogicalField::Phone,
        LogicalField::Gender,
        LogicalField::City,
        LogicalField::Country,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogicalField::Name => "name",
            LogicalField::Email => "email",
            LogicalField::Phone => "phone",
            LogicalField::Gender => "gender",
            LogicalField::City => "city",
            LogicalField::Country => "country",
        }
    }

    /// English and Tamil header keywords, tried in this order.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            LogicalField::Name => &["name", "பெயர்"],
            LogicalField::Email => &["email", "மின்னஞ்சல்"],
            LogicalField::Phone => &["phone", "தொலைபேசி"],
            LogicalField::Gender => &["gender", "பாலினம்"],
            LogicalField::City => &["city", "நகரம்"],
            LogicalField::Country => &["country", "நாடு"],
        }
    }

    /// A file without a column for this field cannot be imported.
    pub fn is_mandatory(self) -> bool {
        matches!(self, LogicalField::Name)
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table handed to the header resolver.
pub type FieldKeywords = Vec<(LogicalField, &'static [&'static str])>;

/// The bilingual keyword table used for fixed-schema imports.
pub fn survey_field_keywords() -> FieldKeywords {
    LogicalField::ALL
        .into_iter()
        .map(|field| (field, field.keywords()))
        .collect()
}

/// Logical field to the actual column name chosen for it.
///
/// Fields without a detected column are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMap(IndexMap<LogicalField, String>);

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: LogicalField, column: String) {
        self.0.insert(field, column);
    }

    pub fn column(&self, field: LogicalField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: LogicalField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LogicalField, &str)> {
        self.0.iter().map(|(field, column)| (*field, column.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_name_is_mandatory() {
        let mandatory: Vec<_> = LogicalField::ALL
            .into_iter()
            .filter(|f| f.is_mandatory())
            .collect();
        assert_eq!(mandatory, vec![LogicalField::Name]);
    }

    #[test]
    fn test_parse_logical_field() {
        assert_eq!(LogicalField::parse("Email"), Some(LogicalField::Email));
        assert_eq!(LogicalField::parse(" city "), Some(LogicalField::City));
        assert_eq!(LogicalField::parse("id"), None);
    }

    #[test]
    fn test_header_map_serializes_by_field_name() {
        let mut headers = HeaderMap::new();
        headers.insert(LogicalField::Name, "Name / பெயர்".to_string());
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"{"name":"Name / பெயர்"}"#);
    }
}
