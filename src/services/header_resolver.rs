//! Header resolution: map logical survey fields to the columns of an uploaded sheet
//!
//! Matching is first-match substring search, case-insensitive. For each
//! field, columns are scanned in sheet order and the first column whose
//! lowercase name contains any of the field's keywords wins. There is no
//! scoring; a field with no match is simply absent from the map.

use tracing::debug;

use crate::types::{FieldKeywords, HeaderMap, LogicalField};

/// First column (in sheet order) containing any keyword.
pub fn find_column<'a, S: AsRef<str>>(columns: &'a [S], keywords: &[&str]) -> Option<&'a str> {
    let lowered: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    columns
        .iter()
        .map(|column| column.as_ref())
        .find(|column| {
            let column = column.to_lowercase();
            lowered.iter().any(|keyword| column.contains(keyword.as_str()))
        })
}

pub fn resolve<S: AsRef<str>>(columns: &[S], keywords: &FieldKeywords) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (field, field_keywords) in keywords {
        match find_column(columns, field_keywords) {
            Some(column) => {
                debug!("Resolved field '{}' to column '{}'", field, column);
                headers.insert(*field, column.to_string());
            }
            None => debug!("No column found for field '{}'", field),
        }
    }
    headers
}

/// First mandatory field the map lacks, if any.
pub fn missing_mandatory(headers: &HeaderMap) -> Option<LogicalField> {
    LogicalField::ALL
        .into_iter()
        .find(|field| field.is_mandatory() && !headers.contains(*field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::survey_field_keywords;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bilingual_name_column() {
        let cols = columns(&["Name / பெயர்", "Email"]);
        let headers = resolve(&cols, &survey_field_keywords());
        assert_eq!(headers.column(LogicalField::Name), Some("Name / பெயர்"));
        assert_eq!(headers.column(LogicalField::Email), Some("Email"));
    }

    #[test]
    fn test_tamil_only_headers() {
        let cols = columns(&["பெயர்", "தொலைபேசி எண்", "நகரம்", "நாடு", "பாலினம்"]);
        let headers = resolve(&cols, &survey_field_keywords());
        assert_eq!(headers.column(LogicalField::Name), Some("பெயர்"));
        assert_eq!(headers.column(LogicalField::Phone), Some("தொலைபேசி எண்"));
        assert_eq!(headers.column(LogicalField::City), Some("நகரம்"));
        assert_eq!(headers.column(LogicalField::Country), Some("நாடு"));
        assert_eq!(headers.column(LogicalField::Gender), Some("பாலினம்"));
        assert!(!headers.contains(LogicalField::Email));
    }

    #[test]
    fn test_case_insensitive_substring() {
        let cols = columns(&["FULL NAME", "E-mail", "Mobile Phone No", "Home City"]);
        let headers = resolve(&cols, &survey_field_keywords());
        assert_eq!(headers.column(LogicalField::Name), Some("FULL NAME"));
        assert_eq!(headers.column(LogicalField::Phone), Some("Mobile Phone No"));
        assert_eq!(headers.column(LogicalField::City), Some("Home City"));
        // "E-mail" does not contain "email"
        assert!(!headers.contains(LogicalField::Email));
    }

    #[test]
    fn test_first_matching_column_wins() {
        let cols = columns(&["Father Name", "Name"]);
        let headers = resolve(&cols, &survey_field_keywords());
        assert_eq!(headers.column(LogicalField::Name), Some("Father Name"));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let cols = columns(&["Name"]);
        let headers = resolve(&cols, &survey_field_keywords());
        assert_eq!(headers.len(), 1);
        assert_eq!(missing_mandatory(&headers), None);
    }

    #[test]
    fn test_missing_name_is_reported() {
        let cols = columns(&["Email", "City"]);
        let headers = resolve(&cols, &survey_field_keywords());
        assert_eq!(missing_mandatory(&headers), Some(LogicalField::Name));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let cols = columns(&["Name / பெயர்", "Email / மின்னஞ்சல்", "Gender", "City", "Country"]);
        let keywords = survey_field_keywords();
        assert_eq!(resolve(&cols, &keywords), resolve(&cols, &keywords));
    }

    #[test]
    fn test_find_column_returns_first_in_sheet_order() {
        let cols = columns(&["ID", "Respondent name", "Name"]);
        assert_eq!(find_column(&cols, &["name"]), Some("Respondent name"));
        assert_eq!(find_column(&cols, &["zzz"]), None);
    }
}
