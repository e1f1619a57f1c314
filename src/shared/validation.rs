use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

use crate::shared::constants::MAX_METADATA_BYTES;

lazy_static! {
    /// Regex for table/column names that are safe to interpolate into SQL.
    /// Postgres identifiers are capped at 63 bytes; we only accept the
    /// unquoted-identifier character set.
    /// - Valid: "threads", "conversation_id", "_private", "Col9"
    /// - Invalid: "9col", "my-table", "name; DROP TABLE", ""
    pub static ref SQL_IDENTIFIER_REGEX: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap();
}

/// Validate thread metadata: must be a JSON object (no arrays or scalars)
/// and stay under the serialized size cap.
pub fn validate_thread_metadata(value: &serde_json::Value) -> Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new("metadata_not_object")
            .with_message("metadata must be a JSON object".into()));
    }

    let serialized_len = serde_json::to_string(value)
        .map(|s| s.len())
        .unwrap_or(usize::MAX);
    if serialized_len > MAX_METADATA_BYTES {
        return Err(ValidationError::new("metadata_too_large")
            .with_message(format!("metadata must not exceed {} bytes", MAX_METADATA_BYTES).into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sql_identifier_regex_valid() {
        assert!(SQL_IDENTIFIER_REGEX.is_match("threads"));
        assert!(SQL_IDENTIFIER_REGEX.is_match("conversation_id"));
        assert!(SQL_IDENTIFIER_REGEX.is_match("_private"));
        assert!(SQL_IDENTIFIER_REGEX.is_match("Col9"));
        assert!(SQL_IDENTIFIER_REGEX.is_match(&"a".repeat(63)));
    }

    #[test]
    fn test_sql_identifier_regex_invalid() {
        assert!(!SQL_IDENTIFIER_REGEX.is_match("")); // empty
        assert!(!SQL_IDENTIFIER_REGEX.is_match("9col")); // starts with digit
        assert!(!SQL_IDENTIFIER_REGEX.is_match("my-table")); // hyphen
        assert!(!SQL_IDENTIFIER_REGEX.is_match("name; DROP TABLE threads")); // injection
        assert!(!SQL_IDENTIFIER_REGEX.is_match("col name")); // space
        assert!(!SQL_IDENTIFIER_REGEX.is_match("\"quoted\"")); // quotes
        assert!(!SQL_IDENTIFIER_REGEX.is_match(&"a".repeat(64))); // too long
    }

    #[test]
    fn test_metadata_object_accepted() {
        assert!(validate_thread_metadata(&json!({})).is_ok());
        assert!(validate_thread_metadata(&json!({"topic": "billing", "pinned": true})).is_ok());
    }

    #[test]
    fn test_metadata_non_object_rejected() {
        assert!(validate_thread_metadata(&json!([1, 2, 3])).is_err());
        assert!(validate_thread_metadata(&json!("string")).is_err());
        assert!(validate_thread_metadata(&json!(42)).is_err());
        assert!(validate_thread_metadata(&json!(null)).is_err());
    }

    #[test]
    fn test_metadata_size_cap() {
        let big = json!({"blob": "x".repeat(MAX_METADATA_BYTES)});
        assert!(validate_thread_metadata(&big).is_err());

        let small = json!({"blob": "x".repeat(128)});
        assert!(validate_thread_metadata(&small).is_ok());
    }
}
