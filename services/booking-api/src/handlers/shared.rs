//! Shared handler utilities
//!
//! Request parsing and metrics helpers used across handlers.

use std::time::Instant;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use coachdesk_types::{parse_date, parse_time};

use crate::error::ApiError;

// ============================================================================
// Input Validation
// ============================================================================

/// Maximum length for free-form strings such as timezones and tokens
const MAX_STRING_LEN: usize = 256;

/// Parse a UUID field, naming the field in the error
pub fn parse_uuid(value: &str, field_name: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field_name}")))
}

/// Parse an optional UUID field; blank counts as absent
pub fn parse_optional_uuid(
    value: Option<&str>,
    field_name: &str,
) -> Result<Option<Uuid>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_uuid(v, field_name).map(Some),
        None => Ok(None),
    }
}

/// Parse a `YYYY-MM-DD` field
pub fn parse_date_field(value: &str, field_name: &str) -> Result<NaiveDate, ApiError> {
    parse_date(value)
        .map_err(|_| ApiError::BadRequest(format!("{field_name} must be YYYY-MM-DD")))
}

/// Parse an `HH:MM` field
pub fn parse_time_field(value: &str, field_name: &str) -> Result<NaiveTime, ApiError> {
    parse_time(value).map_err(|_| ApiError::BadRequest(format!("{field_name} must be HH:MM")))
}

/// Validate a user-provided string is within safe bounds.
pub fn validate_string_length(value: &str, field_name: &str) -> Result<(), ApiError> {
    if value.len() > MAX_STRING_LEN {
        return Err(ApiError::BadRequest(format!(
            "{field_name} too long (max {MAX_STRING_LEN} chars)"
        )));
    }
    Ok(())
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "booking_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&format!(" {id} "), "product_id").unwrap(), id);
        assert!(parse_uuid("not-a-uuid", "product_id").is_err());
        assert!(parse_optional_uuid(Some("  "), "user_id").unwrap().is_none());
        assert!(parse_optional_uuid(None, "user_id").unwrap().is_none());
        assert!(parse_optional_uuid(Some("x"), "user_id").is_err());
    }

    #[test]
    fn test_parse_date_and_time() {
        assert!(parse_date_field("2025-09-10", "date").is_ok());
        assert!(parse_date_field("10.09.2025", "date").is_err());
        assert!(parse_date_field("2025-02-30", "date").is_err());
        assert_eq!(
            parse_time_field("14:00", "booking_time").unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap()
        );
        assert!(parse_time_field("25:00", "booking_time").is_err());
        assert!(parse_time_field("2pm", "booking_time").is_err());
    }

    #[test]
    fn test_validate_string_length() {
        assert!(validate_string_length("Europe/Berlin", "timezone").is_ok());

        let long_string = "a".repeat(MAX_STRING_LEN + 1);
        assert!(validate_string_length(&long_string, "timezone").is_err());
    }
}
