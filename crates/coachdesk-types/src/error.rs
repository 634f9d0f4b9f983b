//! Parse errors for domain values

use thiserror::Error;

/// Error parsing a domain value from its string form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Unknown product type
    #[error("invalid product type: {0}")]
    ProductType(String),

    /// Unknown status string
    #[error("invalid {kind} status: {value}")]
    Status {
        /// Which status enum was being parsed
        kind: &'static str,
        /// The rejected value
        value: String,
    },

    /// Date not in `YYYY-MM-DD` form
    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    Date(String),

    /// Time not in `HH:MM` form
    #[error("invalid time: {0} (expected HH:MM)")]
    Time(String),

    /// Malformed identifier
    #[error("invalid id: {0}")]
    Id(String),
}
