//! Configuration validation.
//!
//! # Responsibilities
//! - Check the environment tag against the accepted set
//! - Reject missing or empty required values
//! - Validate the database port
//!
//! # Design Decisions
//! - Validation is pure: raw strings in, typed values or `ValidationError` out
//! - Empty strings are treated the same as unset variables

use std::num::ParseIntError;
use std::str::FromStr;

use crate::config::schema::AppEnvironment;

/// A single semantic problem with the configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required setting {0} is not set")]
    Missing(&'static str),

    #[error("invalid environment {0:?}: only development, staging and production are allowed")]
    InvalidEnvironment(String),

    #[error("invalid value {value:?} for {key}: {source}")]
    InvalidPort {
        key: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl FromStr for AppEnvironment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppEnvironment::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidEnvironment(s.to_string()))
    }
}

/// Require a value to be present and non-empty.
pub fn required(key: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    optional(value).ok_or(ValidationError::Missing(key))
}

/// Normalize an optional value: empty means unset.
pub fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse a TCP port.
pub fn port(key: &'static str, value: String) -> Result<u16, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|source| ValidationError::InvalidPort { key, value, source })
}
