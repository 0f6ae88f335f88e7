//! Error types for SensorGate
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for SensorGate operations
pub type Result<T> = std::result::Result<T, SensorGateError>;

/// Main error type for SensorGate operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorGateError {
    /// Caller supplied something the core refuses to work with
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serializing an export failed
    #[error("Export error: {0}")]
    Export(String),
}

impl SensorGateError {
    /// Whether the caller can fix the request and try again.
    pub fn is_validation(&self) -> bool {
        matches!(self, SensorGateError::Validation(_))
    }
}

/// Errors caused by a bad request: unknown sensors, missing or malformed fields
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Sensor id is not in the catalog for the domain
    #[error("Invalid sensor type: {sensor} (not a supported {domain} sensor)")]
    UnsupportedSensor { sensor: String, domain: String },

    /// Monitoring domain is neither air nor water
    #[error("Unknown monitoring type: {0}")]
    UnknownDomain(String),

    /// Required field absent or empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// Named region is not in the region table
    #[error("Unknown location: {0}")]
    UnknownRegion(String),
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidField`].
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for SensorGateError {
    fn from(err: csv::Error) -> Self {
        SensorGateError::Export(err.to_string())
    }
}
