use chrono::NaiveDate;
use thiserror::Error;

/// Raised when query parameters cannot be sent to a provider as given.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Date range start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Failed to parse date '{value}', expected format {expected}")]
    DateParse {
        value: String,
        expected: &'static str,
    },

    #[error("{provider} only serves data between {earliest} and {latest}, requested {date}")]
    DateOutsideProviderRange {
        provider: &'static str,
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("Coordinate (lon {longitude}, lat {latitude}) is not a valid geographic location")]
    InvalidCoordinate { longitude: f64, latitude: f64 },

    #[error("Coordinate (lon {longitude}, lat {latitude}) lies outside {provider} coverage")]
    OutsideCoverage {
        provider: &'static str,
        longitude: f64,
        latitude: f64,
    },

    #[error("Variables not supported by {provider}: {}", .variables.join(", "))]
    UnsupportedVariables {
        provider: &'static str,
        variables: Vec<String>,
    },

    #[error("No variables requested from {provider}")]
    NoVariables { provider: &'static str },

    #[error("Unknown climate model '{0}'")]
    UnknownClimateModel(String),

    #[error("At least one climate model must be selected")]
    NoClimateModels,

    #[error("Unknown SILO variable code '{0}'")]
    UnknownSiloCode(char),

    #[error("SILO requests require a username (email address)")]
    MissingUsername,

    #[error("SILO {api} API requires {expected}")]
    SiteMismatch {
        api: &'static str,
        expected: &'static str,
    },
}
