use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("No data to convert, call fetch first")]
    NotFetched,

    #[error("{provider} data is missing fields required by GLM: {}", .fields.join(", "))]
    MissingFields {
        provider: &'static str,
        fields: Vec<String>,
    },

    #[error("Failed to parse timestamp '{value}', expected {expected}")]
    TimestampParse {
        value: String,
        expected: &'static str,
    },

    #[error("Column '{column}' does not hold timestamps as text")]
    TimeColumnType {
        column: String,
        #[source]
        source: PolarsError,
    },

    #[error("Unit '{unit}' of '{field}' cannot be converted for GLM")]
    UnsupportedUnit { field: String, unit: String },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
