use polars::error::PolarsError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}{}", reason_suffix(.reason))]
    HttpStatus {
        url: String,
        status: StatusCode,
        reason: Option<String>,
    },

    #[error("Failed to parse JSON response from {url}")]
    JsonParse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse CSV response from {url}")]
    CsvParse {
        url: String,
        #[source]
        source: PolarsError,
    },

    #[error("Unexpected response from {url}: {message}")]
    MalformedBody { url: String, message: String },

    #[error("Failed building table from response of {url}")]
    TableBuild {
        url: String,
        #[source]
        source: PolarsError,
    },
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}
