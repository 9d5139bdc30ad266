//! Blocking HTTP access. Every adapter sends exactly one GET per fetch through
//! an [`HttpClient`]; the default implementation wraps `reqwest::blocking`.

use crate::transport::error::ProviderError;
use log::{info, warn};
use reqwest::StatusCode;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Query values never written to logs or error messages.
const MASKED_QUERY_KEYS: [&str; 2] = ["username", "password"];

/// A single GET request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// `url` with the query string appended, for logs and error messages.
    /// Credentials are masked.
    pub fn display_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query: Vec<String> = self
            .query
            .iter()
            .map(|(key, value)| {
                if MASKED_QUERY_KEYS.contains(&key.as_str()) {
                    format!("{}=***", key)
                } else {
                    format!("{}={}", key, value)
                }
            })
            .collect();
        format!("{}?{}", self.url, query.join("&"))
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Sends GET requests. Implement this to route requests elsewhere (a proxy,
/// a recorded fixture, ...).
pub trait HttpClient: Send + Sync {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ProviderError>;
}

/// [`HttpClient`] backed by a `reqwest` blocking client.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("glm_met/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProviderError::ClientBuild)?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestClient").finish_non_exhaustive()
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ProviderError> {
        let display_url = request.display_url();
        info!("Downloading data from {}", display_url);

        let mut builder = self.client.get(&request.url).query(&request.query);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .map_err(|e| ProviderError::NetworkRequest(display_url.clone(), e))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ProviderError::NetworkRequest(display_url.clone(), e))?;
        Ok(HttpResponse { status, body })
    }
}

/// Sends `request` through `client`, or through a fresh [`ReqwestClient`] when the
/// adapter was built without one, and rejects non-success statuses.
pub(crate) fn send(
    client: Option<&Arc<dyn HttpClient>>,
    request: &HttpRequest,
) -> Result<HttpResponse, ProviderError> {
    let response = match client {
        Some(client) => client.get(request)?,
        None => ReqwestClient::new()?.get(request)?,
    };
    ensure_success(request, response)
}

/// Turns a non-success response into [`ProviderError::HttpStatus`], keeping the
/// provider's own explanation when the body carries one.
pub(crate) fn ensure_success(
    request: &HttpRequest,
    response: HttpResponse,
) -> Result<HttpResponse, ProviderError> {
    if response.status.is_success() {
        return Ok(response);
    }
    let url = request.display_url();
    warn!("HTTP error for {}: {}", url, response.status);
    Err(ProviderError::HttpStatus {
        url,
        status: response.status,
        reason: error_reason(&response.body),
    })
}

/// Open-Meteo and NASA POWER answer errors with JSON such as
/// `{"error": true, "reason": "..."}` or `{"messages": [...]}`.
fn error_reason(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(reason) = value.get("reason").and_then(|r| r.as_str()) {
        return Some(reason.to_string());
    }
    let messages = value.get("messages").and_then(|m| m.as_array())?;
    let joined: Vec<&str> = messages.iter().filter_map(|m| m.as_str()).collect();
    if joined.is_empty() {
        None
    } else {
        Some(joined.join("; "))
    }
}
