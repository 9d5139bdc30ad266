//! Per-call request tuning passed to `fetch`.

use crate::transport::client::HttpRequest;
use std::time::Duration;

/// Extra settings for a single `fetch` call.
///
/// Query parameters given here are merged over the ones an adapter builds itself,
/// so they can both add provider options and override defaults.
///
/// # Examples
///
/// ```
/// use glm_met::RequestSettings;
/// use std::time::Duration;
///
/// let settings = RequestSettings::new()
///     .with_query("temperature_unit", "fahrenheit")
///     .with_timeout(Duration::from_secs(30));
/// assert_eq!(settings.query().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSettings {
    query: Vec<(String, String)>,
    timeout: Option<Duration>,
    base_url: Option<String>,
}

impl RequestSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sends the request to `base_url` instead of the provider's public endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

/// Combines an adapter's own parameters with optional caller settings.
pub(crate) fn build_request(
    default_url: &str,
    mut query: Vec<(String, String)>,
    settings: Option<&RequestSettings>,
) -> HttpRequest {
    let Some(settings) = settings else {
        return HttpRequest {
            url: default_url.to_string(),
            query,
            timeout: None,
        };
    };

    for (key, value) in &settings.query {
        match query.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value.clone(),
            None => query.push((key.clone(), value.clone())),
        }
    }

    HttpRequest {
        url: settings
            .base_url
            .clone()
            .unwrap_or_else(|| default_url.to_string()),
        query,
        timeout: settings.timeout,
    }
}
