//! Canned HTTP responses for unit tests.

use crate::transport::client::{HttpClient, HttpRequest, HttpResponse};
use crate::transport::error::ProviderError;
use crate::types::date_range::DateRange;
use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::sync::Mutex;

/// Answers every request with the same status and body, remembering the requests.
pub(crate) struct FixtureClient {
    status: StatusCode,
    body: String,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FixtureClient {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    pub(crate) fn with_status(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Value of `key` in the most recent request's query.
    pub(crate) fn last_query(&self, key: &str) -> Option<String> {
        self.requests().last().and_then(|request| {
            request
                .query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }
}

impl HttpClient for FixtureClient {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Deterministic value for `variable` at row `i`.
pub(crate) fn fixture_value(variable: &str, i: usize) -> f64 {
    let phase = (i % 24) as f64;
    let name = variable.to_ascii_lowercase();
    if name.contains("cloud") {
        ((i * 7) % 101) as f64
    } else if name.contains("humidity") {
        40.0 + (i % 50) as f64
    } else if name.contains("temperature") {
        15.0 + phase * 0.5
    } else if name.contains("radiation") {
        if name.ends_with("_sum") {
            20.0 + (i % 10) as f64
        } else {
            (phase - 6.0).max(0.0) * 50.0
        }
    } else if name.contains("wind") {
        2.0 + (i % 5) as f64 * 0.5
    } else if name.contains("precipitation") {
        (i % 3) as f64 * 0.2
    } else {
        i as f64
    }
}

/// Open-Meteo archive style body covering `range`, one array per variable.
pub(crate) fn open_meteo_body(range: &DateRange, hourly: bool, variables: &[&str]) -> String {
    let (block, units_key) = if hourly {
        ("hourly", "hourly_units")
    } else {
        ("daily", "daily_units")
    };
    let times: Vec<String> = (0..range.days())
        .flat_map(|day| {
            let date = range.start() + Duration::days(day as i64);
            let hours: Vec<String> = if hourly {
                (0..24)
                    .map(|h| format!("{}T{:02}:00", date.format("%Y-%m-%d"), h))
                    .collect()
            } else {
                vec![date.format("%Y-%m-%d").to_string()]
            };
            hours
        })
        .collect();

    let mut data = Map::new();
    let mut units = Map::new();
    units.insert("time".to_string(), json!("iso8601"));
    for variable in variables {
        let values: Vec<f64> = (0..times.len()).map(|i| fixture_value(variable, i)).collect();
        data.insert(variable.to_string(), json!(values));
        units.insert(variable.to_string(), json!(open_meteo_unit(variable)));
    }
    data.insert("time".to_string(), json!(times));

    let mut root = Map::new();
    root.insert("latitude".to_string(), json!(-34.25));
    root.insert("longitude".to_string(), json!(116.75));
    root.insert("generationtime_ms".to_string(), json!(1.2));
    root.insert("utc_offset_seconds".to_string(), json!(28800));
    root.insert("timezone".to_string(), json!("Australia/Perth"));
    root.insert("timezone_abbreviation".to_string(), json!("AWST"));
    root.insert("elevation".to_string(), json!(212.0));
    root.insert(units_key.to_string(), Value::Object(units));
    root.insert(block.to_string(), Value::Object(data));
    Value::Object(root).to_string()
}

fn open_meteo_unit(variable: &str) -> &'static str {
    let name = variable.to_ascii_lowercase();
    if name.contains("cloud") || name.contains("humidity") {
        "%"
    } else if name.contains("temperature") {
        "°C"
    } else if name.contains("radiation_sum") {
        "MJ/m²"
    } else if name.contains("radiation") {
        "W/m²"
    } else if name.contains("wind_speed") || name.contains("windspeed") {
        "m/s"
    } else if name.contains("direction") {
        "°"
    } else {
        "mm"
    }
}
