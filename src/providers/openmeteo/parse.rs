//! Turns an Open-Meteo JSON body into [`MetData`].
//!
//! The body carries request metadata at the top level and one array per variable
//! under `hourly` or `daily`, all parallel to a `time` array.

use crate::transport::client::HttpRequest;
use crate::transport::error::ProviderError;
use crate::types::glm_table::COL_TIME;
use crate::types::location::LonLat;
use crate::types::met_data::MetData;
use crate::types::resolution::Resolution;
use log::debug;
use polars::prelude::*;
use serde_json::{json, Map, Value};

pub(crate) fn parse_response(
    request: &HttpRequest,
    body: &str,
    resolution: Resolution,
    requested: LonLat,
) -> Result<MetData, ProviderError> {
    let url = request.display_url();
    let mut root: Map<String, Value> =
        serde_json::from_str(body).map_err(|e| ProviderError::JsonParse {
            url: url.clone(),
            source: e,
        })?;

    let block_key = resolution.block_key();
    let block = match root.remove(block_key) {
        Some(Value::Object(block)) => block,
        _ => {
            return Err(ProviderError::MalformedBody {
                url,
                message: format!("no '{}' object in response", block_key),
            })
        }
    };

    let data = block_to_frame(&url, block)?;
    debug!(
        "Parsed {} rows x {} columns from {}",
        data.height(),
        data.width(),
        url
    );

    let resolved = root
        .get("longitude")
        .and_then(Value::as_f64)
        .zip(root.get("latitude").and_then(Value::as_f64));
    if let Some((longitude, latitude)) = resolved {
        let distance = requested.distance_km(&LonLat(longitude, latitude));
        root.insert("resolved_distance_km".to_string(), json!(distance));
    }

    Ok(MetData::new(root, data))
}

fn block_to_frame(url: &str, block: Map<String, Value>) -> Result<DataFrame, ProviderError> {
    let malformed = |message: String| ProviderError::MalformedBody {
        url: url.to_string(),
        message,
    };

    let rows = match block.get(COL_TIME) {
        Some(Value::Array(times)) => times.len(),
        _ => return Err(malformed("no 'time' array in data block".to_string())),
    };

    let mut columns = Vec::with_capacity(block.len());
    for (name, value) in block {
        let Value::Array(values) = value else {
            return Err(malformed(format!("'{}' is not an array", name)));
        };
        if values.len() != rows {
            return Err(malformed(format!(
                "'{}' has {} values but 'time' has {}",
                name,
                values.len(),
                rows
            )));
        }
        let column = array_to_column(&name, &values).ok_or_else(|| {
            malformed(format!("'{}' mixes numbers and text or holds nested values", name))
        })?;
        columns.push(column);
    }

    if let Some(position) = columns.iter().position(|c| c.name().as_str() == COL_TIME) {
        let time = columns.remove(position);
        if time.dtype() != &DataType::String && rows > 0 {
            return Err(malformed("'time' values are not strings".to_string()));
        }
        columns.insert(0, time);
    }

    DataFrame::new(columns).map_err(|e| ProviderError::TableBuild {
        url: url.to_string(),
        source: e,
    })
}

/// Numbers (and nulls) become a float column, strings (and nulls) a text column.
fn array_to_column(name: &str, values: &[Value]) -> Option<Column> {
    let numeric = values.iter().all(|v| v.is_null() || v.is_number());
    if numeric && name != COL_TIME {
        let floats: Vec<Option<f64>> = values.iter().map(Value::as_f64).collect();
        return Some(Column::new(name.into(), floats));
    }
    let textual = values.iter().all(|v| v.is_null() || v.is_string());
    if textual {
        let strings: Vec<Option<&str>> = values.iter().map(Value::as_str).collect();
        return Some(Column::new(name.into(), strings));
    }
    None
}
