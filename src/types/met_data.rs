//! Raw provider output: metadata plus the observation table.

use polars::frame::DataFrame;
use serde_json::{Map, Value};

/// Data exactly as a provider returned it, reshaped into one row per timestep.
///
/// `metadata` holds whatever the provider sent alongside the values (elevation,
/// resolved coordinates, per-variable units, ...). `data` has a `time` column
/// followed by one column per returned variable.
#[derive(Debug, Clone, PartialEq)]
pub struct MetData {
    pub metadata: Map<String, Value>,
    pub data: DataFrame,
}

impl MetData {
    pub fn new(metadata: Map<String, Value>, data: DataFrame) -> Self {
        Self { metadata, data }
    }

    /// Unit string a provider reported for `variable` under `units_key`, if any.
    pub fn unit_of(&self, units_key: &str, variable: &str) -> Option<&str> {
        self.metadata
            .get(units_key)
            .and_then(Value::as_object)
            .and_then(|units| units.get(variable))
            .and_then(Value::as_str)
    }
}
