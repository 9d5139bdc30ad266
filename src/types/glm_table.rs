//! The canonical GLM meteorological schema and conversion options.

use polars::frame::DataFrame;
use serde_json::{Map, Value};

pub const COL_TIME: &str = "time";
pub const COL_SHORTWAVE: &str = "ShortWave";
pub const COL_CLOUD: &str = "Cloud";
pub const COL_AIR_TEMP: &str = "AirTemp";
pub const COL_REL_HUM: &str = "RelHum";
pub const COL_WIND_SPEED: &str = "WindSpeed";
pub const COL_RAIN: &str = "Rain";
pub const COL_WIND_DIR: &str = "WindDir";
pub const COL_VAP_PRESS: &str = "VapPress";

/// Column order of a GLM `met.csv`.
pub const GLM_COLUMNS: [&str; 7] = [
    COL_TIME,
    COL_SHORTWAVE,
    COL_CLOUD,
    COL_AIR_TEMP,
    COL_REL_HUM,
    COL_WIND_SPEED,
    COL_RAIN,
];

/// Timestamp layout GLM reads: local time without an offset.
pub const GLM_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Unit of the `Rain` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RainUnits {
    /// Precipitation depth per timestep in millimetres, as the providers report it.
    #[default]
    Millimetres,
    /// Rate in metres per day, the unit GLM's `rain_factor = 1` namelist expects.
    /// Hourly depths are scaled by 24 to a daily rate.
    MetresPerDay,
}

impl RainUnits {
    /// Factor turning a depth in mm accumulated over `hours` into this unit.
    pub(crate) fn factor_from_mm(&self, hours: f64) -> f64 {
        match self {
            RainUnits::Millimetres => 1.0,
            RainUnits::MetresPerDay => (24.0 / hours) / 1000.0,
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            RainUnits::Millimetres => "mm",
            RainUnits::MetresPerDay => "m/day",
        }
    }
}

/// Unit a GLM column is written in.
pub(crate) fn glm_unit(column: &str, rain_units: RainUnits) -> &'static str {
    match column {
        COL_SHORTWAVE => "W/m²",
        COL_CLOUD => "fraction",
        COL_AIR_TEMP => "°C",
        COL_REL_HUM => "%",
        COL_WIND_SPEED => "m/s",
        COL_RAIN => rain_units.label(),
        COL_WIND_DIR => "°",
        COL_VAP_PRESS => "hPa",
        _ => "",
    }
}

/// Knobs applied by `convert_to_glm_format`.
///
/// # Examples
///
/// ```
/// use glm_met::{GlmOptions, RainUnits};
///
/// let options = GlmOptions::default()
///     .with_rain_units(RainUnits::MetresPerDay)
///     .with_optional_columns(true);
/// assert_eq!(options.rain_units, RainUnits::MetresPerDay);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlmOptions {
    pub rain_units: RainUnits,
    /// Emit `WindDir` / `VapPress` when the fetched data carries them.
    pub optional_columns: bool,
}

impl GlmOptions {
    pub fn with_rain_units(mut self, rain_units: RainUnits) -> Self {
        self.rain_units = rain_units;
        self
    }

    pub fn with_optional_columns(mut self, optional_columns: bool) -> Self {
        self.optional_columns = optional_columns;
        self
    }
}

/// A table in GLM layout together with a description of how it was derived.
#[derive(Debug, Clone, PartialEq)]
pub struct GlmTable {
    pub data: DataFrame,
    /// Source provider, units and any estimated or omitted fields.
    pub metadata: Map<String, Value>,
}
