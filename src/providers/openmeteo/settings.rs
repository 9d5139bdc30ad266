//! Endpoints, variable vocabularies and defaults of the Open-Meteo APIs.

use crate::types::error::ValidationError;
use std::fmt;
use std::str::FromStr;

pub const HISTORICAL_API_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const CLIMATE_API_URL: &str = "https://climate-api.open-meteo.com/v1/climate";

pub(crate) const DEFAULT_TIMEZONE: &str = "auto";

pub(crate) const HOURLY_HISTORICAL_GLM_DEFAULT: [&str; 6] = [
    "shortwave_radiation",
    "cloudcover",
    "temperature_2m",
    "relativehumidity_2m",
    "windspeed_10m",
    "precipitation",
];

pub(crate) const DAILY_HISTORICAL_GLM_DEFAULT: [&str; 10] = [
    "shortwave_radiation_sum",
    "temperature_2m_mean",
    "temperature_2m_max",
    "temperature_2m_min",
    "windspeed_10m_max",
    "precipitation_sum",
    "et0_fao_evapotranspiration",
    "cloud_cover_mean",
    "relative_humidity_2m_mean",
    "wind_speed_10m_mean",
];

pub(crate) const CLIMATE_GLM_DEFAULT: [&str; 9] = [
    "shortwave_radiation_sum",
    "cloudcover_mean",
    "temperature_2m_mean",
    "temperature_2m_max",
    "temperature_2m_min",
    "relative_humidity_2m_mean",
    "windspeed_10m_mean",
    "precipitation_sum",
    "et0_fao_evapotranspiration_sum",
];

const HOURLY_HISTORICAL_VARIABLES: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "dew_point_2m",
    "apparent_temperature",
    "precipitation",
    "rain",
    "snowfall",
    "snow_depth",
    "weather_code",
    "pressure_msl",
    "surface_pressure",
    "cloud_cover",
    "cloud_cover_low",
    "cloud_cover_mid",
    "cloud_cover_high",
    "et0_fao_evapotranspiration",
    "vapour_pressure_deficit",
    "wind_speed_10m",
    "wind_speed_100m",
    "wind_direction_10m",
    "wind_direction_100m",
    "wind_gusts_10m",
    "soil_temperature_0_to_7cm",
    "soil_temperature_7_to_28cm",
    "soil_temperature_28_to_100cm",
    "soil_temperature_100_to_255cm",
    "soil_moisture_0_to_7cm",
    "soil_moisture_7_to_28cm",
    "soil_moisture_28_to_100cm",
    "soil_moisture_100_to_255cm",
    "is_day",
    "sunshine_duration",
    "shortwave_radiation",
    "direct_radiation",
    "diffuse_radiation",
    "direct_normal_irradiance",
    "global_tilted_irradiance",
    "terrestrial_radiation",
    "shortwave_radiation_instant",
    "direct_radiation_instant",
    "diffuse_radiation_instant",
    "direct_normal_irradiance_instant",
    "terrestrial_radiation_instant",
];

const DAILY_HISTORICAL_VARIABLES: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "temperature_2m_mean",
    "apparent_temperature_max",
    "apparent_temperature_min",
    "apparent_temperature_mean",
    "sunrise",
    "sunset",
    "daylight_duration",
    "sunshine_duration",
    "precipitation_sum",
    "rain_sum",
    "snowfall_sum",
    "precipitation_hours",
    "wind_speed_10m_max",
    "wind_speed_10m_mean",
    "wind_gusts_10m_max",
    "wind_direction_10m_dominant",
    "shortwave_radiation_sum",
    "et0_fao_evapotranspiration",
    "cloud_cover_mean",
    "cloud_cover_max",
    "cloud_cover_min",
    "relative_humidity_2m_mean",
    "relative_humidity_2m_max",
    "relative_humidity_2m_min",
    "dew_point_2m_mean",
    "pressure_msl_mean",
    "surface_pressure_mean",
    "vapour_pressure_deficit_max",
];

const CLIMATE_VARIABLES: &[&str] = &[
    "temperature_2m_mean",
    "temperature_2m_max",
    "temperature_2m_min",
    "wind_speed_10m_mean",
    "wind_speed_10m_max",
    "cloud_cover_mean",
    "shortwave_radiation_sum",
    "relative_humidity_2m_mean",
    "relative_humidity_2m_max",
    "relative_humidity_2m_min",
    "dew_point_2m_mean",
    "dew_point_2m_min",
    "dew_point_2m_max",
    "precipitation_sum",
    "rain_sum",
    "snowfall_sum",
    "pressure_msl_mean",
    "soil_moisture_0_to_10cm_mean",
    "et0_fao_evapotranspiration_sum",
];

/// Open-Meteo renamed its variables by inserting underscores; both spellings
/// are still served.
const LEGACY_SPELLINGS: [(&str, &str); 7] = [
    ("cloudcover", "cloud_cover"),
    ("relativehumidity", "relative_humidity"),
    ("windspeed", "wind_speed"),
    ("winddirection", "wind_direction"),
    ("windgusts", "wind_gusts"),
    ("dewpoint", "dew_point"),
    ("weathercode", "weather_code"),
];

fn modern_spelling(variable: &str) -> String {
    LEGACY_SPELLINGS
        .iter()
        .fold(variable.to_string(), |name, (legacy, modern)| {
            if name.contains(modern) {
                name
            } else {
                name.replace(legacy, modern)
            }
        })
}

pub(crate) fn hourly_historical_vocabulary() -> &'static [&'static str] {
    HOURLY_HISTORICAL_VARIABLES
}

pub(crate) fn daily_historical_vocabulary() -> &'static [&'static str] {
    DAILY_HISTORICAL_VARIABLES
}

pub(crate) fn climate_vocabulary() -> &'static [&'static str] {
    CLIMATE_VARIABLES
}

/// Rejects empty lists and any variable outside `vocabulary`, in either spelling.
pub(crate) fn validate_variables(
    provider: &'static str,
    variables: &[String],
    vocabulary: &[&str],
) -> Result<(), ValidationError> {
    if variables.is_empty() {
        return Err(ValidationError::NoVariables { provider });
    }
    let unsupported: Vec<String> = variables
        .iter()
        .filter(|variable| !vocabulary.contains(&modern_spelling(variable).as_str()))
        .cloned()
        .collect();
    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedVariables {
            provider,
            variables: unsupported,
        })
    }
}

/// High resolution models served by the climate API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClimateModel {
    CmccCm2Vhr4,
    FgoalsF3H,
    HiramSitHr,
    MriAgcm32S,
    EcEarth3pHr,
    MpiEsm12Xr,
    Nicam168s,
}

impl ClimateModel {
    pub const ALL: [ClimateModel; 7] = [
        ClimateModel::CmccCm2Vhr4,
        ClimateModel::FgoalsF3H,
        ClimateModel::HiramSitHr,
        ClimateModel::MriAgcm32S,
        ClimateModel::EcEarth3pHr,
        ClimateModel::MpiEsm12Xr,
        ClimateModel::Nicam168s,
    ];

    /// Identifier used in requests and in response column suffixes.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClimateModel::CmccCm2Vhr4 => "CMCC_CM2_VHR4",
            ClimateModel::FgoalsF3H => "FGOALS_f3_H",
            ClimateModel::HiramSitHr => "HiRAM_SIT_HR",
            ClimateModel::MriAgcm32S => "MRI_AGCM3_2_S",
            ClimateModel::EcEarth3pHr => "EC_Earth3P_HR",
            ClimateModel::MpiEsm12Xr => "MPI_ESM1_2_XR",
            ClimateModel::Nicam168s => "NICAM16_8S",
        }
    }
}

impl fmt::Display for ClimateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parses a model identifier, ignoring case.
///
/// # Examples
///
/// ```
/// use glm_met::ClimateModel;
///
/// let model: ClimateModel = "ec_earth3p_hr".parse().unwrap();
/// assert_eq!(model, ClimateModel::EcEarth3pHr);
/// assert!("GFDL".parse::<ClimateModel>().is_err());
/// ```
impl FromStr for ClimateModel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClimateModel::ALL
            .into_iter()
            .find(|model| model.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownClimateModel(s.to_string()))
    }
}
