//! SILO endpoints, variable codes and site kinds.

use crate::types::error::ValidationError;
use crate::types::location::{CoverageBounds, LonLat};
use std::fmt;

pub const DATA_DRILL_API_URL: &str =
    "https://www.longpaddock.qld.gov.au/cgi-bin/silo/DataDrillDataset.php";
pub const PATCHED_POINT_API_URL: &str =
    "https://www.longpaddock.qld.gov.au/cgi-bin/silo/PatchedPointDataset.php";

/// SILO's public API accepts this fixed password alongside an email username.
pub(crate) const API_PASSWORD: &str = "apirequest";

/// Rainfall, temperatures, radiation, vapour pressure and the humidities at
/// the temperature extremes: everything a GLM table can be derived from.
pub(crate) const GLM_DEFAULT_CODES: &str = "RXNJVHG";

pub(crate) const AUSTRALIA: CoverageBounds = CoverageBounds {
    min_lon: 112.0,
    max_lon: 154.0,
    min_lat: -44.0,
    max_lat: -10.0,
};

/// `comment` codes and the CSV column each one produces.
const VARIABLE_CODES: [(char, &str); 18] = [
    ('R', "daily_rain"),
    ('X', "max_temp"),
    ('N', "min_temp"),
    ('J', "radiation"),
    ('V', "vp"),
    ('D', "vp_deficit"),
    ('E', "evap_pan"),
    ('S', "evap_syn"),
    ('C', "evap_comb"),
    ('L', "evap_morton_lake"),
    ('H', "rh_tmax"),
    ('G', "rh_tmin"),
    ('F', "et_short_crop"),
    ('T', "et_tall_crop"),
    ('A', "et_morton_actual"),
    ('P', "et_morton_potential"),
    ('W', "et_morton_wet"),
    ('M', "mslp"),
];

/// Column produced by a variable code, case-insensitive.
pub fn column_for_code(code: char) -> Option<&'static str> {
    let upper = code.to_ascii_uppercase();
    VARIABLE_CODES
        .iter()
        .find(|(c, _)| *c == upper)
        .map(|(_, column)| *column)
}

/// Upper-cases `comment` and checks every code is known.
pub(crate) fn normalize_codes(comment: &str) -> Result<String, ValidationError> {
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NoVariables { provider: "SILO" });
    }
    trimmed
        .chars()
        .map(|code| {
            column_for_code(code)
                .map(|_| code.to_ascii_uppercase())
                .ok_or(ValidationError::UnknownSiloCode(code))
        })
        .collect()
}

/// Which SILO product to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiloApi {
    /// Interpolated 0.05° grid, queried by coordinate.
    DataDrill,
    /// Station records with gaps patched from the grid, queried by station number.
    PatchedPoint,
}

impl SiloApi {
    pub fn url(&self) -> &'static str {
        match self {
            SiloApi::DataDrill => DATA_DRILL_API_URL,
            SiloApi::PatchedPoint => PATCHED_POINT_API_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SiloApi::DataDrill => "data_drill",
            SiloApi::PatchedPoint => "patched_point",
        }
    }
}

impl fmt::Display for SiloApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where to take SILO data from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SiloSite {
    /// A Bureau of Meteorology station number.
    Station(u32),
    /// A grid cell, by coordinate.
    Grid(LonLat),
}

impl SiloSite {
    /// The API serving this kind of site.
    pub fn api(&self) -> SiloApi {
        match self {
            SiloSite::Station(_) => SiloApi::PatchedPoint,
            SiloSite::Grid(_) => SiloApi::DataDrill,
        }
    }
}

/// Time step of the converted GLM table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SiloOutput {
    /// One row per day, as observed.
    #[default]
    Daily,
    /// Each daily value repeated over 24 hourly rows, rain split evenly.
    /// Every hourly value is an estimate.
    HourlyFlat,
}
