//! The lifecycle every provider adapter shares, and a tagged union to drive any
//! of them through it.

use crate::error::GlmMetError;
use crate::providers::nasa_power::power::Power;
use crate::providers::openmeteo::climate::ClimateChange;
use crate::providers::openmeteo::historical::Historical;
use crate::providers::silo::adapter::Silo;
use crate::transport::request_settings::RequestSettings;
use crate::types::met_data::MetData;
use std::path::Path;

/// Query, fetch, convert and persist meteorological data for GLM.
///
/// The steps are separate so the raw provider response can be inspected (or
/// written) before converting, and conversion can be repeated without another
/// request.
///
/// # Examples
///
/// ```no_run
/// use glm_met::{DateRange, GlmMet, GlmMetError, Historical, LonLat};
/// use std::path::Path;
///
/// # fn main() -> Result<(), GlmMetError> {
/// let mut adapter = Historical::builder()
///     .location(LonLat(116.691155, -34.225812))
///     .date_range(DateRange::parse("2020-01-01", "2020-01-31")?)
///     .build();
///
/// adapter.fetch(None)?;
/// adapter.write_raw(Path::new("."), "met_raw.csv")?;
/// adapter.convert_to_glm_format()?;
/// adapter.write_glm_format(Path::new("."), "met.csv", false)?;
/// # Ok(())
/// # }
/// ```
pub trait GlmMet {
    /// Human readable provider name, used in errors and metadata.
    fn provider(&self) -> &'static str;

    /// Sends one request with the adapter's query and stores the parsed response.
    ///
    /// On failure the adapter keeps whatever it held before.
    fn fetch(&mut self, settings: Option<&RequestSettings>) -> Result<(), GlmMetError>;

    /// Writes the fetched table to `dir/file_name` and its metadata next to it.
    fn write_raw(&self, dir: &Path, file_name: &str) -> Result<(), GlmMetError>;

    /// Maps the fetched table onto the GLM schema.
    fn convert_to_glm_format(&mut self) -> Result<(), GlmMetError>;

    /// Writes the GLM table(s), bundled into `<stem>.zip` when `compress` is set.
    fn write_glm_format(
        &self,
        dir: &Path,
        file_name: &str,
        compress: bool,
    ) -> Result<(), GlmMetError>;

    /// Data from the last successful fetch.
    fn met_data(&self) -> Option<&MetData>;
}

/// Any of the supported adapters.
pub enum Adapter {
    Historical(Historical),
    ClimateChange(ClimateChange),
    Power(Power),
    Silo(Silo),
}

impl Adapter {
    fn inner(&self) -> &dyn GlmMet {
        match self {
            Adapter::Historical(adapter) => adapter,
            Adapter::ClimateChange(adapter) => adapter,
            Adapter::Power(adapter) => adapter,
            Adapter::Silo(adapter) => adapter,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn GlmMet {
        match self {
            Adapter::Historical(adapter) => adapter,
            Adapter::ClimateChange(adapter) => adapter,
            Adapter::Power(adapter) => adapter,
            Adapter::Silo(adapter) => adapter,
        }
    }
}

impl GlmMet for Adapter {
    fn provider(&self) -> &'static str {
        self.inner().provider()
    }

    fn fetch(&mut self, settings: Option<&RequestSettings>) -> Result<(), GlmMetError> {
        self.inner_mut().fetch(settings)
    }

    fn write_raw(&self, dir: &Path, file_name: &str) -> Result<(), GlmMetError> {
        self.inner().write_raw(dir, file_name)
    }

    fn convert_to_glm_format(&mut self) -> Result<(), GlmMetError> {
        self.inner_mut().convert_to_glm_format()
    }

    fn write_glm_format(
        &self,
        dir: &Path,
        file_name: &str,
        compress: bool,
    ) -> Result<(), GlmMetError> {
        self.inner().write_glm_format(dir, file_name, compress)
    }

    fn met_data(&self) -> Option<&MetData> {
        self.inner().met_data()
    }
}

impl From<Historical> for Adapter {
    fn from(adapter: Historical) -> Self {
        Adapter::Historical(adapter)
    }
}

impl From<ClimateChange> for Adapter {
    fn from(adapter: ClimateChange) -> Self {
        Adapter::ClimateChange(adapter)
    }
}

impl From<Power> for Adapter {
    fn from(adapter: Power) -> Self {
        Adapter::Power(adapter)
    }
}

impl From<Silo> for Adapter {
    fn from(adapter: Silo) -> Self {
        Adapter::Silo(adapter)
    }
}
