//! Download meteorological data from public providers and convert it to the
//! input format of the General Lake Model (GLM).
//!
//! Every provider is wrapped in an adapter implementing [`GlmMet`]: build it,
//! `fetch`, optionally `write_raw`, then `convert_to_glm_format` and
//! `write_glm_format`.
//!
//! ```no_run
//! use glm_met::{DateRange, GlmMet, GlmMetError, LonLat, Power};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), GlmMetError> {
//! let mut power = Power::builder()
//!     .location(LonLat(116.691155, -34.225812))
//!     .date_range(DateRange::parse("20200101", "20200107")?)
//!     .build();
//! power.fetch(None)?;
//! power.convert_to_glm_format()?;
//! power.write_glm_format(Path::new("."), "met.csv", true)?;
//! # Ok(())
//! # }
//! ```

mod convert;
mod error;
mod glm_met;
mod persist;
mod providers;
mod transport;
mod types;

#[cfg(test)]
mod test_support;

pub use error::GlmMetError;
pub use glm_met::{Adapter, GlmMet};

pub use providers::nasa_power::power::Power;
pub use providers::nasa_power::settings::{Community, TimeStandard};
pub use providers::openmeteo::climate::{ClimateChange, ModelTables};
pub use providers::openmeteo::historical::Historical;
pub use providers::openmeteo::settings::ClimateModel;
pub use providers::silo::adapter::Silo;
pub use providers::silo::settings::{column_for_code, SiloApi, SiloOutput, SiloSite};

pub use transport::client::{HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use transport::request_settings::RequestSettings;

pub use types::adapter_state::AdapterState;
pub use types::date_range::DateRange;
pub use types::glm_table::*;
pub use types::location::LonLat;
pub use types::met_data::MetData;
pub use types::resolution::Resolution;

pub use convert::error::ConversionError;
pub use persist::error::PersistError;
pub use transport::error::ProviderError;
pub use types::error::ValidationError;
