//! Reanalysis data from the Open-Meteo historical weather (archive) API.

use crate::convert::error::ConversionError;
use crate::error::GlmMetError;
use crate::glm_met::GlmMet;
use crate::persist::error::PersistError;
use crate::persist::writer::{write_glm, write_raw};
use crate::providers::openmeteo::glm::to_glm;
use crate::providers::openmeteo::parse::parse_response;
use crate::providers::openmeteo::settings::{
    daily_historical_vocabulary, hourly_historical_vocabulary, validate_variables,
    DAILY_HISTORICAL_GLM_DEFAULT, DEFAULT_TIMEZONE, HISTORICAL_API_URL,
    HOURLY_HISTORICAL_GLM_DEFAULT,
};
use crate::transport::client::{send, HttpClient};
use crate::transport::request_settings::{build_request, RequestSettings};
use crate::types::adapter_state::AdapterState;
use crate::types::date_range::{ymd, DateRange};
use crate::types::error::ValidationError;
use crate::types::glm_table::{GlmOptions, GlmTable};
use crate::types::location::LonLat;
use crate::types::met_data::MetData;
use crate::types::resolution::Resolution;
use bon::bon;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

const PROVIDER: &str = "Open-Meteo Historical";

/// Hourly or daily reanalysis (ERA5 and friends) for a single point.
///
/// Without an explicit variable list, the variables GLM needs at the chosen
/// resolution are requested. Wind speed is always requested in m/s.
///
/// # Examples
///
/// ```
/// use glm_met::{DateRange, Historical, LonLat, Resolution};
///
/// let adapter = Historical::builder()
///     .location(LonLat(116.691155, -34.225812))
///     .date_range(DateRange::parse("2020-01-01", "2020-01-31").unwrap())
///     .resolution(Resolution::Daily)
///     .timezone("Australia/Perth")
///     .build();
/// assert!(adapter.validate().is_ok());
/// assert!(adapter.glm().is_none());
/// ```
pub struct Historical {
    location: LonLat,
    date_range: DateRange,
    variables: Vec<String>,
    resolution: Resolution,
    timezone: String,
    glm_options: GlmOptions,
    client: Option<Arc<dyn HttpClient>>,
    state: AdapterState<GlmTable>,
}

#[bon]
impl Historical {
    #[builder]
    pub fn new(
        location: LonLat,
        date_range: DateRange,
        variables: Option<Vec<String>>,
        #[builder(default)] resolution: Resolution,
        #[builder(into)] timezone: Option<String>,
        #[builder(default)] glm_options: GlmOptions,
        client: Option<Arc<dyn HttpClient>>,
    ) -> Self {
        let variables = variables.unwrap_or_else(|| {
            let defaults: &[&str] = match resolution {
                Resolution::Hourly => &HOURLY_HISTORICAL_GLM_DEFAULT,
                Resolution::Daily => &DAILY_HISTORICAL_GLM_DEFAULT,
            };
            defaults.iter().map(|v| v.to_string()).collect()
        });
        Self {
            location,
            date_range,
            variables,
            resolution,
            timezone: timezone.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            glm_options,
            client,
            state: AdapterState::default(),
        }
    }

    /// Checks the query before anything is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.location.validate()?;
        self.date_range
            .validate_within(PROVIDER, ymd(1940, 1, 1), Utc::now().date_naive())?;
        let vocabulary = match self.resolution {
            Resolution::Hourly => hourly_historical_vocabulary(),
            Resolution::Daily => daily_historical_vocabulary(),
        };
        validate_variables(PROVIDER, &self.variables, vocabulary)
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn state(&self) -> &AdapterState<GlmTable> {
        &self.state
    }

    /// The converted table, once [`GlmMet::convert_to_glm_format`] succeeded.
    pub fn glm(&self) -> Option<&GlmTable> {
        self.state.glm()
    }

    fn query(&self) -> Vec<(String, String)> {
        vec![
            ("longitude".to_string(), self.location.longitude().to_string()),
            ("latitude".to_string(), self.location.latitude().to_string()),
            ("start_date".to_string(), self.date_range.iso_start()),
            ("end_date".to_string(), self.date_range.iso_end()),
            (
                self.resolution.block_key().to_string(),
                self.variables.join(","),
            ),
            ("timezone".to_string(), self.timezone.clone()),
            ("wind_speed_unit".to_string(), "ms".to_string()),
        ]
    }
}

impl GlmMet for Historical {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn fetch(&mut self, settings: Option<&RequestSettings>) -> Result<(), GlmMetError> {
        self.validate()?;
        let request = build_request(HISTORICAL_API_URL, self.query(), settings);
        let response = send(self.client.as_ref(), &request)?;
        let met_data = parse_response(&request, &response.body, self.resolution, self.location)?;
        self.state.set_fetched(met_data);
        Ok(())
    }

    fn write_raw(&self, dir: &Path, file_name: &str) -> Result<(), GlmMetError> {
        let met_data = self.state.met_data().ok_or(PersistError::NotFetched)?;
        write_raw(met_data, dir, file_name)?;
        Ok(())
    }

    fn convert_to_glm_format(&mut self) -> Result<(), GlmMetError> {
        let met_data = self.state.met_data().ok_or(ConversionError::NotFetched)?;
        let glm = to_glm(
            met_data,
            PROVIDER,
            self.resolution,
            &self.glm_options,
            |variable| variable.to_string(),
        )?;
        self.state.set_converted(glm);
        Ok(())
    }

    fn write_glm_format(
        &self,
        dir: &Path,
        file_name: &str,
        compress: bool,
    ) -> Result<(), GlmMetError> {
        let glm = self.state.glm().ok_or(PersistError::NotConverted)?;
        write_glm(
            dir,
            file_name,
            compress,
            &[(file_name.to_string(), &glm.data)],
            &glm.metadata,
        )?;
        Ok(())
    }

    fn met_data(&self) -> Option<&MetData> {
        self.state.met_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::fields::float_values;
    use crate::test_support::{fixture_value, open_meteo_body, FixtureClient};
    use crate::transport::error::ProviderError;
    use crate::types::glm_table::{RainUnits, GLM_COLUMNS};
    use polars::prelude::*;
    use reqwest::StatusCode;
    use std::fs::File;
    use tempfile::tempdir;

    const LAKE: LonLat = LonLat(116.691155, -34.225812);

    const DOCUMENTED_VARIABLES: [&str; 10] = [
        "temperature_2m",
        "relativehumidity_2m",
        "precipitation",
        "cloudcover",
        "et0_fao_evapotranspiration",
        "windspeed_10m",
        "winddirection_10m",
        "windgusts_10m",
        "shortwave_radiation",
        "direct_normal_irradiance",
    ];

    fn january() -> DateRange {
        DateRange::parse("2020-01-01", "2020-01-31").unwrap()
    }

    fn adapter(
        range: DateRange,
        resolution: Resolution,
        variables: &[&str],
        client: Arc<FixtureClient>,
    ) -> Historical {
        Historical::builder()
            .location(LAKE)
            .date_range(range)
            .variables(variables.iter().map(|v| v.to_string()).collect())
            .resolution(resolution)
            .client(client)
            .build()
    }

    #[test]
    fn test_scenario_january_hourly() -> Result<(), GlmMetError> {
        let client = Arc::new(FixtureClient::ok(open_meteo_body(
            &january(),
            true,
            &DOCUMENTED_VARIABLES,
        )));
        let mut historical = adapter(january(), Resolution::Hourly, &DOCUMENTED_VARIABLES, client.clone());

        historical.fetch(None)?;
        historical.convert_to_glm_format()?;

        assert_eq!(client.last_query("hourly").as_deref(), Some(DOCUMENTED_VARIABLES.join(",").as_str()));
        assert_eq!(client.last_query("wind_speed_unit").as_deref(), Some("ms"));
        assert_eq!(client.last_query("start_date").as_deref(), Some("2020-01-01"));
        assert_eq!(client.last_query("timezone").as_deref(), Some("auto"));

        let glm = historical.glm().ok_or(ConversionError::NotFetched)?;
        assert_eq!(glm.data.height(), 744);
        assert_eq!(glm.data.height(), january().timesteps(Resolution::Hourly));
        assert_eq!(glm.data.get_column_names_str(), GLM_COLUMNS);

        let time = glm.data.column("time").map_err(ConversionError::from)?;
        assert_eq!(time.str().map_err(ConversionError::from)?.get(0), Some("2020-01-01 00:00"));

        let air_temp = float_values(&glm.data, "AirTemp")?;
        assert_eq!(air_temp[0], Some(fixture_value("temperature_2m", 0)));

        let cloud = float_values(&glm.data, "Cloud")?;
        for (i, value) in cloud.iter().enumerate() {
            let value = value.unwrap_or(-1.0);
            assert!((0.0..=1.0).contains(&value));
            assert!((value - fixture_value("cloudcover", i) / 100.0).abs() < 1e-12);
        }

        let rain = float_values(&glm.data, "Rain")?;
        assert_eq!(rain[1], Some(fixture_value("precipitation", 1)));
        assert_eq!(glm.metadata["units"]["Rain"], "mm");
        Ok(())
    }

    #[test]
    fn test_convert_is_idempotent() -> Result<(), GlmMetError> {
        let range = DateRange::parse("2020-01-01", "2020-01-02")?;
        let variables = HOURLY_HISTORICAL_GLM_DEFAULT;
        let client = Arc::new(FixtureClient::ok(open_meteo_body(&range, true, &variables)));
        let mut historical = adapter(range, Resolution::Hourly, &variables, client);
        historical.fetch(None)?;

        historical.convert_to_glm_format()?;
        let first = historical.glm().cloned();
        historical.convert_to_glm_format()?;
        assert_eq!(first.as_ref(), historical.glm());
        Ok(())
    }

    #[test]
    fn test_single_day_yields_24_rows() -> Result<(), GlmMetError> {
        let range = DateRange::parse("2020-06-01", "2020-06-01")?;
        let variables = HOURLY_HISTORICAL_GLM_DEFAULT;
        let client = Arc::new(FixtureClient::ok(open_meteo_body(&range, true, &variables)));
        let mut historical = adapter(range, Resolution::Hourly, &variables, client);
        historical.fetch(None)?;
        historical.convert_to_glm_format()?;
        assert_eq!(historical.glm().map(|g| g.data.height()), Some(24));
        Ok(())
    }

    #[test]
    fn test_daily_conversion_units() -> Result<(), GlmMetError> {
        let range = DateRange::parse("2020-01-01", "2020-01-01")?;
        let variables = DAILY_HISTORICAL_GLM_DEFAULT;
        let client = Arc::new(FixtureClient::ok(open_meteo_body(&range, false, &variables)));
        let mut historical = Historical::builder()
            .location(LAKE)
            .date_range(range)
            .resolution(Resolution::Daily)
            .glm_options(GlmOptions::default().with_rain_units(RainUnits::MetresPerDay))
            .client(client.clone())
            .build();
        historical.fetch(None)?;
        historical.convert_to_glm_format()?;

        assert_eq!(client.last_query("daily").as_deref(), Some(variables.join(",").as_str()));
        let glm = historical.glm().ok_or(ConversionError::NotFetched)?;
        assert_eq!(glm.data.height(), 1);

        let time = glm.data.column("time").map_err(ConversionError::from)?;
        assert_eq!(time.str().map_err(ConversionError::from)?.get(0), Some("2020-01-01 00:00"));

        let shortwave = float_values(&glm.data, "ShortWave")?[0].unwrap_or_default();
        let expected = fixture_value("shortwave_radiation_sum", 0) * 1.0e6 / 86_400.0;
        assert!((shortwave - expected).abs() < 1e-9);

        let rain = float_values(&glm.data, "Rain")?[0].unwrap_or_default();
        assert!((rain - fixture_value("precipitation_sum", 0) / 1000.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_fahrenheit_request_converted_back() -> Result<(), GlmMetError> {
        let range = DateRange::parse("2020-01-01", "2020-01-01")?;
        let body = open_meteo_body(&range, true, &HOURLY_HISTORICAL_GLM_DEFAULT)
            .replace("\"°C\"", "\"°F\"");
        let client = Arc::new(FixtureClient::ok(body));
        let mut historical = adapter(range, Resolution::Hourly, &HOURLY_HISTORICAL_GLM_DEFAULT, client.clone());
        let settings = RequestSettings::new().with_query("temperature_unit", "fahrenheit");
        historical.fetch(Some(&settings))?;
        historical.convert_to_glm_format()?;

        assert_eq!(client.last_query("temperature_unit").as_deref(), Some("fahrenheit"));
        let glm = historical.glm().ok_or(ConversionError::NotFetched)?;
        let air_temp = float_values(&glm.data, "AirTemp")?[0].unwrap_or_default();
        let expected = (fixture_value("temperature_2m", 0) - 32.0) * 5.0 / 9.0;
        assert!((air_temp - expected).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_missing_fields_named() -> Result<(), GlmMetError> {
        let range = DateRange::parse("2020-01-01", "2020-01-01")?;
        let variables = ["temperature_2m", "relativehumidity_2m"];
        let client = Arc::new(FixtureClient::ok(open_meteo_body(&range, true, &variables)));
        let mut historical = adapter(range, Resolution::Hourly, &variables, client);
        historical.fetch(None)?;

        match historical.convert_to_glm_format() {
            Err(GlmMetError::Conversion(ConversionError::MissingFields { fields, .. })) => {
                assert_eq!(
                    fields,
                    vec![
                        "shortwave_radiation (ShortWave)",
                        "cloudcover (Cloud)",
                        "windspeed_10m (WindSpeed)",
                        "precipitation (Rain)",
                    ]
                );
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
        assert!(historical.glm().is_none());
        assert!(historical.met_data().is_some());
        Ok(())
    }

    #[test]
    fn test_failed_fetch_keeps_state() -> Result<(), GlmMetError> {
        let range = DateRange::parse("2020-01-01", "2020-01-01")?;
        let variables = HOURLY_HISTORICAL_GLM_DEFAULT;
        let good = Arc::new(FixtureClient::ok(open_meteo_body(&range, true, &variables)));
        let mut historical = adapter(range, Resolution::Hourly, &variables, good);
        historical.fetch(None)?;
        historical.convert_to_glm_format()?;
        let before = historical.glm().cloned();

        historical.client = Some(Arc::new(FixtureClient::with_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":true,"reason":"Parameter 'start_date' is out of allowed range"}"#,
        )));
        match historical.fetch(None) {
            Err(GlmMetError::Provider(ProviderError::HttpStatus { status, reason, .. })) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(reason.is_some());
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
        assert_eq!(historical.glm().cloned(), before);
        Ok(())
    }

    #[test]
    fn test_validation_before_request() -> Result<(), GlmMetError> {
        let client = Arc::new(FixtureClient::ok("{}"));
        let mut historical = adapter(january(), Resolution::Hourly, &["temperature_2m", "banana"], client.clone());
        assert!(matches!(
            historical.fetch(None),
            Err(GlmMetError::Validation(ValidationError::UnsupportedVariables { .. }))
        ));

        let mut old = adapter(
            DateRange::parse("1939-12-31", "1940-01-02")?,
            Resolution::Hourly,
            &["temperature_2m"],
            client.clone(),
        );
        assert!(matches!(
            old.fetch(None),
            Err(GlmMetError::Validation(ValidationError::DateOutsideProviderRange { .. }))
        ));

        let mut nowhere = Historical::builder()
            .location(LonLat(200.0, 0.0))
            .date_range(january())
            .client(client.clone())
            .build();
        assert!(nowhere.fetch(None).is_err());
        assert!(client.requests().is_empty());
        Ok(())
    }

    #[test]
    fn test_write_before_fetch_fails() {
        let historical = adapter(january(), Resolution::Hourly, &["temperature_2m"], Arc::new(FixtureClient::ok("{}")));
        let dir = std::env::temp_dir();
        assert!(matches!(
            historical.write_raw(&dir, "met_raw.csv"),
            Err(GlmMetError::Persist(PersistError::NotFetched))
        ));
        assert!(matches!(
            historical.write_glm_format(&dir, "met.csv", false),
            Err(GlmMetError::Persist(PersistError::NotConverted))
        ));
    }

    #[test]
    fn test_glm_csv_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let range = DateRange::parse("2020-01-01", "2020-01-02")?;
        let variables = HOURLY_HISTORICAL_GLM_DEFAULT;
        let client = Arc::new(FixtureClient::ok(open_meteo_body(&range, true, &variables)));
        let mut historical = adapter(range, Resolution::Hourly, &variables, client);
        historical.fetch(None)?;
        historical.convert_to_glm_format()?;

        let dir = tempdir()?;
        historical.write_raw(dir.path(), "met_raw.csv")?;
        historical.write_glm_format(dir.path(), "met.csv", false)?;
        assert!(dir.path().join("met_raw_metadata.json").exists());

        let read_back = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(dir.path().join("met.csv")))?
            .finish()?;
        let glm = historical.glm().ok_or(ConversionError::NotFetched)?;
        assert_eq!(read_back.get_column_names_str(), GLM_COLUMNS);
        assert_eq!(read_back.height(), glm.data.height());
        for name in &GLM_COLUMNS[1..] {
            let written = float_values(&glm.data, name)?;
            let read = float_values(&read_back, name)?;
            for (a, b) in written.iter().zip(read.iter()) {
                assert!((a.unwrap_or_default() - b.unwrap_or_default()).abs() < 1e-9);
            }
        }

        historical.write_glm_format(dir.path(), "met.csv", true)?;
        let archive = ::zip::ZipArchive::new(File::open(dir.path().join("met.zip"))?)?;
        assert!(archive.file_names().any(|n| n == "met.csv"));
        Ok(())
    }

    #[test]
    #[ignore = "hits the live Open-Meteo archive API"]
    fn test_live_archive() -> Result<(), GlmMetError> {
        let mut historical = Historical::builder()
            .location(LAKE)
            .date_range(DateRange::parse("2020-01-01", "2020-01-31")?)
            .build();
        historical.fetch(None)?;
        historical.convert_to_glm_format()?;
        assert_eq!(historical.glm().map(|g| g.data.height()), Some(744));
        Ok(())
    }
}
