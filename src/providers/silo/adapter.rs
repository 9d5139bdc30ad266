//! Daily Australian station and gridded data from SILO.

use crate::convert::error::ConversionError;
use crate::convert::fields::{float_values, has_values, Quantity};
use crate::convert::glm::glm_metadata;
use crate::convert::timestamps::{glm_time_column, parse_times, TimeLayout};
use crate::error::GlmMetError;
use crate::glm_met::GlmMet;
use crate::persist::error::PersistError;
use crate::persist::writer::{write_glm, write_raw};
use crate::providers::silo::settings::{
    normalize_codes, SiloApi, SiloOutput, SiloSite, API_PASSWORD, AUSTRALIA, GLM_DEFAULT_CODES,
};
use crate::transport::client::{send, HttpClient, HttpRequest};
use crate::transport::error::ProviderError;
use crate::transport::request_settings::{build_request, RequestSettings};
use crate::types::adapter_state::AdapterState;
use crate::types::date_range::{ymd, DateRange};
use crate::types::error::ValidationError;
use crate::types::glm_table::{
    GlmOptions, GlmTable, RainUnits, COL_AIR_TEMP, COL_CLOUD, COL_RAIN, COL_REL_HUM,
    COL_SHORTWAVE, COL_TIME, COL_VAP_PRESS, COL_WIND_SPEED,
};
use crate::types::met_data::MetData;
use crate::types::resolution::Resolution;
use bon::bon;
use chrono::{Duration, NaiveDateTime, Utc};
use log::{debug, warn};
use polars::prelude::*;
use serde_json::{json, Map, Value};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

const PROVIDER: &str = "SILO";

/// Name of the date column in SILO CSV output.
const SILO_DATE_COLUMN: &str = "YYYY-MM-DD";
const SILO_METADATA_COLUMN: &str = "metadata";

/// Raw columns every GLM conversion needs, with the GLM column they feed.
const REQUIRED_COLUMNS: [(&str, &str); 6] = [
    ("radiation", COL_SHORTWAVE),
    ("max_temp", COL_AIR_TEMP),
    ("min_temp", COL_AIR_TEMP),
    ("rh_tmax", COL_REL_HUM),
    ("rh_tmin", COL_REL_HUM),
    ("daily_rain", COL_RAIN),
];

/// Daily observations for Australian sites.
///
/// SILO has no cloud cover or wind speed, so the GLM table lacks `Cloud` and
/// `WindSpeed`; its metadata lists them under `omitted_fields`.
///
/// # Examples
///
/// ```
/// use glm_met::{DateRange, Silo, SiloApi, SiloSite};
///
/// let adapter = Silo::builder()
///     .site(SiloSite::Station(31011))
///     .date_range(DateRange::parse("20220101", "20220131").unwrap())
///     .username("someone@example.org")
///     .comment("rxnjhg")
///     .build();
/// assert_eq!(adapter.api(), SiloApi::PatchedPoint);
/// assert!(adapter.validate().is_ok());
/// ```
pub struct Silo {
    site: SiloSite,
    date_range: DateRange,
    comment: String,
    username: String,
    api: SiloApi,
    output: SiloOutput,
    glm_options: GlmOptions,
    client: Option<Arc<dyn HttpClient>>,
    state: AdapterState<GlmTable>,
}

#[bon]
impl Silo {
    #[builder]
    pub fn new(
        site: SiloSite,
        date_range: DateRange,
        #[builder(into)] username: String,
        #[builder(into)] comment: Option<String>,
        api: Option<SiloApi>,
        #[builder(default)] output: SiloOutput,
        #[builder(default)] glm_options: GlmOptions,
        client: Option<Arc<dyn HttpClient>>,
    ) -> Self {
        Self {
            site,
            date_range,
            comment: comment.unwrap_or_else(|| GLM_DEFAULT_CODES.to_string()),
            username,
            api: api.unwrap_or_else(|| site.api()),
            output,
            glm_options,
            client,
            state: AdapterState::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::MissingUsername);
        }
        if self.api != self.site.api() {
            let expected = match self.api {
                SiloApi::DataDrill => "a grid coordinate",
                SiloApi::PatchedPoint => "a station number",
            };
            return Err(ValidationError::SiteMismatch {
                api: self.api.as_str(),
                expected,
            });
        }
        if let SiloSite::Grid(location) = &self.site {
            location.validate_within(PROVIDER, &AUSTRALIA)?;
        }
        self.date_range
            .validate_within(PROVIDER, ymd(1889, 1, 1), Utc::now().date_naive())?;
        normalize_codes(&self.comment)?;
        Ok(())
    }

    pub fn api(&self) -> SiloApi {
        self.api
    }

    pub fn site(&self) -> SiloSite {
        self.site
    }

    pub fn state(&self) -> &AdapterState<GlmTable> {
        &self.state
    }

    pub fn glm(&self) -> Option<&GlmTable> {
        self.state.glm()
    }

    fn query(&self, comment: &str) -> Vec<(String, String)> {
        let mut query = match self.site {
            SiloSite::Station(station) => vec![("station".to_string(), station.to_string())],
            SiloSite::Grid(location) => vec![
                ("lon".to_string(), location.longitude().to_string()),
                ("lat".to_string(), location.latitude().to_string()),
            ],
        };
        query.extend([
            ("start".to_string(), self.date_range.compact_start()),
            ("finish".to_string(), self.date_range.compact_end()),
            ("format".to_string(), "csv".to_string()),
            ("comment".to_string(), comment.to_string()),
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), API_PASSWORD.to_string()),
        ]);
        query
    }

    /// Metadata describing the request itself.
    fn request_metadata(&self, comment: &str) -> Map<String, Value> {
        let mut metadata = Map::new();
        match self.site {
            SiloSite::Station(station) => {
                metadata.insert("station".to_string(), json!(station));
            }
            SiloSite::Grid(location) => {
                metadata.insert("longitude".to_string(), json!(location.longitude()));
                metadata.insert("latitude".to_string(), json!(location.latitude()));
            }
        }
        metadata.insert("start".to_string(), json!(self.date_range.compact_start()));
        metadata.insert("finish".to_string(), json!(self.date_range.compact_end()));
        metadata.insert("api".to_string(), json!(self.api.as_str()));
        metadata.insert("format".to_string(), json!("csv"));
        metadata.insert("comment".to_string(), json!(comment));
        metadata
    }

    fn to_glm(&self, met: &MetData) -> Result<GlmTable, ConversionError> {
        let df = &met.data;
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|(column, _)| !has_values(df, column))
            .map(|(column, glm)| format!("{} ({})", column, glm))
            .collect();
        if !missing.is_empty() {
            return Err(ConversionError::MissingFields {
                provider: PROVIDER,
                fields: missing,
            });
        }

        // Hourly output splits the daily depth after expansion.
        let rain_factor = match self.output {
            SiloOutput::Daily => self.glm_options.rain_units.factor_from_mm(24.0),
            SiloOutput::HourlyFlat => 1.0,
        };
        let shortwave = Quantity::Shortwave.transform("radiation", "MJ/m²", 24.0)?;
        let mean = |a: &str, b: &str, target: &str| {
            ((col(a).cast(DataType::Float64) + col(b).cast(DataType::Float64)) / lit(2.0))
                .alias(target)
        };
        let mut exprs = vec![
            shortwave.expr("radiation", COL_SHORTWAVE),
            mean("max_temp", "min_temp", COL_AIR_TEMP),
            mean("rh_tmax", "rh_tmin", COL_REL_HUM),
            (col("daily_rain").cast(DataType::Float64) * lit(rain_factor)).alias(COL_RAIN),
        ];
        let with_vapour = self.glm_options.optional_columns && has_values(df, "vp");
        if with_vapour {
            let vapour = Quantity::VapourPressure.transform("vp", "hPa", 24.0)?;
            exprs.push(vapour.expr("vp", COL_VAP_PRESS));
        }

        let times = parse_times(df, PROVIDER, COL_TIME, TimeLayout::IsoDate)?;
        let daily = df.clone().lazy().select(exprs).collect()?;

        let (data, resolution) = match self.output {
            SiloOutput::Daily => {
                let mut daily = daily;
                daily.insert_column(0, glm_time_column(&times))?;
                (daily, Resolution::Daily)
            }
            SiloOutput::HourlyFlat => {
                warn!(
                    "Spreading {} daily SILO rows flat over 24 hours; hourly values are estimates",
                    daily.height()
                );
                (
                    flatten_to_hourly(&daily, &times, self.glm_options.rain_units)?,
                    Resolution::Hourly,
                )
            }
        };

        let mut sources = Map::new();
        sources.insert(
            COL_SHORTWAVE.to_string(),
            json!({ "column": "radiation", "unit": "MJ/m²" }),
        );
        sources.insert(
            COL_AIR_TEMP.to_string(),
            json!({ "column": "(max_temp + min_temp) / 2", "unit": "°C" }),
        );
        sources.insert(
            COL_REL_HUM.to_string(),
            json!({ "column": "(rh_tmax + rh_tmin) / 2", "unit": "%" }),
        );
        sources.insert(
            COL_RAIN.to_string(),
            json!({ "column": "daily_rain", "unit": "mm" }),
        );
        if with_vapour {
            sources.insert(
                COL_VAP_PRESS.to_string(),
                json!({ "column": "vp", "unit": "hPa" }),
            );
        }

        let mut metadata = glm_metadata(
            PROVIDER,
            &data,
            resolution,
            self.glm_options.rain_units,
            sources,
        );
        let (estimated, disaggregation): (Vec<&str>, &str) = match self.output {
            SiloOutput::Daily => (vec![COL_AIR_TEMP, COL_REL_HUM], "none"),
            SiloOutput::HourlyFlat => (
                data.get_column_names_str()
                    .into_iter()
                    .filter(|name| *name != COL_TIME)
                    .collect(),
                "flat: each daily value repeated for 24 hours, Rain divided evenly",
            ),
        };
        metadata.insert("native_resolution".to_string(), json!("daily"));
        metadata.insert(
            "output_resolution".to_string(),
            json!(resolution.to_string()),
        );
        metadata.insert("estimated_fields".to_string(), json!(estimated));
        metadata.insert(
            "omitted_fields".to_string(),
            json!([COL_CLOUD, COL_WIND_SPEED]),
        );
        metadata.insert("disaggregation".to_string(), json!(disaggregation));
        for key in ["station", "station_name", "longitude", "latitude", "elevation"] {
            if let Some(value) = met.metadata.get(key) {
                metadata.insert(key.to_string(), value.clone());
            }
        }
        Ok(GlmTable { data, metadata })
    }
}

/// Repeats every daily row over 24 hourly rows. Rain is a depth in mm and is
/// divided across the hours before converting to `rain_units`.
fn flatten_to_hourly(
    daily: &DataFrame,
    days: &[NaiveDateTime],
    rain_units: RainUnits,
) -> Result<DataFrame, ConversionError> {
    let hours: Vec<NaiveDateTime> = days
        .iter()
        .flat_map(|day| (0..24).map(move |h| *day + Duration::hours(h)))
        .collect();

    let mut columns = vec![glm_time_column(&hours)];
    for name in daily.get_column_names_str() {
        let scale = if name == COL_RAIN {
            rain_units.factor_from_mm(1.0) / 24.0
        } else {
            1.0
        };
        let repeated: Vec<Option<f64>> = float_values(daily, name)?
            .into_iter()
            .flat_map(|value| std::iter::repeat(value.map(|v| v * scale)).take(24))
            .collect();
        columns.push(Column::new(name.into(), repeated));
    }
    Ok(DataFrame::new(columns)?)
}

/// Reads SILO CSV output, moving the free-text `metadata` column into `metadata`.
pub(crate) fn parse_response(
    request: &HttpRequest,
    body: &str,
    mut metadata: Map<String, Value>,
) -> Result<MetData, ProviderError> {
    let url = request.display_url();
    let first_line = body.lines().next().unwrap_or_default();
    if !first_line.contains(SILO_DATE_COLUMN) || !first_line.contains(SILO_METADATA_COLUMN) {
        return Err(ProviderError::MalformedBody {
            url,
            message: first_line.trim().to_string(),
        });
    }

    let table_error = |e: PolarsError| ProviderError::TableBuild {
        url: url.clone(),
        source: e,
    };
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(body.as_bytes().to_vec()))
        .finish()
        .map_err(|e| ProviderError::CsvParse {
            url: url.clone(),
            source: e,
        })?;

    let notes = df
        .drop_in_place(SILO_METADATA_COLUMN)
        .map_err(table_error)?;
    let notes = notes.cast(&DataType::String).map_err(table_error)?;
    for line in notes.str().map_err(table_error)?.into_iter().flatten() {
        if let Some((key, value)) = parse_note(line) {
            metadata.insert(key, value);
        }
    }

    let time = df
        .drop_in_place(SILO_DATE_COLUMN)
        .map_err(table_error)?
        .with_name(COL_TIME.into());
    df.insert_column(0, time).map_err(table_error)?;
    debug!("Parsed {} SILO rows from {}", df.height(), url);

    Ok(MetData::new(metadata, df))
}

/// `key = value` lines of the metadata column. Numbers (including the
/// elevation, given as `12.3 m`) are stored as numbers.
fn parse_note(line: &str) -> Option<(String, Value)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() {
        return None;
    }
    let key = if key == "name" { "station_name" } else { key };
    let numeric = value.strip_suffix(" m").unwrap_or(value).trim();
    let value = match numeric.parse::<f64>() {
        Ok(number) => json!(number),
        Err(_) => json!(value),
    };
    Some((key.to_string(), value))
}

impl GlmMet for Silo {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn fetch(&mut self, settings: Option<&RequestSettings>) -> Result<(), GlmMetError> {
        self.validate()?;
        let comment = normalize_codes(&self.comment)?;
        let request = build_request(self.api.url(), self.query(&comment), settings);
        let response = send(self.client.as_ref(), &request)?;
        let met_data =
            parse_response(&request, &response.body, self.request_metadata(&comment))?;
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
        let glm = self.to_glm(met_data)?;
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
    use crate::test_support::FixtureClient;
    use crate::types::location::LonLat;

    const PATCHED_POINT_CSV: &str = "\
station,YYYY-MM-DD,daily_rain,daily_rain_source,max_temp,max_temp_source,min_temp,min_temp_source,radiation,radiation_source,vp,vp_source,rh_tmax,rh_tmax_source,rh_tmin,rh_tmin_source,metadata
31011,2022-01-01,4.8,0,30.2,0,21.4,0,21.6,42,25.1,0,51.0,26,86.5,26,name = CAIRNS AERO
31011,2022-01-02,0.0,0,31.0,0,22.0,0,25.92,42,24.0,0,48.0,26,80.0,26,latitude = -16.8736
31011,2022-01-03,12.0,0,28.6,0,22.8,0,17.28,42,27.2,0,60.0,26,92.0,26,longitude = 145.7458
31011,2022-01-04,1.2,0,29.4,0,22.2,0,19.44,42,26.3,0,55.0,26,88.0,26,elevation =     2.2 m
";

    const REJECTED: &str = "Sorry, your request was rejected: you must provide a username\n";

    fn range() -> DateRange {
        DateRange::parse("20220101", "20220104").unwrap()
    }

    fn station(body: &str) -> (Silo, Arc<FixtureClient>) {
        let client = Arc::new(FixtureClient::ok(body));
        let silo = Silo::builder()
            .site(SiloSite::Station(31011))
            .date_range(range())
            .username("someone@example.org")
            .client(client.clone())
            .build();
        (silo, client)
    }

    #[test]
    fn test_parse_note() {
        assert_eq!(
            parse_note("elevation =     2.2 m"),
            Some(("elevation".to_string(), json!(2.2)))
        );
        assert_eq!(
            parse_note("name = CAIRNS AERO"),
            Some(("station_name".to_string(), json!("CAIRNS AERO")))
        );
        assert_eq!(parse_note("no separator"), None);
    }

    #[test]
    fn test_fetch_patched_point() -> Result<(), GlmMetError> {
        let (mut silo, client) = station(PATCHED_POINT_CSV);
        silo.fetch(None)?;

        assert_eq!(client.last_query("station").as_deref(), Some("31011"));
        assert_eq!(client.last_query("comment").as_deref(), Some("RXNJVHG"));
        assert_eq!(client.last_query("password").as_deref(), Some("apirequest"));
        assert_eq!(client.last_query("finish").as_deref(), Some("20220104"));
        assert_eq!(
            client.requests()[0].url,
            SiloApi::PatchedPoint.url().to_string()
        );

        let met = silo.met_data().ok_or(ConversionError::NotFetched)?;
        assert_eq!(met.data.height(), 4);
        assert_eq!(met.data.get_column_names_str()[0], "time");
        assert!(met.data.column("metadata").is_err());
        assert_eq!(met.metadata["station_name"], json!("CAIRNS AERO"));
        assert_eq!(met.metadata["elevation"], json!(2.2));
        assert_eq!(met.metadata["latitude"], json!(-16.8736));
        assert_eq!(met.metadata["api"], json!("patched_point"));
        Ok(())
    }

    #[test]
    fn test_daily_conversion() -> Result<(), GlmMetError> {
        let (mut silo, _) = station(PATCHED_POINT_CSV);
        silo.fetch(None)?;
        silo.convert_to_glm_format()?;

        let glm = silo.glm().ok_or(ConversionError::NotFetched)?;
        assert_eq!(glm.data.height(), 4);
        assert_eq!(
            glm.data.get_column_names_str(),
            ["time", "ShortWave", "AirTemp", "RelHum", "Rain"]
        );
        let air = float_values(&glm.data, COL_AIR_TEMP)?;
        assert!((air[0].unwrap_or_default() - 25.8).abs() < 1e-9);
        let shortwave = float_values(&glm.data, COL_SHORTWAVE)?;
        assert!((shortwave[1].unwrap_or_default() - 300.0).abs() < 1e-9);

        assert_eq!(glm.metadata["native_resolution"], json!("daily"));
        assert_eq!(glm.metadata["disaggregation"], json!("none"));
        assert_eq!(glm.metadata["omitted_fields"], json!(["Cloud", "WindSpeed"]));
        Ok(())
    }

    #[test]
    fn test_hourly_flat_preserves_rain_totals() -> Result<(), GlmMetError> {
        let client = Arc::new(FixtureClient::ok(PATCHED_POINT_CSV));
        let mut silo = Silo::builder()
            .site(SiloSite::Station(31011))
            .date_range(range())
            .username("someone@example.org")
            .output(SiloOutput::HourlyFlat)
            .glm_options(GlmOptions::default().with_optional_columns(true))
            .client(client)
            .build();
        silo.fetch(None)?;
        silo.convert_to_glm_format()?;

        let glm = silo.glm().ok_or(ConversionError::NotFetched)?;
        assert_eq!(glm.data.height(), 96);
        let time = glm.data.column(COL_TIME).map_err(ConversionError::from)?;
        assert_eq!(time.str().map_err(ConversionError::from)?.get(25), Some("2022-01-02 01:00"));

        let rain = float_values(&glm.data, COL_RAIN)?;
        let first_day: f64 = rain[..24].iter().map(|r| r.unwrap_or_default()).sum();
        assert!((first_day - 4.8).abs() < 1e-9);
        let vp = float_values(&glm.data, COL_VAP_PRESS)?;
        assert_eq!(vp[23], Some(25.1));

        assert_eq!(glm.metadata["output_resolution"], json!("hourly"));
        assert_eq!(
            glm.metadata["estimated_fields"],
            json!(["ShortWave", "AirTemp", "RelHum", "Rain", "VapPress"])
        );
        Ok(())
    }

    #[test]
    fn test_missing_humidity() -> Result<(), GlmMetError> {
        let without_rh = PATCHED_POINT_CSV
            .lines()
            .map(|line| {
                let cells: Vec<&str> = line.split(',').collect();
                [&cells[..12], &cells[16..]].concat().join(",")
            })
            .collect::<Vec<String>>()
            .join("\n");
        let (mut silo, _) = station(&without_rh);
        silo.fetch(None)?;
        match silo.convert_to_glm_format() {
            Err(GlmMetError::Conversion(ConversionError::MissingFields { fields, .. })) => {
                assert_eq!(fields, vec!["rh_tmax (RelHum)", "rh_tmin (RelHum)"]);
            }
            other => panic!("expected MissingFields, got {:?}", other.err()),
        }
        Ok(())
    }

    #[test]
    fn test_rejected_request() {
        let (mut silo, _) = station(REJECTED);
        match silo.fetch(None) {
            Err(GlmMetError::Provider(ProviderError::MalformedBody { url, message })) => {
                assert!(message.starts_with("Sorry"));
                assert!(url.contains("username=***"));
                assert!(!url.contains("someone@example.org"));
            }
            other => panic!("expected MalformedBody, got {:?}", other.err()),
        }
        assert!(silo.met_data().is_none());
    }

    #[test]
    fn test_validation() {
        let grid_outside = Silo::builder()
            .site(SiloSite::Grid(LonLat(4.9, 52.4)))
            .date_range(range())
            .username("someone@example.org")
            .build();
        assert!(matches!(
            grid_outside.validate(),
            Err(ValidationError::OutsideCoverage { .. })
        ));

        let mismatch = Silo::builder()
            .site(SiloSite::Station(31011))
            .api(SiloApi::DataDrill)
            .date_range(range())
            .username("someone@example.org")
            .build();
        assert!(matches!(
            mismatch.validate(),
            Err(ValidationError::SiteMismatch { .. })
        ));

        let anonymous = Silo::builder()
            .site(SiloSite::Grid(LonLat(116.6, -32.17)))
            .date_range(range())
            .username(" ")
            .build();
        assert_eq!(anonymous.validate(), Err(ValidationError::MissingUsername));

        let bad_code = Silo::builder()
            .site(SiloSite::Grid(LonLat(116.6, -32.17)))
            .date_range(range())
            .username("someone@example.org")
            .comment("rq")
            .build();
        assert_eq!(bad_code.validate(), Err(ValidationError::UnknownSiloCode('q')));
    }

    #[test]
    fn test_data_drill_query() -> Result<(), GlmMetError> {
        let silo = Silo::builder()
            .site(SiloSite::Grid(LonLat(116.6, -32.17)))
            .date_range(range())
            .username("someone@example.org")
            .comment("rxel")
            .build();
        let query = silo.query(&normalize_codes("rxel")?);
        assert_eq!(query[0], ("lon".to_string(), "116.6".to_string()));
        assert_eq!(query[1], ("lat".to_string(), "-32.17".to_string()));
        assert!(query.contains(&("comment".to_string(), "RXEL".to_string())));
        Ok(())
    }
}
