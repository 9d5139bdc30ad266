//! Hourly solar and meteorological data from the NASA POWER point API.

use crate::convert::error::ConversionError;
use crate::convert::fields::{assemble, resolve_fields, resolve_optional_fields, FieldSpec, Quantity};
use crate::convert::glm::{field_exprs, glm_metadata};
use crate::convert::timestamps::{reformat_time, TimeLayout};
use crate::error::GlmMetError;
use crate::glm_met::GlmMet;
use crate::persist::error::PersistError;
use crate::persist::writer::{write_glm, write_raw};
use crate::providers::nasa_power::settings::{
    validate_parameters, Community, TimeStandard, DEFAULT_FILL_VALUE, HOURLY_GLM_DEFAULT,
    POWER_API_URL,
};
use crate::transport::client::{send, HttpClient, HttpRequest};
use crate::transport::error::ProviderError;
use crate::transport::request_settings::{build_request, RequestSettings};
use crate::types::adapter_state::AdapterState;
use crate::types::date_range::{ymd, DateRange};
use crate::types::error::ValidationError;
use crate::types::glm_table::{
    GlmOptions, GlmTable, COL_AIR_TEMP, COL_CLOUD, COL_RAIN, COL_REL_HUM, COL_SHORTWAVE, COL_TIME,
    COL_WIND_DIR, COL_WIND_SPEED,
};
use crate::types::location::LonLat;
use crate::types::met_data::MetData;
use crate::types::resolution::Resolution;
use bon::bon;
use chrono::Utc;
use log::debug;
use polars::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

const PROVIDER: &str = "NASA POWER";

/// Top level keys of a response kept as metadata.
const METADATA_KEYS: [&str; 4] = ["header", "parameters", "geometry", "messages"];

const GLM_FIELDS: [FieldSpec; 6] = [
    FieldSpec {
        glm: COL_SHORTWAVE,
        candidates: &["ALLSKY_SFC_SW_DWN"],
        quantity: Quantity::Shortwave,
    },
    FieldSpec {
        glm: COL_CLOUD,
        candidates: &["CLOUD_AMT"],
        quantity: Quantity::CloudCover,
    },
    FieldSpec {
        glm: COL_AIR_TEMP,
        candidates: &["T2M"],
        quantity: Quantity::Temperature,
    },
    FieldSpec {
        glm: COL_REL_HUM,
        candidates: &["RH2M"],
        quantity: Quantity::Humidity,
    },
    FieldSpec {
        glm: COL_WIND_SPEED,
        candidates: &["WS10M", "WS2M"],
        quantity: Quantity::WindSpeed,
    },
    FieldSpec {
        glm: COL_RAIN,
        candidates: &["PRECTOTCORR"],
        quantity: Quantity::Precipitation,
    },
];

const OPTIONAL_FIELDS: [FieldSpec; 1] = [FieldSpec {
    glm: COL_WIND_DIR,
    candidates: &["WD10M", "WD2M"],
    quantity: Quantity::WindDirection,
}];

/// FAO-56 logarithmic wind profile, lifting 2 m wind speed to 10 m:
/// `u10 = u2 * ln(67.8 * 10 - 5.42) / 4.87`.
pub(crate) fn ws2m_to_ws10m_factor() -> f64 {
    (67.8_f64 * 10.0 - 5.42).ln() / 4.87
}

/// Hourly point data from NASA POWER.
///
/// Values equal to the response's fill value (`-999` unless the header says
/// otherwise) are stored as nulls.
///
/// # Examples
///
/// ```
/// use glm_met::{Community, DateRange, LonLat, Power, TimeStandard};
///
/// let adapter = Power::builder()
///     .location(LonLat(116.6, -32.17))
///     .date_range(DateRange::parse("20220101", "20220131").unwrap())
///     .time_standard(TimeStandard::Utc)
///     .community(Community::Ag)
///     .build();
/// assert_eq!(adapter.parameters().len(), 6);
/// ```
pub struct Power {
    location: LonLat,
    date_range: DateRange,
    parameters: Vec<String>,
    time_standard: TimeStandard,
    community: Community,
    glm_options: GlmOptions,
    client: Option<Arc<dyn HttpClient>>,
    state: AdapterState<GlmTable>,
}

#[bon]
impl Power {
    #[builder]
    pub fn new(
        location: LonLat,
        date_range: DateRange,
        parameters: Option<Vec<String>>,
        #[builder(default)] time_standard: TimeStandard,
        #[builder(default)] community: Community,
        #[builder(default)] glm_options: GlmOptions,
        client: Option<Arc<dyn HttpClient>>,
    ) -> Self {
        Self {
            location,
            date_range,
            parameters: parameters
                .unwrap_or_else(|| HOURLY_GLM_DEFAULT.iter().map(|p| p.to_string()).collect()),
            time_standard,
            community,
            glm_options,
            client,
            state: AdapterState::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.location.validate()?;
        self.date_range
            .validate_within(PROVIDER, ymd(2001, 1, 1), Utc::now().date_naive())?;
        validate_parameters(PROVIDER, &self.parameters)
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn state(&self) -> &AdapterState<GlmTable> {
        &self.state
    }

    pub fn glm(&self) -> Option<&GlmTable> {
        self.state.glm()
    }

    fn query(&self) -> Vec<(String, String)> {
        vec![
            ("parameters".to_string(), self.parameters.join(",")),
            ("community".to_string(), self.community.as_str().to_string()),
            ("longitude".to_string(), self.location.longitude().to_string()),
            ("latitude".to_string(), self.location.latitude().to_string()),
            ("start".to_string(), self.date_range.compact_start()),
            ("end".to_string(), self.date_range.compact_end()),
            ("format".to_string(), "JSON".to_string()),
            (
                "time-standard".to_string(),
                self.time_standard.as_str().to_string(),
            ),
        ]
    }

    fn to_glm(&self, met: &MetData) -> Result<GlmTable, ConversionError> {
        let df = &met.data;
        let mut fields = resolve_fields(df, PROVIDER, &GLM_FIELDS, |code| code.to_string())?;
        if self.glm_options.optional_columns {
            fields.extend(resolve_optional_fields(df, &OPTIONAL_FIELDS, |code| {
                code.to_string()
            }));
        }

        let time = reformat_time(df, PROVIDER, COL_TIME, TimeLayout::CompactHour)?;
        let (exprs, sources) = field_exprs(&fields, 1.0, self.glm_options.rain_units, |field| {
            parameter_unit(met, field.variable)
                .unwrap_or_else(|| native_unit(field.quantity))
                .to_string()
        })?;
        let mut data = assemble(df, time, exprs)?;

        let lifted_wind = fields
            .iter()
            .any(|f| f.glm == COL_WIND_SPEED && f.variable == "WS2M");
        if lifted_wind {
            data = data
                .lazy()
                .with_column((col(COL_WIND_SPEED) * lit(ws2m_to_ws10m_factor())).alias(COL_WIND_SPEED))
                .collect()?;
        }

        let mut metadata = glm_metadata(
            PROVIDER,
            &data,
            Resolution::Hourly,
            self.glm_options.rain_units,
            sources,
        );
        metadata.insert(
            "time_standard".to_string(),
            json!(self.time_standard.as_str()),
        );
        metadata.insert("community".to_string(), json!(self.community.as_str()));
        let estimated: Vec<&str> = if lifted_wind {
            metadata.insert(
                "wind_height_adjustment".to_string(),
                json!("WS2M lifted to 10 m with the FAO-56 logarithmic wind profile"),
            );
            vec![COL_WIND_SPEED]
        } else {
            Vec::new()
        };
        metadata.insert("estimated_fields".to_string(), json!(estimated));
        Ok(GlmTable { data, metadata })
    }
}

/// Units POWER reports under `parameters.<code>.units`.
fn parameter_unit<'a>(met: &'a MetData, code: &str) -> Option<&'a str> {
    met.metadata
        .get("parameters")?
        .get(code)?
        .get("units")?
        .as_str()
}

fn native_unit(quantity: Quantity) -> &'static str {
    match quantity {
        Quantity::Shortwave => "Wh/m^2",
        Quantity::CloudCover | Quantity::Humidity => "%",
        Quantity::Temperature => "C",
        Quantity::WindSpeed => "m/s",
        Quantity::Precipitation => "mm/hour",
        Quantity::WindDirection => "Degrees",
        Quantity::VapourPressure => "kPa",
    }
}

/// Pivots `properties.parameter`, a map of code to `{ "YYYYMMDDHH": value }`, into
/// one row per timestamp key. Keys are the sorted union over all parameters.
pub(crate) fn parse_response(request: &HttpRequest, body: &str) -> Result<MetData, ProviderError> {
    let url = request.display_url();
    let malformed = |message: &str| ProviderError::MalformedBody {
        url: url.clone(),
        message: message.to_string(),
    };

    let mut root: Map<String, Value> =
        serde_json::from_str(body).map_err(|e| ProviderError::JsonParse {
            url: url.clone(),
            source: e,
        })?;

    let fill_value = root
        .get("header")
        .and_then(|h| h.get("fill_value"))
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_FILL_VALUE);

    let data = {
        let parameter = root
            .get("properties")
            .and_then(|p| p.get("parameter"))
            .and_then(Value::as_object)
            .ok_or_else(|| malformed("no 'properties.parameter' object in response"))?;

        let mut keys = BTreeSet::new();
        for series in parameter.values() {
            let series = series
                .as_object()
                .ok_or_else(|| malformed("parameter values are not keyed by timestamp"))?;
            keys.extend(series.keys().map(String::as_str));
        }

        let mut replaced = 0usize;
        let mut columns = Vec::with_capacity(parameter.len() + 1);
        columns.push(Column::new(
            COL_TIME.into(),
            keys.iter().copied().collect::<Vec<&str>>(),
        ));
        for (code, series) in parameter {
            let mut values = Vec::with_capacity(keys.len());
            for key in &keys {
                let value = match series.get(*key) {
                    None | Some(Value::Null) => None,
                    Some(Value::Number(n)) => n.as_f64(),
                    Some(_) => return Err(malformed(&format!("'{}' holds a non-numeric value", code))),
                };
                let value = value.filter(|v| {
                    let is_fill = (v - fill_value).abs() < 1e-9;
                    replaced += is_fill as usize;
                    !is_fill
                });
                values.push(value);
            }
            columns.push(Column::new(code.as_str().into(), values));
        }
        debug!(
            "Pivoted {} parameters over {} timestamps from {}, {} fill values ({}) set to null",
            parameter.len(),
            keys.len(),
            url,
            replaced,
            fill_value
        );

        DataFrame::new(columns).map_err(|e| ProviderError::TableBuild {
            url: url.clone(),
            source: e,
        })?
    };

    let mut metadata = Map::new();
    for key in METADATA_KEYS {
        if let Some(value) = root.remove(key) {
            metadata.insert(key.to_string(), value);
        }
    }
    Ok(MetData::new(metadata, data))
}

impl GlmMet for Power {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn fetch(&mut self, settings: Option<&RequestSettings>) -> Result<(), GlmMetError> {
        self.validate()?;
        let request = build_request(POWER_API_URL, self.query(), settings);
        let response = send(self.client.as_ref(), &request)?;
        let met_data = parse_response(&request, &response.body)?;
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
