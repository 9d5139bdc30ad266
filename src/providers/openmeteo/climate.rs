//! Downscaled climate projections from the Open-Meteo climate API.

use crate::convert::error::ConversionError;
use crate::error::GlmMetError;
use crate::glm_met::GlmMet;
use crate::persist::error::PersistError;
use crate::persist::writer::{suffixed_file_name, write_glm, write_raw};
use crate::providers::openmeteo::glm::to_glm;
use crate::providers::openmeteo::parse::parse_response;
use crate::providers::openmeteo::settings::{
    climate_vocabulary, validate_variables, ClimateModel, CLIMATE_API_URL, CLIMATE_GLM_DEFAULT,
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
use polars::prelude::DataFrame;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::sync::Arc;

const PROVIDER: &str = "Open-Meteo Climate";

/// One GLM table per climate model.
pub type ModelTables = Vec<(ClimateModel, GlmTable)>;

/// Daily projections from one or more high resolution climate models.
///
/// The API returns one column per variable and model, named
/// `<variable>_<model>`. Conversion yields a separate GLM table per model, and
/// fails if any model lacks a field GLM needs.
///
/// # Examples
///
/// ```
/// use glm_met::{ClimateChange, ClimateModel, DateRange, LonLat};
///
/// let adapter = ClimateChange::builder()
///     .location(LonLat(116.691155, -34.225812))
///     .date_range(DateRange::parse("2030-01-01", "2030-12-31").unwrap())
///     .models(vec![ClimateModel::EcEarth3pHr, ClimateModel::MriAgcm32S])
///     .build();
/// assert_eq!(adapter.models().len(), 2);
/// assert!(adapter.validate().is_ok());
/// ```
pub struct ClimateChange {
    location: LonLat,
    date_range: DateRange,
    variables: Vec<String>,
    models: Vec<ClimateModel>,
    glm_options: GlmOptions,
    client: Option<Arc<dyn HttpClient>>,
    state: AdapterState<ModelTables>,
}

#[bon]
impl ClimateChange {
    #[builder]
    pub fn new(
        location: LonLat,
        date_range: DateRange,
        variables: Option<Vec<String>>,
        models: Option<Vec<ClimateModel>>,
        #[builder(default)] glm_options: GlmOptions,
        client: Option<Arc<dyn HttpClient>>,
    ) -> Self {
        Self {
            location,
            date_range,
            variables: variables
                .unwrap_or_else(|| CLIMATE_GLM_DEFAULT.iter().map(|v| v.to_string()).collect()),
            models: models.unwrap_or_else(|| ClimateModel::ALL.to_vec()),
            glm_options,
            client,
            state: AdapterState::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.location.validate()?;
        self.date_range
            .validate_within(PROVIDER, ymd(1950, 1, 1), ymd(2050, 12, 31))?;
        if self.models.is_empty() {
            return Err(ValidationError::NoClimateModels);
        }
        validate_variables(PROVIDER, &self.variables, climate_vocabulary())
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn models(&self) -> &[ClimateModel] {
        &self.models
    }

    pub fn state(&self) -> &AdapterState<ModelTables> {
        &self.state
    }

    /// Converted tables in the order the models were requested.
    pub fn glm(&self) -> Option<&ModelTables> {
        self.state.glm()
    }

    /// Converted table of a single model.
    pub fn glm_for(&self, model: ClimateModel) -> Option<&GlmTable> {
        self.glm()?
            .iter()
            .find(|(m, _)| *m == model)
            .map(|(_, table)| table)
    }

    fn query(&self) -> Vec<(String, String)> {
        let models: Vec<&str> = self.models.iter().map(ClimateModel::as_str).collect();
        vec![
            ("longitude".to_string(), self.location.longitude().to_string()),
            ("latitude".to_string(), self.location.latitude().to_string()),
            ("start_date".to_string(), self.date_range.iso_start()),
            ("end_date".to_string(), self.date_range.iso_end()),
            ("daily".to_string(), self.variables.join(",")),
            ("models".to_string(), models.join(",")),
            ("wind_speed_unit".to_string(), "ms".to_string()),
        ]
    }

    /// Column holding `variable` for `model`. A single-model response may use
    /// the bare variable name.
    fn column_for(&self, data: &DataFrame, variable: &str, model: ClimateModel) -> String {
        let suffixed = format!("{}_{}", variable, model.as_str());
        if self.models.len() == 1 && data.column(&suffixed).is_err() {
            variable.to_string()
        } else {
            suffixed
        }
    }
}

impl GlmMet for ClimateChange {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn fetch(&mut self, settings: Option<&RequestSettings>) -> Result<(), GlmMetError> {
        self.validate()?;
        let request = build_request(CLIMATE_API_URL, self.query(), settings);
        let response = send(self.client.as_ref(), &request)?;
        let met_data = parse_response(&request, &response.body, Resolution::Daily, self.location)?;
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

        let mut tables = Vec::with_capacity(self.models.len());
        let mut missing = Vec::new();
        for &model in &self.models {
            let converted = to_glm(
                met_data,
                PROVIDER,
                Resolution::Daily,
                &self.glm_options,
                |variable| self.column_for(&met_data.data, variable, model),
            );
            match converted {
                Ok(mut table) => {
                    table
                        .metadata
                        .insert("model".to_string(), json!(model.as_str()));
                    tables.push((model, table));
                }
                Err(ConversionError::MissingFields { fields, .. }) => missing.extend(fields),
                Err(e) => return Err(e.into()),
            }
        }
        if !missing.is_empty() {
            return Err(ConversionError::MissingFields {
                provider: PROVIDER,
                fields: missing,
            }
            .into());
        }

        self.state.set_converted(tables);
        Ok(())
    }

    /// Writes one CSV per model, named `<stem>_<model>.<ext>`.
    fn write_glm_format(
        &self,
        dir: &Path,
        file_name: &str,
        compress: bool,
    ) -> Result<(), GlmMetError> {
        let tables = self.state.glm().ok_or(PersistError::NotConverted)?;

        let mut entries = Vec::with_capacity(tables.len());
        let mut per_model = Map::new();
        for (model, table) in tables {
            entries.push((suffixed_file_name(file_name, model.as_str())?, &table.data));
            per_model.insert(model.as_str().to_string(), Value::Object(table.metadata.clone()));
        }
        let mut metadata = Map::new();
        metadata.insert("provider".to_string(), json!(PROVIDER));
        metadata.insert("models".to_string(), Value::Object(per_model));

        write_glm(dir, file_name, compress, &entries, &metadata)?;
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
    use std::fs::File;
    use tempfile::tempdir;

    fn model_columns(models: &[ClimateModel], variables: &[&str]) -> Vec<String> {
        models
            .iter()
            .flat_map(|m| variables.iter().map(move |v| format!("{}_{}", v, m.as_str())))
            .collect()
    }

    fn adapter(models: Vec<ClimateModel>, body: String) -> (ClimateChange, Arc<FixtureClient>) {
        let client = Arc::new(FixtureClient::ok(body));
        let adapter = ClimateChange::builder()
            .location(LonLat(116.691155, -34.225812))
            .date_range(DateRange::parse("2030-01-01", "2030-01-10").unwrap())
            .models(models)
            .client(client.clone())
            .build();
        (adapter, client)
    }

    fn range() -> DateRange {
        DateRange::parse("2030-01-01", "2030-01-10").unwrap()
    }

    #[test]
    fn test_two_models() -> Result<(), GlmMetError> {
        let models = vec![ClimateModel::EcEarth3pHr, ClimateModel::MriAgcm32S];
        let columns = model_columns(&models, &CLIMATE_GLM_DEFAULT);
        let names: Vec<&str> = columns.iter().map(String::as_str).collect();
        let (mut climate, client) = adapter(models, open_meteo_body(&range(), false, &names));

        climate.fetch(None)?;
        assert_eq!(
            client.last_query("models").as_deref(),
            Some("EC_Earth3P_HR,MRI_AGCM3_2_S")
        );
        climate.convert_to_glm_format()?;

        let tables = climate.glm().ok_or(ConversionError::NotFetched)?;
        assert_eq!(tables.len(), 2);
        for (model, table) in tables {
            assert_eq!(table.data.height(), 10);
            assert_eq!(table.metadata["model"], json!(model.as_str()));
        }

        let mri = climate
            .glm_for(ClimateModel::MriAgcm32S)
            .ok_or(ConversionError::NotFetched)?;
        let cloud = float_values(&mri.data, "Cloud")?[3].unwrap_or_default();
        let expected = fixture_value("cloudcover_mean_MRI_AGCM3_2_S", 3) / 100.0;
        assert!((cloud - expected).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_missing_fields_prefixed_with_model() -> Result<(), GlmMetError> {
        let models = vec![ClimateModel::CmccCm2Vhr4, ClimateModel::EcEarth3pHr];
        let without_cloud: Vec<&str> = CLIMATE_GLM_DEFAULT
            .iter()
            .copied()
            .filter(|v| *v != "cloudcover_mean")
            .collect();
        let mut columns = model_columns(&models[..1], &CLIMATE_GLM_DEFAULT);
        columns.extend(model_columns(&models[1..], &without_cloud));
        let names: Vec<&str> = columns.iter().map(String::as_str).collect();
        let (mut climate, _) = adapter(models, open_meteo_body(&range(), false, &names));
        climate.fetch(None)?;

        match climate.convert_to_glm_format() {
            Err(GlmMetError::Conversion(ConversionError::MissingFields { fields, .. })) => {
                assert_eq!(fields, vec!["cloudcover_mean_EC_Earth3P_HR (Cloud)"]);
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
        assert!(climate.glm().is_none());
        Ok(())
    }

    #[test]
    fn test_single_model_plain_columns() -> Result<(), GlmMetError> {
        let (mut climate, _) = adapter(
            vec![ClimateModel::Nicam168s],
            open_meteo_body(&range(), false, &CLIMATE_GLM_DEFAULT),
        );
        climate.fetch(None)?;
        climate.convert_to_glm_format()?;
        assert_eq!(
            climate
                .glm_for(ClimateModel::Nicam168s)
                .map(|t| t.data.height()),
            Some(10)
        );
        Ok(())
    }

    #[test]
    fn test_validation() {
        let (mut empty, _) = adapter(Vec::new(), String::new());
        assert!(matches!(
            empty.fetch(None),
            Err(GlmMetError::Validation(ValidationError::NoClimateModels))
        ));

        let mut late = ClimateChange::builder()
            .location(LonLat(116.691155, -34.225812))
            .date_range(DateRange::parse("2050-12-01", "2051-01-31").unwrap())
            .build();
        assert!(matches!(
            late.fetch(None),
            Err(GlmMetError::Validation(ValidationError::DateOutsideProviderRange { .. }))
        ));
    }

    #[test]
    fn test_zip_holds_one_csv_per_model() -> Result<(), Box<dyn std::error::Error>> {
        let models = vec![ClimateModel::HiramSitHr, ClimateModel::FgoalsF3H];
        let columns = model_columns(&models, &CLIMATE_GLM_DEFAULT);
        let names: Vec<&str> = columns.iter().map(String::as_str).collect();
        let (mut climate, _) = adapter(models, open_meteo_body(&range(), false, &names));
        climate.fetch(None)?;
        climate.convert_to_glm_format()?;

        let dir = tempdir()?;
        climate.write_glm_format(dir.path(), "met.csv", true)?;
        let archive = ::zip::ZipArchive::new(File::open(dir.path().join("met.zip"))?)?;
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec!["met_FGOALS_f3_H.csv", "met_HiRAM_SIT_HR.csv", "met_metadata.json"]
        );
        Ok(())
    }
}
