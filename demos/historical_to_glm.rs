//! Fetches a month of hourly Open-Meteo archive data for Lake Kepwari and
//! writes both the raw response and the GLM table.

use glm_met::{DateRange, GlmMet, GlmMetError, Historical, LonLat};
use std::env;
use std::path::Path;

fn main() -> Result<(), GlmMetError> {
    configure_polars_display();

    let mut adapter = Historical::builder()
        .location(LonLat(116.691155, -34.225812))
        .date_range(DateRange::parse("2020-01-01", "2020-01-31")?)
        .build();

    adapter.fetch(None)?;
    adapter.write_raw(Path::new("."), "kepwari_raw.csv")?;

    adapter.convert_to_glm_format()?;
    if let Some(glm) = adapter.glm() {
        println!("{:#?}", glm.data.head(Some(5)));
        println!("{}", serde_json::Value::Object(glm.metadata.clone()));
    }
    adapter.write_glm_format(Path::new("."), "kepwari_met.csv", true)?;

    Ok(())
}

fn configure_polars_display() {
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
