//! Daily SILO station data for Cairns, also spread flat over the hours of
//! each day. SILO asks for an email address as username: set `SILO_USERNAME`.

use glm_met::{DateRange, GlmMet, GlmMetError, GlmOptions, Silo, SiloOutput, SiloSite};
use std::env;
use std::path::Path;

fn main() -> Result<(), GlmMetError> {
    let username = env::var("SILO_USERNAME").unwrap_or_default();
    let range = DateRange::parse("20220101", "20220331")?;

    for output in [SiloOutput::Daily, SiloOutput::HourlyFlat] {
        let mut adapter = Silo::builder()
            .site(SiloSite::Station(31011))
            .date_range(range)
            .username(username.clone())
            .output(output)
            .glm_options(GlmOptions::default().with_optional_columns(true))
            .build();

        adapter.fetch(None)?;
        adapter.convert_to_glm_format()?;
        if let Some(glm) = adapter.glm() {
            println!("{:?}: {} rows", output, glm.data.height());
        }

        let file_name = match output {
            SiloOutput::Daily => "cairns_daily.csv",
            SiloOutput::HourlyFlat => "cairns_hourly.csv",
        };
        adapter.write_glm_format(Path::new("."), file_name, false)?;
    }
    Ok(())
}
