//! GLM conversion shared by the Open-Meteo archive and climate adapters.

use crate::convert::error::ConversionError;
use crate::convert::fields::{assemble, resolve_fields, resolve_optional_fields, FieldSpec, Quantity};
use crate::convert::glm::{field_exprs, glm_metadata};
use crate::convert::timestamps::{reformat_time, TimeLayout};
use crate::types::glm_table::{
    GlmOptions, GlmTable, COL_AIR_TEMP, COL_CLOUD, COL_RAIN, COL_REL_HUM, COL_SHORTWAVE, COL_TIME,
    COL_WIND_DIR, COL_WIND_SPEED,
};
use crate::types::met_data::MetData;
use crate::types::resolution::Resolution;

const HOURLY_FIELDS: [FieldSpec; 6] = [
    FieldSpec {
        glm: COL_SHORTWAVE,
        candidates: &["shortwave_radiation"],
        quantity: Quantity::Shortwave,
    },
    FieldSpec {
        glm: COL_CLOUD,
        candidates: &["cloudcover", "cloud_cover"],
        quantity: Quantity::CloudCover,
    },
    FieldSpec {
        glm: COL_AIR_TEMP,
        candidates: &["temperature_2m"],
        quantity: Quantity::Temperature,
    },
    FieldSpec {
        glm: COL_REL_HUM,
        candidates: &["relativehumidity_2m", "relative_humidity_2m"],
        quantity: Quantity::Humidity,
    },
    FieldSpec {
        glm: COL_WIND_SPEED,
        candidates: &["windspeed_10m", "wind_speed_10m"],
        quantity: Quantity::WindSpeed,
    },
    FieldSpec {
        glm: COL_RAIN,
        candidates: &["precipitation"],
        quantity: Quantity::Precipitation,
    },
];

const DAILY_FIELDS: [FieldSpec; 6] = [
    FieldSpec {
        glm: COL_SHORTWAVE,
        candidates: &["shortwave_radiation_sum"],
        quantity: Quantity::Shortwave,
    },
    FieldSpec {
        glm: COL_CLOUD,
        candidates: &["cloudcover_mean", "cloud_cover_mean"],
        quantity: Quantity::CloudCover,
    },
    FieldSpec {
        glm: COL_AIR_TEMP,
        candidates: &["temperature_2m_mean"],
        quantity: Quantity::Temperature,
    },
    FieldSpec {
        glm: COL_REL_HUM,
        candidates: &["relative_humidity_2m_mean", "relativehumidity_2m_mean"],
        quantity: Quantity::Humidity,
    },
    FieldSpec {
        glm: COL_WIND_SPEED,
        candidates: &["windspeed_10m_mean", "wind_speed_10m_mean"],
        quantity: Quantity::WindSpeed,
    },
    FieldSpec {
        glm: COL_RAIN,
        candidates: &["precipitation_sum"],
        quantity: Quantity::Precipitation,
    },
];

const HOURLY_OPTIONAL: [FieldSpec; 1] = [FieldSpec {
    glm: COL_WIND_DIR,
    candidates: &["winddirection_10m", "wind_direction_10m"],
    quantity: Quantity::WindDirection,
}];

const DAILY_OPTIONAL: [FieldSpec; 1] = [FieldSpec {
    glm: COL_WIND_DIR,
    candidates: &["winddirection_10m_dominant", "wind_direction_10m_dominant"],
    quantity: Quantity::WindDirection,
}];

/// Metadata keys copied from the response into the GLM metadata.
const LOCATION_KEYS: [&str; 6] = [
    "latitude",
    "longitude",
    "elevation",
    "timezone",
    "utc_offset_seconds",
    "resolved_distance_km",
];

/// Unit assumed when a response carries no unit for a variable.
fn native_unit(quantity: Quantity, resolution: Resolution) -> &'static str {
    match quantity {
        Quantity::Shortwave => match resolution {
            Resolution::Hourly => "W/m²",
            Resolution::Daily => "MJ/m²",
        },
        Quantity::CloudCover | Quantity::Humidity => "%",
        Quantity::Temperature => "°C",
        Quantity::WindSpeed => "m/s",
        Quantity::Precipitation => "mm",
        Quantity::WindDirection => "°",
        Quantity::VapourPressure => "hPa",
    }
}

/// Converts Open-Meteo data to GLM, reading columns through `column_name` so the
/// climate adapter can pick one model's `<variable>_<model>` columns.
pub(crate) fn to_glm<F>(
    met: &MetData,
    provider: &'static str,
    resolution: Resolution,
    options: &GlmOptions,
    column_name: F,
) -> Result<GlmTable, ConversionError>
where
    F: Fn(&str) -> String,
{
    let (specs, optional): (&[FieldSpec], &[FieldSpec]) = match resolution {
        Resolution::Hourly => (&HOURLY_FIELDS, &HOURLY_OPTIONAL),
        Resolution::Daily => (&DAILY_FIELDS, &DAILY_OPTIONAL),
    };
    let df = &met.data;

    let mut fields = resolve_fields(df, provider, specs, &column_name)?;
    if options.optional_columns {
        fields.extend(resolve_optional_fields(df, optional, &column_name));
    }

    let layout = match resolution {
        Resolution::Hourly => TimeLayout::IsoMinute,
        Resolution::Daily => TimeLayout::IsoDate,
    };
    let time = reformat_time(df, provider, COL_TIME, layout)?;

    let units_key = resolution.units_key();
    let hours = 24.0 / resolution.steps_per_day() as f64;
    let (exprs, sources) = field_exprs(&fields, hours, options.rain_units, |field| {
        met.unit_of(units_key, &field.column)
            .or_else(|| met.unit_of(units_key, field.variable))
            .unwrap_or_else(|| native_unit(field.quantity, resolution))
            .to_string()
    })?;

    let data = assemble(df, time, exprs)?;
    let mut metadata = glm_metadata(provider, &data, resolution, options.rain_units, sources);
    for key in LOCATION_KEYS {
        if let Some(value) = met.metadata.get(key) {
            metadata.insert(key.to_string(), value.clone());
        }
    }
    Ok(GlmTable { data, metadata })
}
