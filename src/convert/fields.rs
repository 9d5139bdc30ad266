//! Mapping of provider columns onto GLM columns, with unit handling.

use crate::convert::error::ConversionError;
use polars::prelude::*;

/// Physical quantity of a GLM column; decides which units are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantity {
    Shortwave,
    CloudCover,
    Temperature,
    Humidity,
    WindSpeed,
    Precipitation,
    WindDirection,
    VapourPressure,
}

/// Linear rescaling `value * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Transform {
    pub scale: f64,
    pub offset: f64,
}

impl Transform {
    pub(crate) const IDENTITY: Transform = Transform {
        scale: 1.0,
        offset: 0.0,
    };

    pub(crate) fn scale(scale: f64) -> Self {
        Self { scale, offset: 0.0 }
    }

    pub(crate) fn then_scale(self, factor: f64) -> Self {
        Self {
            scale: self.scale * factor,
            offset: self.offset * factor,
        }
    }

    #[cfg(test)]
    pub(crate) fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    /// `source` cast to float, rescaled and renamed to `target`.
    pub(crate) fn expr(&self, source: &str, target: &str) -> Expr {
        let value = col(source).cast(DataType::Float64);
        let scaled = if self.scale == 1.0 {
            value
        } else {
            value * lit(self.scale)
        };
        let shifted = if self.offset == 0.0 {
            scaled
        } else {
            scaled + lit(self.offset)
        };
        shifted.alias(target)
    }
}

impl Quantity {
    /// Transform from `unit` into the GLM unit of this quantity. `hours` is the
    /// length of one timestep, used to turn accumulated energy into a mean flux.
    pub(crate) fn transform(
        &self,
        field: &str,
        unit: &str,
        hours: f64,
    ) -> Result<Transform, ConversionError> {
        let unit_trimmed = unit.trim();
        let transform = match (self, unit_trimmed) {
            (Quantity::Shortwave, "W/m²" | "W/m^2" | "W m-2" | "Wh/m²" | "Wh/m^2") => {
                Some(Transform::IDENTITY)
            }
            (Quantity::Shortwave, "MJ/m²" | "MJ/m^2" | "MJ m-2") => {
                Some(Transform::scale(1.0e6 / (hours * 3600.0)))
            }
            (Quantity::Shortwave, "kW-hr/m^2/day" | "kWh/m^2/day") => {
                Some(Transform::scale(1000.0 / 24.0))
            }
            (Quantity::CloudCover, "%") => Some(Transform::scale(0.01)),
            (Quantity::CloudCover, "" | "fraction" | "1") => Some(Transform::IDENTITY),
            (Quantity::Temperature, "°C" | "C" | "degC" | "Celsius") => Some(Transform::IDENTITY),
            (Quantity::Temperature, "°F" | "F" | "degF" | "Fahrenheit") => Some(Transform {
                scale: 5.0 / 9.0,
                offset: -32.0 * 5.0 / 9.0,
            }),
            (Quantity::Temperature, "K") => Some(Transform {
                scale: 1.0,
                offset: -273.15,
            }),
            (Quantity::Humidity, "%") => Some(Transform::IDENTITY),
            (Quantity::WindSpeed, "m/s" | "m s-1") => Some(Transform::IDENTITY),
            (Quantity::WindSpeed, "km/h") => Some(Transform::scale(1.0 / 3.6)),
            (Quantity::WindSpeed, "mp/h" | "mph") => Some(Transform::scale(0.44704)),
            (Quantity::WindSpeed, "kn" | "knots") => Some(Transform::scale(1852.0 / 3600.0)),
            (
                Quantity::Precipitation,
                "mm" | "mm/hour" | "mm/hr" | "mm/day" | "mm h-1" | "mm d-1",
            ) => Some(Transform::IDENTITY),
            (Quantity::Precipitation, "inch" | "in") => Some(Transform::scale(25.4)),
            (Quantity::WindDirection, "°" | "Degrees" | "degrees" | "deg") => {
                Some(Transform::IDENTITY)
            }
            (Quantity::VapourPressure, "hPa" | "mb" | "mbar") => Some(Transform::IDENTITY),
            (Quantity::VapourPressure, "kPa") => Some(Transform::scale(10.0)),
            _ => None,
        };
        transform.ok_or_else(|| ConversionError::UnsupportedUnit {
            field: field.to_string(),
            unit: unit.to_string(),
        })
    }
}

/// A GLM column and the provider columns that can feed it, in order of preference.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec {
    pub glm: &'static str,
    pub candidates: &'static [&'static str],
    pub quantity: Quantity,
}

/// A [`FieldSpec`] matched to a concrete column of the fetched table.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedField {
    pub glm: &'static str,
    pub variable: &'static str,
    pub column: String,
    pub quantity: Quantity,
}

/// Whether `df` has `name` with at least one non-null value.
pub(crate) fn has_values(df: &DataFrame, name: &str) -> bool {
    df.column(name)
        .map(|c| c.len() > 0 && c.null_count() < c.len())
        .unwrap_or(false)
}

/// Matches every spec to a column named by `column_name(candidate)`.
///
/// A candidate only counts when its column exists and holds data. All unmatched
/// specs are reported together, named by their first candidate.
pub(crate) fn resolve_fields<F>(
    df: &DataFrame,
    provider: &'static str,
    specs: &[FieldSpec],
    column_name: F,
) -> Result<Vec<ResolvedField>, ConversionError>
where
    F: Fn(&str) -> String,
{
    let (resolved, missing) = match_fields(df, specs, column_name);
    if !missing.is_empty() {
        return Err(ConversionError::MissingFields {
            provider,
            fields: missing,
        });
    }
    Ok(resolved)
}

/// Like [`resolve_fields`] but silently skips specs without data.
pub(crate) fn resolve_optional_fields<F>(
    df: &DataFrame,
    specs: &[FieldSpec],
    column_name: F,
) -> Vec<ResolvedField>
where
    F: Fn(&str) -> String,
{
    match_fields(df, specs, column_name).0
}

fn match_fields<F>(
    df: &DataFrame,
    specs: &[FieldSpec],
    column_name: F,
) -> (Vec<ResolvedField>, Vec<String>)
where
    F: Fn(&str) -> String,
{
    let mut resolved = Vec::with_capacity(specs.len());
    let mut missing = Vec::new();

    for spec in specs {
        let found = spec.candidates.iter().find_map(|candidate| {
            let column = column_name(candidate);
            has_values(df, &column).then_some((*candidate, column))
        });
        match found {
            Some((variable, column)) => resolved.push(ResolvedField {
                glm: spec.glm,
                variable,
                column,
                quantity: spec.quantity,
            }),
            None => missing.push(format!(
                "{} ({})",
                column_name(spec.candidates.first().copied().unwrap_or(spec.glm)),
                spec.glm
            )),
        }
    }
    (resolved, missing)
}

/// Reads a column as floats, casting integers and keeping nulls.
pub(crate) fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ConversionError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// Selects `exprs` from `df` and puts `time` in front.
pub(crate) fn assemble(
    df: &DataFrame,
    time: Column,
    exprs: Vec<Expr>,
) -> Result<DataFrame, ConversionError> {
    let mut glm = df.clone().lazy().select(exprs).collect()?;
    glm.insert_column(0, time)?;
    Ok(glm)
}
