//! Unit transforms and metadata shared by every provider's GLM conversion.

use crate::convert::error::ConversionError;
use crate::convert::fields::ResolvedField;
use crate::types::glm_table::{glm_unit, RainUnits, COL_RAIN, COL_TIME};
use crate::types::resolution::Resolution;
use polars::prelude::*;
use serde_json::{json, Map, Value};

/// Builds one expression per resolved field producing the GLM column in GLM units.
///
/// `unit_of` names the unit the provider reported for a field. `hours` is the
/// length of one row. Also returns a `sources` map recording which provider
/// column and unit fed each GLM column.
pub(crate) fn field_exprs<U>(
    fields: &[ResolvedField],
    hours: f64,
    rain_units: RainUnits,
    unit_of: U,
) -> Result<(Vec<Expr>, Map<String, Value>), ConversionError>
where
    U: Fn(&ResolvedField) -> String,
{
    let mut exprs = Vec::with_capacity(fields.len());
    let mut sources = Map::new();
    for field in fields {
        let unit = unit_of(field);
        let mut transform = field.quantity.transform(&field.column, &unit, hours)?;
        if field.glm == COL_RAIN {
            transform = transform.then_scale(rain_units.factor_from_mm(hours));
        }
        exprs.push(transform.expr(&field.column, field.glm));
        sources.insert(
            field.glm.to_string(),
            json!({ "column": field.column, "unit": unit }),
        );
    }
    Ok((exprs, sources))
}

/// Metadata stored alongside a GLM table.
pub(crate) fn glm_metadata(
    provider: &str,
    glm: &DataFrame,
    resolution: Resolution,
    rain_units: RainUnits,
    sources: Map<String, Value>,
) -> Map<String, Value> {
    let units: Map<String, Value> = glm
        .get_column_names_str()
        .into_iter()
        .filter(|name| *name != COL_TIME)
        .map(|name| (name.to_string(), json!(glm_unit(name, rain_units))))
        .collect();

    let mut metadata = Map::new();
    metadata.insert("provider".to_string(), json!(provider));
    metadata.insert("resolution".to_string(), json!(resolution.to_string()));
    metadata.insert("rows".to_string(), json!(glm.height()));
    metadata.insert("time_format".to_string(), json!("YYYY-MM-DD HH:MM"));
    metadata.insert("units".to_string(), Value::Object(units));
    metadata.insert("sources".to_string(), Value::Object(sources));
    metadata
}
