//! Rewrites provider timestamps into GLM's `YYYY-MM-DD HH:MM`.

use crate::convert::error::ConversionError;
use crate::types::glm_table::{COL_TIME, GLM_TIME_FORMAT};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

/// How a provider writes its time column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeLayout {
    /// Open-Meteo hourly, `2020-01-01T00:00`.
    IsoMinute,
    /// Open-Meteo daily and SILO, `2020-01-01`.
    IsoDate,
    /// NASA POWER hourly keys, `2020010100`.
    CompactHour,
}

impl TimeLayout {
    fn expected(&self) -> &'static str {
        match self {
            TimeLayout::IsoMinute => "YYYY-MM-DDTHH:MM",
            TimeLayout::IsoDate => "YYYY-MM-DD",
            TimeLayout::CompactHour => "YYYYMMDDHH",
        }
    }

    pub(crate) fn parse(&self, value: &str) -> Result<NaiveDateTime, ConversionError> {
        let err = || ConversionError::TimestampParse {
            value: value.to_string(),
            expected: self.expected(),
        };
        match self {
            TimeLayout::IsoMinute => {
                NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").map_err(|_| err())
            }
            TimeLayout::IsoDate => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|date| date.and_time(NaiveTime::MIN))
                .map_err(|_| err()),
            TimeLayout::CompactHour => {
                if value.len() != 10 || !value.is_ascii() {
                    return Err(err());
                }
                let date = NaiveDate::parse_from_str(&value[..8], "%Y%m%d").map_err(|_| err())?;
                let hour: u32 = value[8..].parse().map_err(|_| err())?;
                date.and_hms_opt(hour, 0, 0).ok_or_else(err)
            }
        }
    }
}

/// Parses every value of `source` with `layout`.
pub(crate) fn parse_times(
    df: &DataFrame,
    provider: &'static str,
    source: &str,
    layout: TimeLayout,
) -> Result<Vec<NaiveDateTime>, ConversionError> {
    let column = df.column(source).map_err(|_| ConversionError::MissingFields {
        provider,
        fields: vec![source.to_string()],
    })?;
    let values = column
        .str()
        .map_err(|e| ConversionError::TimeColumnType {
            column: source.to_string(),
            source: e,
        })?;
    values
        .into_iter()
        .map(|value| match value {
            Some(v) => layout.parse(v),
            None => Err(ConversionError::TimestampParse {
                value: "null".to_string(),
                expected: layout.expected(),
            }),
        })
        .collect()
}

/// Builds the GLM `time` column from parsed timestamps.
pub(crate) fn glm_time_column(times: &[NaiveDateTime]) -> Column {
    let formatted: Vec<String> = times
        .iter()
        .map(|t| t.format(GLM_TIME_FORMAT).to_string())
        .collect();
    Column::new(COL_TIME.into(), formatted)
}

/// Reads `source` in `layout` and returns it as a GLM `time` column.
pub(crate) fn reformat_time(
    df: &DataFrame,
    provider: &'static str,
    source: &str,
    layout: TimeLayout,
) -> Result<Column, ConversionError> {
    Ok(glm_time_column(&parse_times(df, provider, source, layout)?))
}
