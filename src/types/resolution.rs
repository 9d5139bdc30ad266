//! Temporal resolution of a provider response.

use std::fmt;

/// Time step of the rows in a fetched table.
///
/// Open-Meteo's archive serves both; the climate API and SILO are daily only,
/// NASA POWER is queried hourly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    /// One row per hour.
    #[default]
    Hourly,
    /// One row per day.
    Daily,
}

impl Resolution {
    /// Key under which Open-Meteo nests the data arrays (`hourly` / `daily`).
    pub(crate) fn block_key(&self) -> &'static str {
        match self {
            Resolution::Hourly => "hourly",
            Resolution::Daily => "daily",
        }
    }

    /// Key of the per-variable unit mapping in Open-Meteo metadata.
    pub(crate) fn units_key(&self) -> &'static str {
        match self {
            Resolution::Hourly => "hourly_units",
            Resolution::Daily => "daily_units",
        }
    }

    pub fn steps_per_day(&self) -> usize {
        match self {
            Resolution::Hourly => 24,
            Resolution::Daily => 1,
        }
    }
}

/// Formats a `Resolution` as its Open-Meteo block key.
///
/// # Examples
///
/// ```
/// use glm_met::Resolution;
///
/// assert_eq!(Resolution::Hourly.to_string(), "hourly");
/// assert_eq!(format!("{}", Resolution::Daily), "daily");
/// ```
impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.block_key())
    }
}
