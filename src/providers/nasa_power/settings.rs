//! NASA POWER hourly point API: endpoint, parameter codes and request options.

use crate::types::error::ValidationError;
use std::fmt;

pub const POWER_API_URL: &str = "https://power.larc.nasa.gov/api/temporal/hourly/point";

pub(crate) const DEFAULT_FILL_VALUE: f64 = -999.0;

pub(crate) const HOURLY_GLM_DEFAULT: [&str; 6] = [
    "ALLSKY_SFC_SW_DWN", // Wh/m^2
    "CLOUD_AMT",         // %
    "T2M",               // C
    "RH2M",              // %
    "WS10M",             // m/s
    "PRECTOTCORR",       // mm/hour
];

const HOURLY_PARAMETERS: &[&str] = &[
    "ALLSKY_SFC_SW_DWN",
    "ALLSKY_SFC_SW_DIFF",
    "ALLSKY_SFC_SW_DNI",
    "ALLSKY_SFC_LW_DWN",
    "ALLSKY_SFC_PAR_TOT",
    "ALLSKY_SFC_UV_INDEX",
    "ALLSKY_SFC_UVA",
    "ALLSKY_SFC_UVB",
    "ALLSKY_KT",
    "ALLSKY_SRF_ALB",
    "CLRSKY_SFC_SW_DWN",
    "CLRSKY_SFC_PAR_TOT",
    "CLRSKY_KT",
    "TOA_SW_DWN",
    "SZA",
    "CLOUD_AMT",
    "T2M",
    "T2MDEW",
    "T2MWET",
    "TS",
    "QV2M",
    "RH2M",
    "PRECTOTCORR",
    "PS",
    "WS2M",
    "WS10M",
    "WS50M",
    "WD2M",
    "WD10M",
    "WD50M",
    "U2M",
    "U10M",
    "U50M",
    "V2M",
    "V10M",
    "V50M",
    "PW",
    "GWETTOP",
    "GWETROOT",
    "GWETPROF",
    "SNODP",
    "FROST_DAYS",
    "EVPTRNS",
];

pub(crate) fn validate_parameters(
    provider: &'static str,
    parameters: &[String],
) -> Result<(), ValidationError> {
    if parameters.is_empty() {
        return Err(ValidationError::NoVariables { provider });
    }
    let unsupported: Vec<String> = parameters
        .iter()
        .filter(|p| !HOURLY_PARAMETERS.contains(&p.as_str()))
        .cloned()
        .collect();
    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedVariables {
            provider,
            variables: unsupported,
        })
    }
}

/// Clock the hourly timestamps are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeStandard {
    /// Local solar time.
    #[default]
    Lst,
    Utc,
}

impl TimeStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeStandard::Lst => "LST",
            TimeStandard::Utc => "UTC",
        }
    }
}

impl fmt::Display for TimeStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User community; decides the units POWER reports some parameters in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Community {
    /// Sustainable buildings.
    #[default]
    Sb,
    /// Agroclimatology.
    Ag,
    /// Renewable energy.
    Re,
}

impl Community {
    pub fn as_str(&self) -> &'static str {
        match self {
            Community::Sb => "SB",
            Community::Ag => "AG",
            Community::Re => "RE",
        }
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters() {
        let defaults: Vec<String> = HOURLY_GLM_DEFAULT.iter().map(|p| p.to_string()).collect();
        assert!(validate_parameters("NASA POWER", &defaults).is_ok());
        assert_eq!(
            validate_parameters("NASA POWER", &["T2M".to_string(), "t2m".to_string()]),
            Err(ValidationError::UnsupportedVariables {
                provider: "NASA POWER",
                variables: vec!["t2m".to_string()]
            })
        );
    }
}
