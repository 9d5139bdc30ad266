//! Geographic coordinates as the providers expect them: longitude first.

use crate::types::error::ValidationError;
use haversine::{distance, Location as HaversineLocation, Units};
use std::fmt;

/// A point given as (longitude, latitude) in decimal degrees.
///
/// # Examples
///
/// ```
/// use glm_met::LonLat;
///
/// let lake = LonLat(116.691155, -34.225812);
/// assert_eq!(lake.longitude(), 116.691155);
/// assert_eq!(lake.latitude(), -34.225812);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat(pub f64, pub f64);

impl LonLat {
    pub fn longitude(&self) -> f64 {
        self.0
    }

    pub fn latitude(&self) -> f64 {
        self.1
    }

    /// Checks the point lies on the globe.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let valid = self.0.is_finite()
            && self.1.is_finite()
            && (-180.0..=180.0).contains(&self.0)
            && (-90.0..=90.0).contains(&self.1);
        if valid {
            Ok(())
        } else {
            Err(ValidationError::InvalidCoordinate {
                longitude: self.0,
                latitude: self.1,
            })
        }
    }

    /// Checks the point lies on the globe and inside a provider's bounding box.
    pub(crate) fn validate_within(
        &self,
        provider: &'static str,
        bounds: &CoverageBounds,
    ) -> Result<(), ValidationError> {
        self.validate()?;
        if bounds.contains(self) {
            Ok(())
        } else {
            Err(ValidationError::OutsideCoverage {
                provider,
                longitude: self.0,
                latitude: self.1,
            })
        }
    }

    /// Great-circle distance to another point in kilometres.
    pub fn distance_km(&self, other: &LonLat) -> f64 {
        distance(
            HaversineLocation {
                latitude: self.1,
                longitude: self.0,
            },
            HaversineLocation {
                latitude: other.1,
                longitude: other.0,
            },
            Units::Kilometers,
        )
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// Rectangular provider coverage, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CoverageBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl CoverageBounds {
    pub(crate) fn contains(&self, point: &LonLat) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.0)
            && (self.min_lat..=self.max_lat).contains(&point.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(LonLat(180.0, -90.0).validate().is_ok());
        assert!(LonLat(-180.0, 90.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_and_nan() {
        assert_eq!(
            LonLat(181.0, 0.0).validate(),
            Err(ValidationError::InvalidCoordinate {
                longitude: 181.0,
                latitude: 0.0
            })
        );
        assert!(LonLat(0.0, -90.5).validate().is_err());
        assert!(LonLat(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_validate_within_coverage() {
        let australia = CoverageBounds {
            min_lon: 112.0,
            max_lon: 154.0,
            min_lat: -44.0,
            max_lat: -10.0,
        };
        assert!(LonLat(116.6, -32.17)
            .validate_within("SILO", &australia)
            .is_ok());
        assert!(matches!(
            LonLat(4.9, 52.4).validate_within("SILO", &australia),
            Err(ValidationError::OutsideCoverage { provider: "SILO", .. })
        ));
    }

    #[test]
    fn test_distance_km() {
        let a = LonLat(116.691155, -34.225812);
        assert!(a.distance_km(&a).abs() < 1e-9);
        // One hundredth of a degree of latitude is a little over a kilometre.
        let b = LonLat(116.691155, -34.235812);
        let d = a.distance_km(&b);
        assert!(d > 1.0 && d < 1.2, "unexpected distance {}", d);
    }
}
