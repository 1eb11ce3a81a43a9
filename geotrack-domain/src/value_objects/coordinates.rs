// Coordinate value object

use crate::error::EventValidationError;
use crate::services::geo;

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Range check; NaN and infinities are rejected by the range comparison.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&self.latitude) {
            return Err(EventValidationError::LatitudeOutOfRange(self.latitude));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.longitude) {
            return Err(EventValidationError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    pub fn distance_km_to(&self, other: &Coordinates) -> f64 {
        geo::distance_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_range_bounds() {
        assert!(Coordinates::new(90.0, 180.0).validate().is_ok());
        assert!(Coordinates::new(-90.0, -180.0).validate().is_ok());
        assert!(Coordinates::new(0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_and_non_finite() {
        assert_eq!(
            Coordinates::new(90.5, 0.0).validate(),
            Err(EventValidationError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            Coordinates::new(0.0, -180.1).validate(),
            Err(EventValidationError::LongitudeOutOfRange(-180.1))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).validate().is_err());
    }
}
