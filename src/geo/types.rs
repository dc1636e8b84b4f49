use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("latitude out of range [-90, 90]: {0}")]
    InvalidLatitude(f64),
    #[error("longitude out of range [-180, 180]: {0}")]
    InvalidLongitude(f64),
    #[error("altitude below -1000 m: {0}")]
    InvalidAltitude(f64),
}

/// A validated latitude/longitude/altitude triple in degrees and meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct GeodeticPosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl GeodeticPosition {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude_deg) || latitude_deg.is_nan() {
            return Err(GeoError::InvalidLatitude(latitude_deg));
        }
        if !(-180.0..=180.0).contains(&longitude_deg) || longitude_deg.is_nan() {
            return Err(GeoError::InvalidLongitude(longitude_deg));
        }
        if altitude_m < -1000.0 || altitude_m.is_nan() {
            return Err(GeoError::InvalidAltitude(altitude_m));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }
}

/// Cartesian reference frame tag. Vectors in different frames must not be
/// combined without going through a rotation first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Frame {
    /// Earth-centered Earth-fixed.
    Ecef,
    /// Earth-centered inertial (TEME-of-date for SGP4 output).
    Eci,
}

/// Frame-tagged Cartesian vector in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct CartesianVector {
    pub frame: Frame,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianVector {
    pub fn ecef(x: f64, y: f64, z: f64) -> Self {
        Self {
            frame: Frame::Ecef,
            x,
            y,
            z,
        }
    }

    pub fn eci(x: f64, y: f64, z: f64) -> Self {
        Self {
            frame: Frame::Eci,
            x,
            y,
            z,
        }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(GeodeticPosition::new(91.0, 0.0, 0.0).is_err());
        assert!(GeodeticPosition::new(-90.5, 0.0, 0.0).is_err());
        assert!(GeodeticPosition::new(0.0, 181.0, 0.0).is_err());
        assert!(GeodeticPosition::new(0.0, 0.0, -2000.0).is_err());
        assert!(GeodeticPosition::new(f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn accepts_boundary_coordinates() {
        assert!(GeodeticPosition::new(90.0, -180.0, -1000.0).is_ok());
        assert!(GeodeticPosition::new(-90.0, 180.0, 8848.0).is_ok());
    }
}
