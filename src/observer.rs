use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ephemeris::BodyPositionSample;
use crate::geo::{geodetic_to_ecef, GeodeticPosition};

/// Below this separation the observer and body are treated as coincident.
const COINCIDENT_RANGE_KM: f64 = 1e-6;

/// What an observer sees of a body at one instant.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct TopocentricFix {
    /// Degrees clockwise from north, [0, 360).
    pub azimuth_deg: f64,
    /// Degrees above the local horizon, [-90, 90].
    pub elevation_deg: f64,
    pub range_km: f64,
    pub instant: DateTime<Utc>,
}

impl TopocentricFix {
    pub fn visible_above(&self, min_elevation_deg: f64) -> bool {
        self.elevation_deg > min_elevation_deg
    }
}

/// Project a body position onto an observer's local horizon.
///
/// Inertial samples are rotated into the Earth-fixed frame at the sample
/// instant, so the caller can never mix frames. An observer coincident with
/// the body gets elevation +90 and an arbitrary azimuth of 0 instead of a
/// division by zero.
pub fn observe(observer: &GeodeticPosition, sample: &BodyPositionSample) -> TopocentricFix {
    let body = sample.to_ecef().vector;
    let site = geodetic_to_ecef(observer);
    let dr = [body.x - site.x, body.y - site.y, body.z - site.z];
    let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

    if range_km < COINCIDENT_RANGE_KM {
        return TopocentricFix {
            azimuth_deg: 0.0,
            elevation_deg: 90.0,
            range_km: 0.0,
            instant: sample.instant,
        };
    }

    let (east, north, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
    TopocentricFix {
        azimuth_deg: east.atan2(north).to_degrees().rem_euclid(360.0),
        elevation_deg: (up / range_km).clamp(-1.0, 1.0).asin().to_degrees(),
        range_km,
        instant: sample.instant,
    }
}

/// Project an ECEF line-of-sight vector onto local east/north/up axes.
fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}
