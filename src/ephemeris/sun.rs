//! Low-precision analytic solar ephemeris.
//!
//! Mean orbital elements with the equation of center, good to roughly 0.01°
//! over the current decades. Plenty for propagation dashboards, pass windows
//! and terminator rendering; not for survey or occultation work.

use chrono::{DateTime, Utc};

use super::{BodyPositionSample, BodySampler, EphemerisError};
use crate::geo::CartesianVector;

pub const AU_KM: f64 = 149_597_870.7;

/// Julian centuries since J2000.0.
pub(crate) fn julian_centuries(instant: DateTime<Utc>) -> f64 {
    let jd = instant.timestamp() as f64 / 86400.0 + instant.timestamp_subsec_micros() as f64
        / 86_400_000_000.0
        + 2_440_587.5;
    (jd - 2_451_545.0) / 36_525.0
}

/// Mean obliquity of the ecliptic, degrees.
pub(crate) fn obliquity_deg(t: f64) -> f64 {
    23.439_291_1 - 0.013_004_2 * t - 1.64e-7 * t * t
}

/// Geometric ecliptic longitude (degrees) and distance (AU) of the Sun.
pub(crate) fn ecliptic_longitude(t: f64) -> (f64, f64) {
    let l0 = 280.46646 + 36_000.76983 * t + 0.000_303_2 * t * t;
    let m = (357.52911 + 35_999.05029 * t - 0.000_153_7 * t * t).to_radians();
    let e = 0.016_708_634 - 0.000_042_037 * t - 0.000_000_126_7 * t * t;

    let c = (1.914_602 - 0.004_817 * t - 0.000_014 * t * t) * m.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * m).sin()
        + 0.000_289 * (3.0 * m).sin();

    let true_longitude = (l0 + c).rem_euclid(360.0);
    let true_anomaly = m + c.to_radians();
    let distance_au = 1.000_001_018 * (1.0 - e * e) / (1.0 + e * true_anomaly.cos());

    (true_longitude, distance_au)
}

/// Equatorial coordinates of the Sun.
#[derive(Debug, Clone, Copy)]
pub struct SunEquatorial {
    pub right_ascension_hours: f64,
    pub declination_deg: f64,
    pub distance_au: f64,
}

pub fn sun_equatorial(instant: DateTime<Utc>) -> SunEquatorial {
    let t = julian_centuries(instant);
    let (longitude, distance_au) = ecliptic_longitude(t);
    let lon = longitude.to_radians();
    let eps = obliquity_deg(t).to_radians();

    let ra = (eps.cos() * lon.sin()).atan2(lon.cos());
    let dec = (eps.sin() * lon.sin()).asin();

    SunEquatorial {
        right_ascension_hours: ra.to_degrees().rem_euclid(360.0) / 15.0,
        declination_deg: dec.to_degrees(),
        distance_au,
    }
}

/// Geocentric inertial position of the Sun, km.
pub fn sun_position_eci(instant: DateTime<Utc>) -> CartesianVector {
    let eq = sun_equatorial(instant);
    let ra = (eq.right_ascension_hours * 15.0).to_radians();
    let dec = eq.declination_deg.to_radians();
    let r = eq.distance_au * AU_KM;
    CartesianVector::eci(
        r * dec.cos() * ra.cos(),
        r * dec.cos() * ra.sin(),
        r * dec.sin(),
    )
}

pub struct SunSampler;

impl BodySampler for SunSampler {
    fn position_at(&self, instant: DateTime<Utc>) -> Result<BodyPositionSample, EphemerisError> {
        Ok(BodyPositionSample {
            instant,
            vector: sun_position_eci(instant),
        })
    }
}
