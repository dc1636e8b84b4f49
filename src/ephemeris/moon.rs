//! Truncated-series lunar ephemeris and phase.
//!
//! Keeps the dozen largest periodic terms of the lunar longitude, latitude
//! and distance series; position is good to a few tenths of a degree, which
//! is enough for az/el pointing, rise/set windows and phase display.

use chrono::{DateTime, Utc};

use super::sun;
use super::{BodyPositionSample, BodySampler, EphemerisError};
use crate::geo::CartesianVector;

/// Geocentric ecliptic coordinates of the Moon.
#[derive(Debug, Clone, Copy)]
pub struct MoonEcliptic {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub distance_km: f64,
}

pub fn moon_ecliptic(instant: DateTime<Utc>) -> MoonEcliptic {
    let t = sun::julian_centuries(instant);

    // Fundamental arguments, degrees.
    let lp = 218.316_447_7 + 481_267.881_234_21 * t; // mean longitude
    let d = (297.850_192_1 + 445_267.111_403_4 * t).to_radians(); // elongation
    let m = (357.529_109_2 + 35_999.050_290_9 * t).to_radians(); // sun anomaly
    let mp = (134.963_396_4 + 477_198.867_505_5 * t).to_radians(); // moon anomaly
    let f = (93.272_095_0 + 483_202.017_523_3 * t).to_radians(); // argument of latitude

    let longitude = lp
        + 6.288_774 * mp.sin()
        + 1.274_027 * (2.0 * d - mp).sin()
        + 0.658_314 * (2.0 * d).sin()
        + 0.213_618 * (2.0 * mp).sin()
        - 0.185_116 * m.sin()
        - 0.114_332 * (2.0 * f).sin()
        + 0.058_793 * (2.0 * d - 2.0 * mp).sin()
        + 0.057_066 * (2.0 * d - m - mp).sin()
        + 0.053_322 * (2.0 * d + mp).sin()
        + 0.045_758 * (2.0 * d - m).sin();

    let latitude = 5.128_122 * f.sin()
        + 0.280_602 * (mp + f).sin()
        + 0.277_693 * (mp - f).sin()
        + 0.173_237 * (2.0 * d - f).sin()
        + 0.055_413 * (2.0 * d - mp + f).sin()
        + 0.046_271 * (2.0 * d - mp - f).sin();

    let distance_km = 385_000.56 - 20_905.355 * mp.cos()
        - 3_699.111 * (2.0 * d - mp).cos()
        - 2_955.968 * (2.0 * d).cos()
        - 569.925 * (2.0 * mp).cos();

    MoonEcliptic {
        longitude_deg: longitude.rem_euclid(360.0),
        latitude_deg: latitude,
        distance_km,
    }
}

/// Geocentric inertial position of the Moon, km.
pub fn moon_position_eci(instant: DateTime<Utc>) -> CartesianVector {
    let ecl = moon_ecliptic(instant);
    let t = sun::julian_centuries(instant);
    let eps = sun::obliquity_deg(t).to_radians();
    let lon = ecl.longitude_deg.to_radians();
    let lat = ecl.latitude_deg.to_radians();
    let r = ecl.distance_km;

    // Ecliptic -> equatorial rotation about the x axis.
    let xe = r * lat.cos() * lon.cos();
    let ye = r * lat.cos() * lon.sin();
    let ze = r * lat.sin();
    CartesianVector::eci(
        xe,
        ye * eps.cos() - ze * eps.sin(),
        ye * eps.sin() + ze * eps.cos(),
    )
}

/// Lunar phase. The angle runs 0..360 with 0 = new, 90 = first quarter,
/// 180 = full, 270 = last quarter.
#[derive(Debug, Clone, Copy)]
pub struct MoonPhase {
    pub phase_angle_deg: f64,
    pub illumination_percent: f64,
}

pub fn moon_phase(instant: DateTime<Utc>) -> MoonPhase {
    let t = sun::julian_centuries(instant);
    let (sun_longitude, _) = sun::ecliptic_longitude(t);
    let moon_longitude = moon_ecliptic(instant).longitude_deg;
    let phase_angle_deg = (moon_longitude - sun_longitude).rem_euclid(360.0);
    let illumination_percent = (1.0 - phase_angle_deg.to_radians().cos()) / 2.0 * 100.0;
    MoonPhase {
        phase_angle_deg,
        illumination_percent,
    }
}

pub fn phase_name(phase_angle_deg: f64) -> &'static str {
    match phase_angle_deg.rem_euclid(360.0) {
        a if a < 22.5 || a > 337.5 => "New Moon",
        a if a < 67.5 => "Waxing Crescent",
        a if a < 112.5 => "First Quarter",
        a if a < 157.5 => "Waxing Gibbous",
        a if a < 202.5 => "Full Moon",
        a if a < 247.5 => "Waning Gibbous",
        a if a < 292.5 => "Last Quarter",
        _ => "Waning Crescent",
    }
}

pub struct MoonSampler;

impl BodySampler for MoonSampler {
    fn position_at(&self, instant: DateTime<Utc>) -> Result<BodyPositionSample, EphemerisError> {
        Ok(BodyPositionSample {
            instant,
            vector: moon_position_eci(instant),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn distance_within_orbital_bounds() {
        for day in [1, 8, 15, 22, 28] {
            let t = Utc.with_ymd_and_hms(2024, 5, day, 0, 0, 0).unwrap();
            let ecl = moon_ecliptic(t);
            assert!(
                ecl.distance_km > 356_000.0 && ecl.distance_km < 407_000.0,
                "distance {}",
                ecl.distance_km
            );
        }
    }

    #[test]
    fn latitude_stays_within_inclination() {
        for day in 1..=28 {
            let t = Utc.with_ymd_and_hms(2024, 7, day, 6, 0, 0).unwrap();
            let ecl = moon_ecliptic(t);
            assert!(ecl.latitude_deg.abs() < 6.0);
        }
    }

    #[test]
    fn full_moon_is_bright() {
        // 2024-04-23 23:49 UTC was a full moon.
        let t = Utc.with_ymd_and_hms(2024, 4, 23, 23, 49, 0).unwrap();
        let phase = moon_phase(t);
        assert!(phase.illumination_percent > 97.0);
        assert_eq!(phase_name(phase.phase_angle_deg), "Full Moon");
    }

    #[test]
    fn new_moon_is_dark() {
        // 2024-04-08 18:21 UTC was a new moon (the eclipse one).
        let t = Utc.with_ymd_and_hms(2024, 4, 8, 18, 21, 0).unwrap();
        let phase = moon_phase(t);
        assert!(phase.illumination_percent < 3.0);
        assert_eq!(phase_name(phase.phase_angle_deg), "New Moon");
    }

    #[test]
    fn phase_names_cover_the_circle() {
        assert_eq!(phase_name(0.0), "New Moon");
        assert_eq!(phase_name(90.0), "First Quarter");
        assert_eq!(phase_name(180.0), "Full Moon");
        assert_eq!(phase_name(270.0), "Last Quarter");
        assert_eq!(phase_name(315.0), "Waning Crescent");
    }
}
