use chrono::{DateTime, Utc};

use super::types::{CartesianVector, Frame, GeodeticPosition};

/// WGS-84 semi-major axis, km.
pub const WGS84_A_KM: f64 = 6378.137;
/// WGS-84 first eccentricity squared.
pub const WGS84_E2: f64 = 0.00669437999014;
/// Mean Earth radius for spherical great-circle math, km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Greenwich mean sidereal time at `instant`, radians.
pub fn gmst_at(instant: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&instant.naive_utc()))
}

pub fn geodetic_to_ecef(position: &GeodeticPosition) -> CartesianVector {
    let lat = position.lat_rad();
    let lon = position.lon_rad();
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt_km = position.altitude_m / 1000.0;
    CartesianVector::ecef(
        (n + alt_km) * cos_lat * lon.cos(),
        (n + alt_km) * cos_lat * lon.sin(),
        (n * (1.0 - WGS84_E2) + alt_km) * sin_lat,
    )
}

/// Inverse of `geodetic_to_ecef`, iterative on latitude. Converges to
/// millimeter level in a handful of rounds for any point near Earth.
pub fn ecef_to_geodetic(vector: &CartesianVector) -> GeodeticPosition {
    let (x, y, z) = (vector.x, vector.y, vector.z);
    let p = (x * x + y * y).sqrt();
    let lon = y.atan2(x);

    if p < 1e-9 {
        // On the polar axis the longitude is arbitrary.
        let b = WGS84_A_KM * (1.0 - WGS84_E2).sqrt();
        return GeodeticPosition {
            latitude_deg: if z >= 0.0 { 90.0 } else { -90.0 },
            longitude_deg: 0.0,
            altitude_m: (z.abs() - b) * 1000.0,
        };
    }

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    let mut n = WGS84_A_KM;
    for _ in 0..6 {
        let sin_lat = lat.sin();
        n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        lat = (z + WGS84_E2 * n * sin_lat).atan2(p);
    }
    let alt_km = p / lat.cos() - n;

    GeodeticPosition {
        latitude_deg: lat.to_degrees().clamp(-90.0, 90.0),
        longitude_deg: lon.to_degrees().clamp(-180.0, 180.0),
        altitude_m: alt_km * 1000.0,
    }
}

/// Rotate an inertial vector into the Earth-fixed frame.
pub fn eci_to_ecef(vector: &CartesianVector, gmst_rad: f64) -> CartesianVector {
    let cos_g = gmst_rad.cos();
    let sin_g = gmst_rad.sin();
    CartesianVector::ecef(
        vector.x * cos_g + vector.y * sin_g,
        -vector.x * sin_g + vector.y * cos_g,
        vector.z,
    )
}

/// Rotate an Earth-fixed vector into the inertial frame.
pub fn ecef_to_eci(vector: &CartesianVector, gmst_rad: f64) -> CartesianVector {
    let cos_g = gmst_rad.cos();
    let sin_g = gmst_rad.sin();
    CartesianVector {
        frame: Frame::Eci,
        x: vector.x * cos_g - vector.y * sin_g,
        y: vector.x * sin_g + vector.y * cos_g,
        z: vector.z,
    }
}

/// Great-circle distance (km) and initial bearing (degrees clockwise from
/// north) from `a` to `b` on the 6371 km sphere. Haversine distance, so
/// `great_circle(a, b).0 == great_circle(b, a).0` exactly. For `a == b` the
/// bearing is undefined and reported as 0.
pub fn great_circle(a: &GeodeticPosition, b: &GeodeticPosition) -> (f64, f64) {
    if a.latitude_deg == b.latitude_deg && a.longitude_deg == b.longitude_deg {
        return (0.0, 0.0);
    }

    let lat1 = a.lat_rad();
    let lat2 = b.lat_rad();
    let dlat = lat2 - lat1;
    let dlon = b.lon_rad() - a.lon_rad();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let distance = EARTH_RADIUS_KM * 2.0 * h.sqrt().min(1.0).asin();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let bearing = x.atan2(y).to_degrees().rem_euclid(360.0);

    (distance, bearing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(lat: f64, lon: f64, alt_m: f64) -> GeodeticPosition {
        GeodeticPosition::new(lat, lon, alt_m).unwrap()
    }

    #[test]
    fn ecef_round_trip() {
        let cases = [
            pos(0.0, 0.0, 0.0),
            pos(40.75, -73.0, 50.0),
            pos(-33.87, 151.21, 100.0),
            pos(78.22, 15.65, 0.0),
            pos(-89.9, 0.1, 2000.0),
        ];
        for original in cases {
            let back = ecef_to_geodetic(&geodetic_to_ecef(&original));
            assert!((back.latitude_deg - original.latitude_deg).abs() < 1e-7);
            assert!((back.longitude_deg - original.longitude_deg).abs() < 1e-7);
            assert!((back.altitude_m - original.altitude_m).abs() < 1e-2);
        }
    }

    #[test]
    fn ecef_magnitude_at_equator() {
        let v = geodetic_to_ecef(&pos(0.0, 0.0, 0.0));
        assert!((v.x - WGS84_A_KM).abs() < 1e-9);
        assert!(v.y.abs() < 1e-9 && v.z.abs() < 1e-9);
    }

    #[test]
    fn eci_ecef_rotation_round_trip() {
        let v = CartesianVector::eci(7000.0, -1234.5, 300.0);
        let gmst = 2.345;
        let back = ecef_to_eci(&eci_to_ecef(&v, gmst), gmst);
        assert_eq!(back.frame, Frame::Eci);
        assert!((back.x - v.x).abs() < 1e-9);
        assert!((back.y - v.y).abs() < 1e-9);
        assert!((back.z - v.z).abs() < 1e-9);
    }

    #[test]
    fn distance_is_commutative() {
        let a = pos(40.75, -73.0, 0.0);
        let b = pos(51.5, -0.12, 0.0);
        let (d_ab, _) = great_circle(&a, &b);
        let (d_ba, _) = great_circle(&b, &a);
        assert_eq!(d_ab, d_ba);
        // NYC to London is roughly 5570 km.
        assert!((d_ab - 5570.0).abs() < 30.0);
    }

    #[test]
    fn bearing_reciprocity() {
        let a = pos(40.75, -73.0, 0.0);
        let b = pos(48.85, 2.35, 0.0);
        let (_, brg_ab) = great_circle(&a, &b);
        let (_, brg_ba) = great_circle(&b, &a);
        let diff = (brg_ab - brg_ba).rem_euclid(360.0);
        assert!((diff - 180.0).abs() < 1e-6);
    }

    #[test]
    fn coincident_points_are_degenerate_not_failing() {
        let a = pos(12.3, 45.6, 0.0);
        assert_eq!(great_circle(&a, &a), (0.0, 0.0));
    }

    #[test]
    fn quarter_meridian_distance() {
        let equator = pos(0.0, 0.0, 0.0);
        let pole = pos(90.0, 0.0, 0.0);
        let (d, brg) = great_circle(&equator, &pole);
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::FRAC_PI_2).abs() < 1e-6);
        assert!(brg.abs() < 1e-9);
    }
}
