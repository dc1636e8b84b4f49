use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ephemeris::{BodyId, PositionSource};
use crate::error::GeometryError;
use crate::geo::GeodeticPosition;
use crate::observer::observe;

/// 20 halvings of a 180 degree interval refine the latitude to about
/// 1.7e-4 degrees.
const LATITUDE_SEARCH_ITERATIONS: u32 = 20;

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct TerminatorPoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// Day/night boundary at one instant: one latitude sample per longitude
/// step, longitudes strictly increasing by a fixed step across [-180, 180).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TerminatorPolyline {
    pub instant: DateTime<Utc>,
    pub points: Vec<TerminatorPoint>,
}

/// Trace the solar terminator for map rendering.
///
/// For each longitude the latitude where solar elevation crosses zero is
/// found by bisection with a fixed iteration count; solar elevation is
/// monotonic in latitude for a fixed longitude away from the poles. Which
/// hemisphere holds the day side flips with the solar declination, so the
/// bisection is oriented per longitude by probing the south end of the
/// interval. At longitudes where the sun never rises or never sets the
/// search converges to a boundary of the search interval, so callers must
/// not assume every point is a true crossing.
pub fn trace_terminator(
    source: &dyn PositionSource,
    instant: DateTime<Utc>,
    num_points: usize,
) -> Result<TerminatorPolyline, GeometryError> {
    let sampler = source.snapshot(BodyId::Sun)?;
    // One solar position serves every probe; rotate it to ECEF once.
    let sun = sampler.position_at(instant)?.to_ecef();

    let step = 360.0 / num_points.max(1) as f64;
    let mut points = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let longitude_deg = -180.0 + i as f64 * step;
        let mut lat_min = -90.0;
        let mut lat_max = 90.0;

        let south = GeodeticPosition::new(lat_min, longitude_deg, 0.0)?;
        let day_at_south = observe(&south, &sun).elevation_deg > 0.0;

        for _ in 0..LATITUDE_SEARCH_ITERATIONS {
            let lat = (lat_min + lat_max) / 2.0;
            let probe = GeodeticPosition::new(lat, longitude_deg, 0.0)?;
            // A sample matching the south end has not crossed yet.
            if (observe(&probe, &sun).elevation_deg > 0.0) == day_at_south {
                lat_min = lat;
            } else {
                lat_max = lat;
            }
        }

        points.push(TerminatorPoint {
            latitude_deg: (lat_min + lat_max) / 2.0,
            longitude_deg,
        });
    }

    Ok(TerminatorPolyline { instant, points })
}
