mod transform;
mod types;

pub use transform::{
    ecef_to_geodetic, eci_to_ecef, geodetic_to_ecef, gmst_at, great_circle, EARTH_RADIUS_KM,
};
pub use types::{CartesianVector, Frame, GeoError, GeodeticPosition};
