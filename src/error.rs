use thiserror::Error;

use crate::ephemeris::EphemerisError;
use crate::geo::GeoError;

/// Failure of one geometry computation. Empty results (no passes in a
/// window) are not errors; non-convergence is, since it means a bracketing
/// assumption was violated rather than that nothing happened.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error("{context} did not converge after {iterations} iterations")]
    NonConvergence {
        context: &'static str,
        iterations: u32,
    },
}
