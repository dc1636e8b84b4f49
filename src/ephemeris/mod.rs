mod error;
pub mod moon;
mod satellite;
pub mod sun;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::geo::{eci_to_ecef, gmst_at, CartesianVector, Frame};

pub use error::EphemerisError;
pub use satellite::{SatelliteCatalog, SatelliteEntry, SatelliteInfo, SatelliteSampler};

/// Identifier of a body the engine can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyId {
    Sun,
    Moon,
    /// NORAD catalog number.
    Satellite(u32),
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyId::Sun => write!(f, "sun"),
            BodyId::Moon => write!(f, "moon"),
            BodyId::Satellite(norad_id) => write!(f, "satellite {norad_id}"),
        }
    }
}

/// A body position at one instant, tagged with its reference frame.
#[derive(Debug, Clone, Copy)]
pub struct BodyPositionSample {
    pub instant: DateTime<Utc>,
    pub vector: CartesianVector,
}

impl BodyPositionSample {
    /// The same sample rotated into the Earth-fixed frame, so repeated
    /// topocentric projections against it skip the sidereal rotation.
    pub fn to_ecef(&self) -> Self {
        match self.vector.frame {
            Frame::Ecef => *self,
            Frame::Eci => Self {
                instant: self.instant,
                vector: eci_to_ecef(&self.vector, gmst_at(self.instant)),
            },
        }
    }
}

/// Metadata of the orbital element set a sampler was built from, surfaced to
/// callers as a staleness indicator.
#[derive(Debug, Clone)]
pub struct ElementSetMeta {
    pub norad_id: u32,
    pub epoch: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    /// Older than the configured refresh horizon. Results computed from a
    /// stale set are still valid, just less accurate.
    pub stale: bool,
}

/// Time-parameterized position of one body, frozen for the lifetime of one
/// computation. A sampler never observes a concurrent element-set refresh.
pub trait BodySampler: Send {
    fn position_at(&self, instant: DateTime<Utc>) -> Result<BodyPositionSample, EphemerisError>;

    /// Element-set provenance for orbital bodies, `None` for sun/moon.
    fn element_set(&self) -> Option<&ElementSetMeta> {
        None
    }
}

/// Capability of resolving a body identifier to a position sampler.
pub trait PositionSource: Send + Sync {
    /// Acquire an immutable sampler for `body`. Call this once per
    /// computation and reuse the sampler for every sample inside it.
    fn snapshot(&self, body: BodyId) -> Result<Box<dyn BodySampler>, EphemerisError>;

    /// One-off position lookup.
    fn position_at(
        &self,
        body: BodyId,
        instant: DateTime<Utc>,
    ) -> Result<BodyPositionSample, EphemerisError> {
        self.snapshot(body)?.position_at(instant)
    }
}

/// Aggregate position source: analytic sun/moon plus the TLE catalog.
pub struct Ephemeris {
    catalog: Arc<SatelliteCatalog>,
}

impl Ephemeris {
    pub fn new(catalog: Arc<SatelliteCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SatelliteCatalog {
        &self.catalog
    }
}

impl PositionSource for Ephemeris {
    fn snapshot(&self, body: BodyId) -> Result<Box<dyn BodySampler>, EphemerisError> {
        match body {
            BodyId::Sun => Ok(Box::new(sun::SunSampler)),
            BodyId::Moon => Ok(Box::new(moon::MoonSampler)),
            BodyId::Satellite(norad_id) => Ok(Box::new(self.catalog.snapshot(norad_id)?)),
        }
    }
}
