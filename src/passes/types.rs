use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PassEventKind {
    Rise,
    Culminate,
    Set,
}

/// A refined threshold crossing or culmination instant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PassEvent {
    pub kind: PassEventKind,
    pub instant: DateTime<Utc>,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
}

/// One pass of a body above the elevation threshold.
///
/// `rise.instant < culminate.instant < set.instant` always holds when a
/// culmination is present. A clipped flag means the window boundary cut the
/// pass off on that side and the event carries the boundary instant instead
/// of a true crossing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pass {
    pub rise: PassEvent,
    /// Absent for passes too brief to bracket a maximum.
    pub culminate: Option<PassEvent>,
    pub set: PassEvent,
    pub max_elevation_deg: f64,
    pub duration_seconds: i64,
    pub rise_clipped: bool,
    pub set_clipped: bool,
}

impl Pass {
    /// True when either end of the pass was cut off by the search window.
    pub fn is_partial(&self) -> bool {
        self.rise_clipped || self.set_clipped
    }
}
