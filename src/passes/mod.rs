mod detector;
mod types;

pub use detector::{
    coarse_step_for, find_passes, SATELLITE_COARSE_STEP_SECONDS, SKY_BODY_COARSE_STEP_SECONDS,
};
pub use types::{Pass, PassEvent, PassEventKind};
