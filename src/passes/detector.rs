use chrono::{DateTime, Duration, Utc};

use super::types::{Pass, PassEvent, PassEventKind};
use crate::ephemeris::{BodyId, BodySampler};
use crate::error::GeometryError;
use crate::geo::GeodeticPosition;
use crate::observer::{observe, TopocentricFix};

/// Coarse scan step for low-orbit satellites; short enough that no pass of a
/// LEO bird fits between two samples.
pub const SATELLITE_COARSE_STEP_SECONDS: i64 = 30;
/// Coarse scan step for slow movers (sun, moon).
pub const SKY_BODY_COARSE_STEP_SECONDS: i64 = 180;

/// Crossing instants are refined to within this interval.
const REFINE_TOLERANCE_MS: i64 = 500;
const MAX_REFINE_ITERATIONS: u32 = 80;

pub fn coarse_step_for(body: BodyId) -> Duration {
    match body {
        BodyId::Satellite(_) => Duration::seconds(SATELLITE_COARSE_STEP_SECONDS),
        BodyId::Sun | BodyId::Moon => Duration::seconds(SKY_BODY_COARSE_STEP_SECONDS),
    }
}

struct OpenPass {
    rise: PassEvent,
    rise_clipped: bool,
    max_elevation_deg: f64,
}

/// Scan `[start, end]` for passes of the sampled body above
/// `min_elevation_deg`.
///
/// Threshold crossings found in the coarse scan are refined by bisection to
/// sub-second precision; the culmination is located by ternary search
/// between rise and set. Passes cut off by the window are returned with the
/// clipped side flagged; a body above the threshold for the whole window
/// yields exactly one pass clipped on both sides; a body that never crosses
/// yields an empty list.
pub fn find_passes(
    sampler: &dyn BodySampler,
    observer: &GeodeticPosition,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    min_elevation_deg: f64,
    coarse_step: Duration,
) -> Result<Vec<Pass>, GeometryError> {
    if end <= start {
        return Ok(Vec::new());
    }
    let step = if coarse_step > Duration::zero() {
        coarse_step
    } else {
        Duration::seconds(SATELLITE_COARSE_STEP_SECONDS)
    };

    let mut passes = Vec::new();
    let mut open: Option<OpenPass> = None;
    let mut prev: Option<TopocentricFix> = None;
    let mut cursor = start;

    loop {
        let fix = fix_at(sampler, observer, cursor)?;
        let above = fix.visible_above(min_elevation_deg);

        match (&mut open, above) {
            (Some(open_pass), true) => {
                if fix.elevation_deg > open_pass.max_elevation_deg {
                    open_pass.max_elevation_deg = fix.elevation_deg;
                }
            }
            (Some(_), false) => {
                if let Some(prev_fix) = prev {
                    let (instant, set_fix) = refine_crossing(
                        sampler,
                        observer,
                        prev_fix.instant,
                        cursor,
                        min_elevation_deg,
                        false,
                    )?;
                    let set = PassEvent {
                        kind: PassEventKind::Set,
                        instant,
                        elevation_deg: set_fix.elevation_deg,
                        azimuth_deg: set_fix.azimuth_deg,
                    };
                    // `open` is Some in this arm.
                    if let Some(open_pass) = open.take() {
                        passes.push(close_pass(sampler, observer, open_pass, set, false)?);
                    }
                }
            }
            (None, true) => {
                let (rise, rise_clipped) = if let Some(prev_fix) = prev {
                    let (instant, rise_fix) = refine_crossing(
                        sampler,
                        observer,
                        prev_fix.instant,
                        cursor,
                        min_elevation_deg,
                        true,
                    )?;
                    (
                        PassEvent {
                            kind: PassEventKind::Rise,
                            instant,
                            elevation_deg: rise_fix.elevation_deg,
                            azimuth_deg: rise_fix.azimuth_deg,
                        },
                        false,
                    )
                } else {
                    // Already above threshold when the window opens.
                    (
                        PassEvent {
                            kind: PassEventKind::Rise,
                            instant: cursor,
                            elevation_deg: fix.elevation_deg,
                            azimuth_deg: fix.azimuth_deg,
                        },
                        true,
                    )
                };
                open = Some(OpenPass {
                    rise,
                    rise_clipped,
                    max_elevation_deg: fix.elevation_deg,
                });
            }
            (None, false) => {}
        }

        prev = Some(fix);
        if cursor >= end {
            break;
        }
        cursor = (cursor + step).min(end);
    }

    // Window boundary hit while the body is still up.
    if let Some(open_pass) = open.take() {
        let fix = fix_at(sampler, observer, end)?;
        let set = PassEvent {
            kind: PassEventKind::Set,
            instant: end,
            elevation_deg: fix.elevation_deg,
            azimuth_deg: fix.azimuth_deg,
        };
        passes.push(close_pass(sampler, observer, open_pass, set, true)?);
    }

    passes.sort_by_key(|p| p.rise.instant);
    Ok(passes)
}

fn close_pass(
    sampler: &dyn BodySampler,
    observer: &GeodeticPosition,
    open: OpenPass,
    set: PassEvent,
    set_clipped: bool,
) -> Result<Pass, GeometryError> {
    let culminate = refine_culmination(sampler, observer, open.rise.instant, set.instant)?;
    let mut max_elevation_deg = open
        .max_elevation_deg
        .max(open.rise.elevation_deg)
        .max(set.elevation_deg);
    if let Some(event) = &culminate {
        max_elevation_deg = max_elevation_deg.max(event.elevation_deg);
    }
    let duration_seconds = (set.instant - open.rise.instant).num_seconds();

    Ok(Pass {
        rise: open.rise,
        culminate,
        set,
        max_elevation_deg,
        duration_seconds,
        rise_clipped: open.rise_clipped,
        set_clipped,
    })
}

/// Bisect a bracketed threshold crossing down to the refinement tolerance.
///
/// `rising` expects elevation below the threshold at `low` and above at
/// `high`; a setting crossing expects the opposite. An interval that does
/// not bracket the crossing, or a budget overrun, is a `NonConvergence`.
fn refine_crossing(
    sampler: &dyn BodySampler,
    observer: &GeodeticPosition,
    mut low: DateTime<Utc>,
    mut high: DateTime<Utc>,
    min_elevation_deg: f64,
    rising: bool,
) -> Result<(DateTime<Utc>, TopocentricFix), GeometryError> {
    let low_above = fix_at(sampler, observer, low)?.visible_above(min_elevation_deg);
    let high_above = fix_at(sampler, observer, high)?.visible_above(min_elevation_deg);
    if low_above == high_above || low_above == rising {
        return Err(GeometryError::NonConvergence {
            context: "threshold crossing bisection",
            iterations: 0,
        });
    }

    let tolerance = Duration::milliseconds(REFINE_TOLERANCE_MS);
    let mut iterations = 0;
    while high - low > tolerance {
        iterations += 1;
        if iterations > MAX_REFINE_ITERATIONS {
            return Err(GeometryError::NonConvergence {
                context: "threshold crossing bisection",
                iterations,
            });
        }
        let mid = low + (high - low) / 2;
        let above = fix_at(sampler, observer, mid)?.visible_above(min_elevation_deg);
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    // Report the above-threshold side of the bracket so rise and set events
    // both carry an elevation at or just over the threshold.
    let instant = if rising { high } else { low };
    let fix = fix_at(sampler, observer, instant)?;
    Ok((instant, fix))
}

/// Ternary search for the elevation maximum between rise and set. A span
/// too short to bracket a maximum yields `None`; the pass stands without a
/// culmination event.
fn refine_culmination(
    sampler: &dyn BodySampler,
    observer: &GeodeticPosition,
    mut low: DateTime<Utc>,
    mut high: DateTime<Utc>,
) -> Result<Option<PassEvent>, GeometryError> {
    let tolerance = Duration::milliseconds(REFINE_TOLERANCE_MS);
    if high - low <= tolerance * 2 {
        return Ok(None);
    }

    let mut iterations = 0;
    while high - low > tolerance {
        iterations += 1;
        if iterations > MAX_REFINE_ITERATIONS {
            return Err(GeometryError::NonConvergence {
                context: "culmination search",
                iterations,
            });
        }
        let third = (high - low) / 3;
        let m1 = low + third;
        let m2 = high - third;
        let e1 = fix_at(sampler, observer, m1)?.elevation_deg;
        let e2 = fix_at(sampler, observer, m2)?.elevation_deg;
        if e1 < e2 {
            low = m1;
        } else {
            high = m2;
        }
    }

    let instant = low + (high - low) / 2;
    let fix = fix_at(sampler, observer, instant)?;
    Ok(Some(PassEvent {
        kind: PassEventKind::Culminate,
        instant,
        elevation_deg: fix.elevation_deg,
        azimuth_deg: fix.azimuth_deg,
    }))
}

fn fix_at(
    sampler: &dyn BodySampler,
    observer: &GeodeticPosition,
    instant: DateTime<Utc>,
) -> Result<TopocentricFix, GeometryError> {
    let sample = sampler.position_at(instant)?;
    Ok(observe(observer, &sample))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::{BodyPositionSample, EphemerisError};
    use crate::geo::{geodetic_to_ecef, CartesianVector};
    use chrono::TimeZone;

    /// Body whose elevation over a fixed equatorial observer follows a
    /// scripted profile: placed 1000 km out along the observer's
    /// north/zenith plane, so elevation equals the profile exactly.
    struct ScriptedBody<F: Fn(f64) -> f64 + Send> {
        t0: DateTime<Utc>,
        elevation: F,
    }

    impl<F: Fn(f64) -> f64 + Send> BodySampler for ScriptedBody<F> {
        fn position_at(
            &self,
            instant: DateTime<Utc>,
        ) -> Result<BodyPositionSample, EphemerisError> {
            let seconds = (instant - self.t0).num_milliseconds() as f64 / 1000.0;
            let el = (self.elevation)(seconds).to_radians();
            let site = geodetic_to_ecef(&test_observer());
            // At lat 0, lon 0: zenith is +x, north is +z.
            Ok(BodyPositionSample {
                instant,
                vector: CartesianVector::ecef(
                    site.x + 1000.0 * el.sin(),
                    site.y,
                    site.z + 1000.0 * el.cos(),
                ),
            })
        }
    }

    fn test_observer() -> GeodeticPosition {
        GeodeticPosition::new(0.0, 0.0, 0.0).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn seconds_from_start(instant: DateTime<Utc>) -> f64 {
        (instant - t0()).num_milliseconds() as f64 / 1000.0
    }

    #[test]
    fn single_pass_with_refined_events() {
        // Above 0 deg between t=100 and t=500, peaking at t=300.
        let body = ScriptedBody {
            t0: t0(),
            elevation: |t| -10.0 + 20.0 * (std::f64::consts::PI * t / 600.0).sin(),
        };
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            t0() + Duration::seconds(1200),
            0.0,
            Duration::seconds(30),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert!(!pass.is_partial());
        assert!((seconds_from_start(pass.rise.instant) - 100.0).abs() < 1.0);
        assert!((seconds_from_start(pass.set.instant) - 500.0).abs() < 1.0);
        let culminate = pass.culminate.as_ref().unwrap();
        assert!((seconds_from_start(culminate.instant) - 300.0).abs() < 2.0);
        assert!(pass.rise.instant < culminate.instant);
        assert!(culminate.instant < pass.set.instant);
        assert!((pass.max_elevation_deg - 10.0).abs() < 0.01);
        assert!((pass.duration_seconds - 400).abs() <= 1);
    }

    #[test]
    fn refined_events_sit_on_the_above_threshold_side() {
        let body = ScriptedBody {
            t0: t0(),
            elevation: |t| -10.0 + 20.0 * (std::f64::consts::PI * t / 600.0).sin(),
        };
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            t0() + Duration::seconds(1200),
            5.0,
            Duration::seconds(30),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        for event in [&pass.rise, &pass.set] {
            assert!(
                event.elevation_deg > 5.0 && event.elevation_deg < 5.1,
                "{:?} elevation {}",
                event.kind,
                event.elevation_deg
            );
        }
    }

    #[test]
    fn circumpolar_body_yields_one_window_spanning_partial() {
        let body = ScriptedBody {
            t0: t0(),
            elevation: |_| 45.0,
        };
        let end = t0() + Duration::hours(2);
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            end,
            10.0,
            Duration::seconds(60),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert!(pass.rise_clipped && pass.set_clipped);
        assert_eq!(pass.rise.instant, t0());
        assert_eq!(pass.set.instant, end);
        assert_eq!(pass.duration_seconds, 7200);
    }

    #[test]
    fn body_never_above_threshold_yields_empty_list() {
        let body = ScriptedBody {
            t0: t0(),
            elevation: |_| -5.0,
        };
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            t0() + Duration::hours(1),
            0.0,
            Duration::seconds(60),
        )
        .unwrap();
        assert!(passes.is_empty());
    }

    #[test]
    fn pass_in_progress_at_window_end_is_clipped() {
        // Rises at t=300 and keeps climbing.
        let body = ScriptedBody {
            t0: t0(),
            elevation: |t| t / 60.0 - 5.0,
        };
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            t0() + Duration::seconds(600),
            0.0,
            Duration::seconds(30),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert!(!pass.rise_clipped);
        assert!(pass.set_clipped);
        assert!((seconds_from_start(pass.rise.instant) - 300.0).abs() < 1.0);
        assert_eq!(pass.set.instant, t0() + Duration::seconds(600));
    }

    #[test]
    fn pass_in_progress_at_window_start_is_clipped() {
        // Setting from the first sample, below after t=300.
        let body = ScriptedBody {
            t0: t0(),
            elevation: |t| 5.0 - t / 60.0,
        };
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            t0() + Duration::seconds(600),
            0.0,
            Duration::seconds(30),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert!(pass.rise_clipped);
        assert!(!pass.set_clipped);
        assert_eq!(pass.rise.instant, t0());
        assert!((seconds_from_start(pass.set.instant) - 300.0).abs() < 1.0);
    }

    #[test]
    fn multiple_passes_are_ordered_by_rise() {
        // Above -5+10*sin(2*pi*t/600) > 0 for t in (50, 250) mod 600.
        let body = ScriptedBody {
            t0: t0(),
            elevation: |t| -5.0 + 10.0 * (2.0 * std::f64::consts::PI * t / 600.0).sin(),
        };
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            t0() + Duration::seconds(1200),
            0.0,
            Duration::seconds(20),
        )
        .unwrap();

        assert_eq!(passes.len(), 2);
        for pass in &passes {
            assert!(pass.rise.instant < pass.set.instant);
            if let Some(c) = &pass.culminate {
                assert!(pass.rise.instant < c.instant && c.instant < pass.set.instant);
            }
        }
        assert!(passes[0].rise.instant < passes[1].rise.instant);
        assert!((seconds_from_start(passes[1].rise.instant) - 650.0).abs() < 1.0);
    }

    #[test]
    fn very_brief_pass_has_no_culmination() {
        // A 10 ms spike above the threshold at t=300.
        let body = ScriptedBody {
            t0: t0(),
            elevation: |t| if (t - 300.0).abs() < 0.005 { 1.0 } else { -1.0 },
        };
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            t0() + Duration::seconds(600),
            0.0,
            Duration::seconds(60),
        )
        .unwrap();

        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert!(pass.culminate.is_none());
        assert!(pass.rise.instant <= pass.set.instant);
    }

    #[test]
    fn unbracketed_refinement_is_nonconvergence() {
        let body = ScriptedBody {
            t0: t0(),
            elevation: |_| 20.0,
        };
        let result = refine_crossing(
            &body,
            &test_observer(),
            t0(),
            t0() + Duration::seconds(60),
            0.0,
            true,
        );
        assert!(matches!(
            result,
            Err(GeometryError::NonConvergence { .. })
        ));
    }

    #[test]
    fn empty_window_returns_empty() {
        let body = ScriptedBody {
            t0: t0(),
            elevation: |_| 45.0,
        };
        let passes = find_passes(
            &body,
            &test_observer(),
            t0(),
            t0(),
            0.0,
            Duration::seconds(30),
        )
        .unwrap();
        assert!(passes.is_empty());
    }
}
