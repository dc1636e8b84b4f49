use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ephemeris::{moon, sun, BodyId, PositionSource};
use crate::observer::observe;
use crate::passes::{coarse_step_for, find_passes, Pass};
use crate::terminator::{trace_terminator, TerminatorPolyline};
use crate::web::api::error::{ApiError, ApiResult};
use crate::web::api::ObserverQuery;
use crate::web::server::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SkyBody {
    Sun,
    Moon,
}

impl SkyBody {
    fn body_id(self) -> BodyId {
        match self {
            SkyBody::Sun => BodyId::Sun,
            SkyBody::Moon => BodyId::Moon,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SunResponse {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub declination_deg: f64,
    pub right_ascension_hours: f64,
    pub distance_au: f64,
    pub above_horizon: bool,
    pub timestamp: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/astronomy/sun",
    tag = "astronomy",
    params(
        ("lat" = Option<f64>, Query, description = "Observer latitude (degrees)"),
        ("lon" = Option<f64>, Query, description = "Observer longitude (degrees)"),
        ("alt_m" = Option<f64>, Query, description = "Observer altitude (meters)"),
        ("time" = Option<String>, Query, description = "Instant (RFC3339), default now")
    ),
    responses(
        (status = 200, description = "Topocentric sun position", body = SunResponse),
        (status = 400, description = "Invalid observer")
    )
)]
pub async fn sun_position(
    State(state): State<AppState>,
    Query(query): Query<ObserverQuery>,
) -> ApiResult<Json<SunResponse>> {
    let observer = query.observer(&state)?;
    let instant = query.instant();

    let sample = state.ephemeris.position_at(BodyId::Sun, instant)?;
    let fix = observe(&observer, &sample);
    let equatorial = sun::sun_equatorial(instant);

    Ok(Json(SunResponse {
        azimuth_deg: fix.azimuth_deg,
        elevation_deg: fix.elevation_deg,
        range_km: fix.range_km,
        declination_deg: equatorial.declination_deg,
        right_ascension_hours: equatorial.right_ascension_hours,
        distance_au: equatorial.distance_au,
        above_horizon: fix.visible_above(0.0),
        timestamp: instant,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MoonResponse {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub distance_km: f64,
    pub phase_angle_deg: f64,
    pub illumination_percent: f64,
    pub phase_name: String,
    pub above_horizon: bool,
    pub timestamp: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/astronomy/moon",
    tag = "astronomy",
    params(
        ("lat" = Option<f64>, Query, description = "Observer latitude (degrees)"),
        ("lon" = Option<f64>, Query, description = "Observer longitude (degrees)"),
        ("alt_m" = Option<f64>, Query, description = "Observer altitude (meters)"),
        ("time" = Option<String>, Query, description = "Instant (RFC3339), default now")
    ),
    responses(
        (status = 200, description = "Topocentric moon position and phase", body = MoonResponse),
        (status = 400, description = "Invalid observer")
    )
)]
pub async fn moon_position(
    State(state): State<AppState>,
    Query(query): Query<ObserverQuery>,
) -> ApiResult<Json<MoonResponse>> {
    let observer = query.observer(&state)?;
    let instant = query.instant();

    let sample = state.ephemeris.position_at(BodyId::Moon, instant)?;
    let fix = observe(&observer, &sample);
    let ecliptic = moon::moon_ecliptic(instant);
    let phase = moon::moon_phase(instant);

    Ok(Json(MoonResponse {
        azimuth_deg: fix.azimuth_deg,
        elevation_deg: fix.elevation_deg,
        range_km: fix.range_km,
        distance_km: ecliptic.distance_km,
        phase_angle_deg: phase.phase_angle_deg,
        illumination_percent: phase.illumination_percent,
        phase_name: moon::phase_name(phase.phase_angle_deg).to_string(),
        above_horizon: fix.visible_above(0.0),
        timestamp: instant,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RiseSetQuery {
    pub body: SkyBody,
    /// UTC date, default today.
    pub date: Option<NaiveDate>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub alt_m: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RiseSetResponse {
    pub body: SkyBody,
    pub date: NaiveDate,
    pub rise: Option<DateTime<Utc>>,
    pub set: Option<DateTime<Utc>>,
    pub culmination: Option<DateTime<Utc>>,
    pub hours_up: Option<f64>,
    /// Above the horizon for the whole day.
    pub always_up: bool,
    /// Never reaches the horizon that day.
    pub never_up: bool,
}

#[utoipa::path(
    get,
    path = "/api/astronomy/riseset",
    tag = "astronomy",
    params(
        ("body" = SkyBody, Query, description = "sun or moon"),
        ("date" = Option<String>, Query, description = "UTC date (YYYY-MM-DD), default today"),
        ("lat" = Option<f64>, Query, description = "Observer latitude (degrees)"),
        ("lon" = Option<f64>, Query, description = "Observer longitude (degrees)"),
        ("alt_m" = Option<f64>, Query, description = "Observer altitude (meters)")
    ),
    responses(
        (status = 200, description = "Rise/set times for the day", body = RiseSetResponse),
        (status = 400, description = "Invalid parameters")
    )
)]
pub async fn rise_set(
    State(state): State<AppState>,
    Query(query): Query<RiseSetQuery>,
) -> ApiResult<Json<RiseSetResponse>> {
    let observer = ObserverQuery {
        lat: query.lat,
        lon: query.lon,
        alt_m: query.alt_m,
        time: None,
    }
    .observer(&state)?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let start = date
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .ok_or_else(|| ApiError::Validation("invalid date".into()))?;
    let end = start + Duration::days(1);

    let body = query.body.body_id();
    let sampler = state.ephemeris.snapshot(body)?;
    let passes = tokio::task::spawn_blocking(move || {
        find_passes(
            sampler.as_ref(),
            &observer,
            start,
            end,
            0.0,
            coarse_step_for(body),
        )
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(summarize_day(query.body, date, &passes)))
}

fn summarize_day(body: SkyBody, date: NaiveDate, passes: &[Pass]) -> RiseSetResponse {
    let always_up = passes.len() == 1 && passes[0].rise_clipped && passes[0].set_clipped;
    let rise = passes
        .iter()
        .find(|p| !p.rise_clipped)
        .map(|p| p.rise.instant);
    let set = passes.iter().find(|p| !p.set_clipped).map(|p| p.set.instant);
    let culmination = passes
        .iter()
        .max_by(|a, b| a.max_elevation_deg.total_cmp(&b.max_elevation_deg))
        .and_then(|p| p.culminate.as_ref().map(|c| c.instant));
    let hours_up = if passes.is_empty() {
        None
    } else {
        Some(passes.iter().map(|p| p.duration_seconds).sum::<i64>() as f64 / 3600.0)
    };

    RiseSetResponse {
        body,
        date,
        rise,
        set,
        culmination,
        hours_up,
        always_up,
        never_up: passes.is_empty(),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TerminatorQuery {
    #[serde(default, deserialize_with = "crate::web::api::deserialize_opt_datetime")]
    pub time: Option<DateTime<Utc>>,
    pub points: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/terminator",
    tag = "astronomy",
    params(
        ("time" = Option<String>, Query, description = "Instant (RFC3339), default now"),
        ("points" = Option<usize>, Query, description = "Longitude samples, default 360, max 2000")
    ),
    responses(
        (status = 200, description = "Day/night boundary polyline", body = TerminatorPolyline)
    )
)]
pub async fn terminator(
    State(state): State<AppState>,
    Query(query): Query<TerminatorQuery>,
) -> ApiResult<Json<TerminatorPolyline>> {
    let instant = query.time.unwrap_or_else(Utc::now);
    let points = query.points.unwrap_or(360).min(2000);

    let ephemeris = state.ephemeris.clone();
    let line =
        tokio::task::spawn_blocking(move || trace_terminator(ephemeris.as_ref(), instant, points))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::{PassEvent, PassEventKind};
    use chrono::TimeZone;

    fn event(kind: PassEventKind, instant: DateTime<Utc>, elevation: f64) -> PassEvent {
        PassEvent {
            kind,
            instant,
            elevation_deg: elevation,
            azimuth_deg: 0.0,
        }
    }

    #[test]
    fn summarizes_a_normal_day() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let rise_t = Utc.with_ymd_and_hms(2024, 6, 1, 4, 30, 0).unwrap();
        let noon = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let set_t = Utc.with_ymd_and_hms(2024, 6, 1, 19, 30, 0).unwrap();
        let pass = Pass {
            rise: event(PassEventKind::Rise, rise_t, 0.0),
            culminate: Some(event(PassEventKind::Culminate, noon, 60.0)),
            set: event(PassEventKind::Set, set_t, 0.0),
            max_elevation_deg: 60.0,
            duration_seconds: 54_000,
            rise_clipped: false,
            set_clipped: false,
        };

        let summary = summarize_day(SkyBody::Sun, date, &[pass]);
        assert_eq!(summary.rise, Some(rise_t));
        assert_eq!(summary.set, Some(set_t));
        assert_eq!(summary.culmination, Some(noon));
        assert!((summary.hours_up.unwrap() - 15.0).abs() < 1e-9);
        assert!(!summary.always_up && !summary.never_up);
    }

    #[test]
    fn polar_day_and_night() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);
        let circumpolar = Pass {
            rise: event(PassEventKind::Rise, start, 10.0),
            culminate: None,
            set: event(PassEventKind::Set, end, 10.0),
            max_elevation_deg: 12.0,
            duration_seconds: 86_400,
            rise_clipped: true,
            set_clipped: true,
        };

        let day = summarize_day(SkyBody::Sun, date, &[circumpolar]);
        assert!(day.always_up);
        assert_eq!(day.rise, None);
        assert_eq!(day.set, None);

        let night = summarize_day(SkyBody::Sun, date, &[]);
        assert!(night.never_up);
        assert_eq!(night.hours_up, None);
    }
}
