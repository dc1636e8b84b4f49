use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ephemeris::{BodySampler, SatelliteInfo};
use crate::geo::ecef_to_geodetic;
use crate::observer::observe;
use crate::passes::{find_passes, Pass};
use crate::web::api::error::{ApiError, ApiResult};
use crate::web::api::ObserverQuery;
use crate::web::server::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteSummary {
    pub name: String,
    pub norad_id: u32,
    pub tle_source: String,
    pub epoch: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SatelliteListResponse {
    pub satellites: Vec<SatelliteSummary>,
    pub count: usize,
}

#[utoipa::path(
    get,
    path = "/api/satellites",
    tag = "satellites",
    responses(
        (status = 200, description = "All cataloged satellites", body = SatelliteListResponse)
    )
)]
pub async fn list_satellites(State(state): State<AppState>) -> Json<SatelliteListResponse> {
    let catalog = state.ephemeris.catalog();
    let mut satellites: Vec<SatelliteSummary> = catalog
        .list()
        .into_iter()
        .map(|entry| SatelliteSummary {
            name: entry.info.name.clone(),
            norad_id: entry.info.norad_id,
            tle_source: entry.info.tle_source.clone(),
            epoch: entry.epoch(),
            fetched_at: entry.fetched_at,
            stale: catalog.is_stale(&entry),
        })
        .collect();
    satellites.sort_by_key(|s| s.norad_id);
    let count = satellites.len();
    Json(SatelliteListResponse { satellites, count })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SatellitePositionResponse {
    pub satellite: SatelliteInfo,
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub above_horizon: bool,
    /// Sub-satellite point.
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub elements_epoch: DateTime<Utc>,
    pub elements_fetched_at: DateTime<Utc>,
    pub elements_stale: bool,
}

#[utoipa::path(
    get,
    path = "/api/satellites/{norad_id}/position",
    tag = "satellites",
    params(
        ("norad_id" = u32, Path, description = "NORAD catalog number"),
        ("lat" = Option<f64>, Query, description = "Observer latitude (degrees)"),
        ("lon" = Option<f64>, Query, description = "Observer longitude (degrees)"),
        ("alt_m" = Option<f64>, Query, description = "Observer altitude (meters)"),
        ("time" = Option<String>, Query, description = "Instant (RFC3339), default now")
    ),
    responses(
        (status = 200, description = "Topocentric satellite position", body = SatellitePositionResponse),
        (status = 404, description = "Unknown satellite")
    )
)]
pub async fn satellite_position(
    State(state): State<AppState>,
    Path(norad_id): Path<u32>,
    Query(query): Query<ObserverQuery>,
) -> ApiResult<Json<SatellitePositionResponse>> {
    let observer = query.observer(&state)?;
    let instant = query.instant();

    let sampler = state.ephemeris.catalog().snapshot(norad_id)?;
    let sample = sampler.position_at(instant)?;
    let fix = observe(&observer, &sample);
    let subpoint = ecef_to_geodetic(&sample.to_ecef().vector);
    let meta = sampler.meta();

    Ok(Json(SatellitePositionResponse {
        satellite: sampler.info().clone(),
        timestamp: instant,
        azimuth_deg: fix.azimuth_deg,
        elevation_deg: fix.elevation_deg,
        range_km: fix.range_km,
        above_horizon: fix.visible_above(0.0),
        latitude_deg: subpoint.latitude_deg,
        longitude_deg: subpoint.longitude_deg,
        altitude_km: subpoint.altitude_m / 1000.0,
        elements_epoch: meta.epoch,
        elements_fetched_at: meta.fetched_at,
        elements_stale: meta.stale,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PassesQuery {
    #[serde(default, deserialize_with = "crate::web::api::deserialize_opt_datetime")]
    pub start: Option<DateTime<Utc>>,
    /// Window length, default 24, max 168.
    pub hours: Option<i64>,
    pub min_elevation: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub alt_m: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassListResponse {
    pub satellite: SatelliteInfo,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_elevation_deg: f64,
    pub passes: Vec<Pass>,
    pub elements_stale: bool,
}

#[utoipa::path(
    get,
    path = "/api/satellites/{norad_id}/passes",
    tag = "satellites",
    params(
        ("norad_id" = u32, Path, description = "NORAD catalog number"),
        ("start" = Option<String>, Query, description = "Window start (RFC3339), default now"),
        ("hours" = Option<i64>, Query, description = "Window length in hours, default 24"),
        ("min_elevation" = Option<f64>, Query, description = "Threshold elevation (degrees)"),
        ("lat" = Option<f64>, Query, description = "Observer latitude (degrees)"),
        ("lon" = Option<f64>, Query, description = "Observer longitude (degrees)"),
        ("alt_m" = Option<f64>, Query, description = "Observer altitude (meters)")
    ),
    responses(
        (status = 200, description = "Predicted passes, ordered by rise time", body = PassListResponse),
        (status = 404, description = "Unknown satellite")
    )
)]
pub async fn satellite_passes(
    State(state): State<AppState>,
    Path(norad_id): Path<u32>,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<PassListResponse>> {
    let observer = ObserverQuery {
        lat: query.lat,
        lon: query.lon,
        alt_m: query.alt_m,
        time: None,
    }
    .observer(&state)?;
    let start = query.start.unwrap_or_else(Utc::now);
    let hours = query.hours.unwrap_or(24).clamp(1, 168);
    let end = start + Duration::hours(hours);
    let min_elevation = query
        .min_elevation
        .unwrap_or(state.config.predict.default_min_elevation);
    let step = Duration::seconds(state.config.predict.coarse_step_seconds);

    let sampler = state.ephemeris.catalog().snapshot(norad_id)?;
    let info = sampler.info().clone();
    let elements_stale = sampler.meta().stale;

    let passes = tokio::task::spawn_blocking(move || {
        find_passes(&sampler, &observer, start, end, min_elevation, step)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(PassListResponse {
        satellite: info,
        start,
        end,
        min_elevation_deg: min_elevation,
        passes,
        elements_stale,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackQuery {
    #[serde(default, deserialize_with = "crate::web::api::deserialize_opt_datetime")]
    pub start: Option<DateTime<Utc>>,
    /// Default 90 (roughly one LEO orbit).
    pub duration_minutes: Option<i64>,
    pub points: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackPoint {
    pub time: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    pub satellite: SatelliteInfo,
    pub points: Vec<TrackPoint>,
    pub elements_stale: bool,
}

#[utoipa::path(
    get,
    path = "/api/satellites/{norad_id}/track",
    tag = "satellites",
    params(
        ("norad_id" = u32, Path, description = "NORAD catalog number"),
        ("start" = Option<String>, Query, description = "Track start (RFC3339), default now"),
        ("duration_minutes" = Option<i64>, Query, description = "Track length, default 90"),
        ("points" = Option<usize>, Query, description = "Samples along the track, default 100")
    ),
    responses(
        (status = 200, description = "Sub-satellite ground track", body = TrackResponse),
        (status = 404, description = "Unknown satellite")
    )
)]
pub async fn satellite_track(
    State(state): State<AppState>,
    Path(norad_id): Path<u32>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<Json<TrackResponse>> {
    let start = query.start.unwrap_or_else(Utc::now);
    let duration_minutes = query.duration_minutes.unwrap_or(90).clamp(1, 24 * 60);
    let points = query.points.unwrap_or(100).clamp(2, 1000);

    let sampler = state.ephemeris.catalog().snapshot(norad_id)?;
    let info = sampler.info().clone();
    let elements_stale = sampler.meta().stale;

    let track = tokio::task::spawn_blocking(move || -> Result<Vec<TrackPoint>, ApiError> {
        let span = Duration::minutes(duration_minutes);
        let mut out = Vec::with_capacity(points);
        for i in 0..points {
            let time = start + span * i as i32 / (points as i32 - 1);
            let sample = sampler.position_at(time)?;
            let subpoint = ecef_to_geodetic(&sample.to_ecef().vector);
            out.push(TrackPoint {
                time,
                latitude_deg: subpoint.latitude_deg,
                longitude_deg: subpoint.longitude_deg,
                altitude_km: subpoint.altitude_m / 1000.0,
            });
        }
        Ok(out)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(TrackResponse {
        satellite: info,
        points: track,
        elements_stale,
    }))
}
