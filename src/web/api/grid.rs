use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geo::GeodeticPosition;
use crate::grid;
use crate::web::api::error::ApiResult;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EncodeQuery {
    pub lat: f64,
    pub lon: f64,
    /// 2, 4, 6 or 8 characters; default 6.
    pub precision: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EncodeResponse {
    pub grid: String,
}

#[utoipa::path(
    get,
    path = "/api/grid/encode",
    tag = "grid",
    params(
        ("lat" = f64, Query, description = "Latitude (degrees)"),
        ("lon" = f64, Query, description = "Longitude (degrees)"),
        ("precision" = Option<usize>, Query, description = "Locator length: 2, 4, 6 or 8")
    ),
    responses(
        (status = 200, description = "Maidenhead locator", body = EncodeResponse),
        (status = 400, description = "Invalid coordinates or precision")
    )
)]
pub async fn encode(Query(query): Query<EncodeQuery>) -> ApiResult<Json<EncodeResponse>> {
    let position = GeodeticPosition::new(query.lat, query.lon, 0.0)?;
    let grid = grid::encode(&position, query.precision.unwrap_or(6))?;
    Ok(Json(EncodeResponse { grid }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecodeQuery {
    pub grid: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DecodeResponse {
    pub grid: String,
    /// Center of the cell.
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

#[utoipa::path(
    get,
    path = "/api/grid/decode",
    tag = "grid",
    params(("grid" = String, Query, description = "Maidenhead locator")),
    responses(
        (status = 200, description = "Cell center coordinates", body = DecodeResponse),
        (status = 400, description = "Invalid locator")
    )
)]
pub async fn decode(Query(query): Query<DecodeQuery>) -> ApiResult<Json<DecodeResponse>> {
    let center = grid::decode(&query.grid)?;
    Ok(Json(DecodeResponse {
        grid: query.grid.trim().to_ascii_uppercase(),
        latitude_deg: center.latitude_deg,
        longitude_deg: center.longitude_deg,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DistanceQuery {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DistanceResponse {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub bearing_deg: f64,
}

#[utoipa::path(
    get,
    path = "/api/grid/distance",
    tag = "grid",
    params(
        ("from" = String, Query, description = "Origin locator"),
        ("to" = String, Query, description = "Destination locator")
    ),
    responses(
        (status = 200, description = "Great-circle distance and bearing between cell centers", body = DistanceResponse),
        (status = 400, description = "Invalid locator")
    )
)]
pub async fn distance(Query(query): Query<DistanceQuery>) -> ApiResult<Json<DistanceResponse>> {
    let (distance_km, bearing_deg) = grid::grid_distance(&query.from, &query.to)?;
    Ok(Json(DistanceResponse {
        from: query.from.trim().to_ascii_uppercase(),
        to: query.to.trim().to_ascii_uppercase(),
        distance_km,
        bearing_deg,
    }))
}
