use utoipa::OpenApi;

use super::api::astronomy::{MoonResponse, RiseSetResponse, SkyBody, SunResponse};
use super::api::error::ErrorResponse;
use super::api::grid::{DecodeResponse, DistanceResponse, EncodeResponse};
use super::api::satellites::{
    PassListResponse, SatelliteListResponse, SatellitePositionResponse, SatelliteSummary,
    TrackPoint, TrackResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::astronomy::sun_position,
        super::api::astronomy::moon_position,
        super::api::astronomy::rise_set,
        super::api::astronomy::terminator,
        super::api::satellites::list_satellites,
        super::api::satellites::satellite_position,
        super::api::satellites::satellite_passes,
        super::api::satellites::satellite_track,
        super::api::grid::encode,
        super::api::grid::decode,
        super::api::grid::distance,
    ),
    components(
        schemas(
            SunResponse,
            MoonResponse,
            RiseSetResponse,
            SkyBody,
            SatelliteSummary,
            SatelliteListResponse,
            SatellitePositionResponse,
            PassListResponse,
            TrackPoint,
            TrackResponse,
            EncodeResponse,
            DecodeResponse,
            DistanceResponse,
            ErrorResponse,
            crate::ephemeris::SatelliteInfo,
            crate::passes::Pass,
            crate::passes::PassEvent,
            crate::passes::PassEventKind,
            crate::terminator::TerminatorPoint,
            crate::terminator::TerminatorPolyline,
        )
    ),
    info(
        title = "HamDash Geometry API",
        description = "Observer-relative astronomy, satellite prediction and grid locator API",
        version = "0.1.0"
    ),
    tags(
        (name = "astronomy", description = "Sun, moon and terminator geometry"),
        (name = "satellites", description = "Satellite positions, passes and ground tracks"),
        (name = "grid", description = "Maidenhead locator conversions")
    )
)]
pub struct ApiDoc;
