use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::ephemeris::{Ephemeris, SatelliteCatalog};
use crate::geo::GeodeticPosition;

use super::api::{astronomy, grid, satellites};
use super::api_doc::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub observer: GeodeticPosition,
    pub ephemeris: Arc<Ephemeris>,
}

pub async fn run_server(config: Config, observer: GeodeticPosition) -> std::io::Result<()> {
    let bind_addr = config.web.bind.clone();

    let catalog = Arc::new(SatelliteCatalog::new(
        config.tle.folder.clone(),
        config.tle.max_age,
    ));
    match catalog.load_all() {
        Ok(count) => log::info!("Loaded {} element sets from {:?}", count, config.tle.folder),
        Err(e) => log::warn!("Failed to load element sets: {}", e),
    }
    spawn_reload_task(catalog.clone(), config.tle.reload_interval);

    let state = AppState {
        config: Arc::new(config),
        observer,
        ephemeris: Arc::new(Ephemeris::new(catalog)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Astronomy endpoints
        .route("/api/astronomy/sun", get(astronomy::sun_position))
        .route("/api/astronomy/moon", get(astronomy::moon_position))
        .route("/api/astronomy/riseset", get(astronomy::rise_set))
        .route("/api/terminator", get(astronomy::terminator))
        // Satellite endpoints
        .route("/api/satellites", get(satellites::list_satellites))
        .route(
            "/api/satellites/{norad_id}/position",
            get(satellites::satellite_position),
        )
        .route(
            "/api/satellites/{norad_id}/passes",
            get(satellites::satellite_passes),
        )
        .route(
            "/api/satellites/{norad_id}/track",
            get(satellites::satellite_track),
        )
        // Grid locator endpoints
        .route("/api/grid/encode", get(grid::encode))
        .route("/api/grid/decode", get(grid::decode))
        .route("/api/grid/distance", get(grid::distance))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await
}

/// Periodically re-reads the element-set folder so long-running instances pick
/// up refreshed TLE files without a restart.
fn spawn_reload_task(catalog: Arc<SatelliteCatalog>, interval: chrono::Duration) {
    let period = interval
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(3600));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(period).await;
            let catalog = catalog.clone();
            let result = tokio::task::spawn_blocking(move || catalog.load_all()).await;
            match result {
                Ok(Ok(count)) => log::debug!("Reloaded {} element sets", count),
                Ok(Err(e)) => log::warn!("Element set reload failed: {}", e),
                Err(e) => log::warn!("Element set reload task panicked: {}", e),
            }
        }
    });
}
