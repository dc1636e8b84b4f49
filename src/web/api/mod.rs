pub mod astronomy;
pub mod error;
pub mod grid;
pub mod satellites;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::geo::GeodeticPosition;
use crate::web::server::AppState;

use error::ApiError;

/// Observer override shared by the position endpoints; falls back to the
/// configured station when absent.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ObserverQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub alt_m: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_opt_datetime")]
    pub time: Option<DateTime<Utc>>,
}

impl ObserverQuery {
    pub fn observer(&self, state: &AppState) -> Result<GeodeticPosition, ApiError> {
        match (self.lat, self.lon) {
            (None, None) => Ok(state.observer),
            (Some(lat), Some(lon)) => {
                Ok(GeodeticPosition::new(lat, lon, self.alt_m.unwrap_or(0.0))?)
            }
            _ => Err(ApiError::Validation(
                "lat and lon must be supplied together".into(),
            )),
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.time.unwrap_or_else(Utc::now)
    }
}

pub(crate) fn deserialize_opt_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}
