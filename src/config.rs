use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::geo::{GeoError, GeodeticPosition};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    #[serde(default)]
    pub web: WebConfig,
    pub tle: TleConfig,
    #[serde(default)]
    pub predict: PredictConfig,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Default observer location used when a request does not carry one.
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

impl StationConfig {
    pub fn observer(&self) -> Result<GeodeticPosition, GeoError> {
        GeodeticPosition::new(self.latitude_deg, self.longitude_deg, self.altitude_m)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TleConfig {
    pub folder: PathBuf,
    /// Element sets older than this are flagged stale in responses.
    #[serde(default = "default_max_age", deserialize_with = "humantime_duration")]
    pub max_age: Duration,
    /// How often the catalog folder is re-read while serving.
    #[serde(
        default = "default_reload_interval",
        deserialize_with = "humantime_duration"
    )]
    pub reload_interval: Duration,
}

fn default_max_age() -> Duration {
    Duration::hours(24)
}

fn default_reload_interval() -> Duration {
    Duration::hours(1)
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    #[serde(default = "default_min_elevation")]
    pub default_min_elevation: f64,
    #[serde(default = "default_coarse_step_seconds")]
    pub coarse_step_seconds: i64,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            default_min_elevation: default_min_elevation(),
            coarse_step_seconds: default_coarse_step_seconds(),
        }
    }
}

fn default_min_elevation() -> f64 {
    10.0
}

fn default_coarse_step_seconds() -> i64 {
    crate::passes::SATELLITE_COARSE_STEP_SECONDS
}

/// Accepts humantime strings like "24h" or "90m".
fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let std = humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)?;
    Duration::from_std(std).map_err(serde::de::Error::custom)
}
