//! Application settings, read from `settings.toml`.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

/// Optional overrides for the engine's policy knobs; anything absent keeps
/// the built-in default.
#[derive(Debug, Default, Deserialize)]
pub struct Policy {
    pub games_daily_cap: Option<i64>,
    pub redemption_minimum: Option<i64>,
    pub rate_per_point_minor: Option<i64>,
    pub day_offset_minutes: Option<i32>,
}

impl Policy {
    pub fn to_engine_policy(&self) -> engine::EnginePolicy {
        let default = engine::EnginePolicy::default();
        engine::EnginePolicy {
            games_daily_cap: self.games_daily_cap.unwrap_or(default.games_daily_cap),
            redemption_minimum: self.redemption_minimum.unwrap_or(default.redemption_minimum),
            rate_per_point_minor: self
                .rate_per_point_minor
                .unwrap_or(default.rate_per_point_minor),
            day_offset_minutes: self
                .day_offset_minutes
                .unwrap_or(default.day_offset_minutes),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub policy: Option<Policy>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
