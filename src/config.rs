use std::{env, time::Duration};

use thiserror::Error;

use crate::services::{
    attempt_service::{AttemptSettings, DEFAULT_FINISHED_RETENTION},
    draft_service::DEFAULT_DRAFT_RETENTION,
    player::DEFAULT_QUESTION_SECONDS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub jwt_secret: String,
    pub port: u16,
    pub question_seconds: u32,
    pub tick_millis: u64,
    pub idle_seconds: u64,
    pub finished_retention_seconds: u64,
    pub draft_retention_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Err(_) | Ok("mongo") => StoreBackend::Mongo,
            Ok("memory") => StoreBackend::Memory,
            Ok(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };
        let mongodb_uri = env::var("MONGODB_URI").ok();
        if store_backend == StoreBackend::Mongo && mongodb_uri.is_none() {
            return Err(ConfigError::Missing("MONGODB_URI"));
        }
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let question_seconds = parsed("QUESTION_SECONDS", DEFAULT_QUESTION_SECONDS)?;
        let config = Config {
            store_backend,
            mongodb_uri,
            mongodb_database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "quiz_db".to_string()),
            jwt_secret,
            port: parsed("PORT", 8000)?,
            question_seconds,
            tick_millis: parsed("TICK_MILLIS", 1000)?,
            // a client that stays silent for a whole question has gone
            idle_seconds: parsed("IDLE_SECONDS", question_seconds as u64)?,
            finished_retention_seconds: parsed(
                "FINISHED_RETENTION_SECONDS",
                DEFAULT_FINISHED_RETENTION.as_secs(),
            )?,
            draft_retention_seconds: parsed("DRAFT_RETENTION_SECONDS", DEFAULT_DRAFT_RETENTION.as_secs())?,
        };
        if config.question_seconds == 0 {
            return Err(ConfigError::Invalid { name: "QUESTION_SECONDS", value: "0".to_string() });
        }
        if config.tick_millis == 0 {
            return Err(ConfigError::Invalid { name: "TICK_MILLIS", value: "0".to_string() });
        }
        if config.idle_seconds == 0 {
            return Err(ConfigError::Invalid { name: "IDLE_SECONDS", value: "0".to_string() });
        }
        Ok(config)
    }

    pub fn attempt_settings(&self) -> AttemptSettings {
        AttemptSettings {
            question_seconds: self.question_seconds,
            tick: Duration::from_millis(self.tick_millis),
            idle_timeout: Duration::from_secs(self.idle_seconds),
            finished_retention: Duration::from_secs(self.finished_retention_seconds),
        }
    }

    pub fn draft_retention(&self) -> Duration {
        Duration::from_secs(self.draft_retention_seconds)
    }
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
