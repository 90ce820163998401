use anyhow::{anyhow, Context, Result};
use std::{env, str::FromStr, time::Duration};

use crate::game::{grid::DEFAULT_RETRY_BUDGET, hints::DEFAULT_MAX_HINTS, PlacementConfig, WordOrder};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub word_database_path: String,
    pub default_grid_size: usize,
    /// Seconds, 0 for untimed games
    pub default_time_limit: u32,
    pub placement: PlacementConfig,
    pub max_hints: u32,
    /// How long a finished game stays readable before cleanup
    pub finished_session_ttl: Duration,
    /// How long results outlive their swept session
    pub finished_results_ttl: Duration,
    /// `None` keeps achievements in memory only
    pub achievements_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys take their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server = ServerConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
        };

        let word_order = match lookup("WORD_ORDER") {
            Some(raw) => raw
                .parse::<WordOrder>()
                .map_err(|e| anyhow!(e))
                .context("WORD_ORDER is invalid")?,
            None => WordOrder::default(),
        };

        let game = GameConfig {
            word_database_path: lookup("WORD_DATABASE_PATH")
                .unwrap_or_else(|| "./word_database.json".to_string()),
            default_grid_size: parse_or(&lookup, "DEFAULT_GRID_SIZE", 12)?,
            default_time_limit: parse_or(&lookup, "DEFAULT_TIME_LIMIT", 300)?,
            placement: PlacementConfig {
                retry_budget: parse_or(&lookup, "PLACEMENT_RETRY_BUDGET", DEFAULT_RETRY_BUDGET)?,
                word_order,
            },
            max_hints: parse_or(&lookup, "MAX_HINTS", DEFAULT_MAX_HINTS)?,
            finished_session_ttl: Duration::from_secs(parse_or(
                &lookup,
                "FINISHED_SESSION_TTL",
                600,
            )?),
            finished_results_ttl: Duration::from_secs(parse_or(
                &lookup,
                "FINISHED_RESULTS_TTL",
                24 * 60 * 60,
            )?),
            achievements_path: match lookup("ACHIEVEMENTS_PATH") {
                Some(path) if path.trim().is_empty() => None,
                Some(path) => Some(path),
                None => Some("./achievements.json".to_string()),
            },
        };

        Ok(Config { server, game })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", key, raw)),
        None => Ok(default),
    }
}
