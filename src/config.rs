//! Node configuration read from the environment (and `.env` via dotenvy).

use log::warn;
use std::env;
use std::str::FromStr;

use crate::blockchain::DEFAULT_DIFFICULTY;
use crate::consensus::{DEFAULT_MAX_ITERATIONS, TARGET_BLOCK_TIME_SECS};

#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub initial_difficulty: u32,
    pub max_iterations: u64,
    pub target_block_time_secs: f64,
    pub block_log_path: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 8080,
            initial_difficulty: DEFAULT_DIFFICULTY,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            target_block_time_secs: TARGET_BLOCK_TIME_SECS,
            block_log_path: default_block_log_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_block_log_path() -> String {
    "blocks.json".to_string()
}

impl NodeConfig {
    /// Read from the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Missing keys fall back to defaults;
    /// unparsable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            initial_difficulty: parse_or(&lookup, "INITIAL_DIFFICULTY", defaults.initial_difficulty)
                .max(1),
            max_iterations: parse_or(&lookup, "MAX_ITERATIONS", defaults.max_iterations),
            target_block_time_secs: parse_or(
                &lookup,
                "TARGET_BLOCK_TIME_SECS",
                defaults.target_block_time_secs,
            ),
            block_log_path: lookup("BLOCK_LOG_PATH").unwrap_or(defaults.block_log_path),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("CONFIG - invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
