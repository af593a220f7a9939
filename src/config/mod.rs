//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::util::rate_limit::STORE_RATE_LIMIT;
use crate::util::time::{DEFAULT_FRAME_RATE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_STORE_TIMEOUT_MS};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones (`LOG_FORMAT=json`)
    pub log_json: bool,

    /// Base URL of the shared store service used by game clients
    pub store_url: String,
    /// Room poll period in milliseconds
    pub poll_interval_ms: u64,
    /// Upper bound on one store request in milliseconds
    pub store_timeout_ms: u64,
    /// Simulation frames per second
    pub frame_rate: u32,
    /// Store API requests allowed per second
    pub store_rate_limit: u32,
    /// Allowed client origins for CORS (comma-separated, `*` for any)
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")),

            store_url: env::var("STORE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            poll_interval_ms: parse_or("POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            store_timeout_ms: parse_or("STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?,
            frame_rate: parse_or("FRAME_RATE", DEFAULT_FRAME_RATE)?,
            store_rate_limit: parse_or("STORE_RATE_LIMIT", STORE_RATE_LIMIT)?,
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
