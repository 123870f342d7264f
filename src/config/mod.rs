//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated); any origin when unset
    pub client_origin: Option<String>,

    /// Matches idle longer than this are evicted; `None` keeps them forever
    pub match_idle_ttl: Option<Duration>,
    /// How often the eviction sweep runs
    pub sweep_interval: Duration,

    /// Request budget per second for each match (and for match creation)
    pub request_rate_limit: u32,
    /// Seed for the match seed generator
    pub match_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            client_origin: None,
            match_idle_ttl: Some(Duration::from_secs(3600)),
            sweep_interval: Duration::from_secs(60),
            request_rate_limit: 200,
            match_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // PORT (hosting platforms) wins over SERVER_ADDR
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?
        } else if let Ok(addr) = env::var("SERVER_ADDR") {
            addr.parse().map_err(|_| ConfigError::InvalidAddress)?
        } else {
            defaults.server_addr
        };

        let ttl_secs: u64 = parse_var(
            "MATCH_IDLE_TTL_SECS",
            defaults.match_idle_ttl.map_or(0, |d| d.as_secs()),
        )?;
        let sweep_secs: u64 = parse_var("SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs())?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid("SWEEP_INTERVAL_SECS"));
        }
        let request_rate_limit: u32 = parse_var("REQUEST_RATE_LIMIT", defaults.request_rate_limit)?;
        if request_rate_limit == 0 {
            return Err(ConfigError::Invalid("REQUEST_RATE_LIMIT"));
        }

        let match_seed = match env::var("MATCH_SEED") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("MATCH_SEED"))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            server_addr,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            client_origin: env::var("CLIENT_ORIGIN").ok().filter(|s| !s.trim().is_empty()),
            match_idle_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            sweep_interval: Duration::from_secs(sweep_secs),
            request_rate_limit,
            match_seed,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
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
