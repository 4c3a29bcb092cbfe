//! Process configuration, read from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `CATALOG_BIND_ADDR` | `0.0.0.0:8080` |
//! | `DATABASE_URL` | unset: in-memory store |
//! | `CATALOG_LOG_FORMAT` | `json` (`json` or `pretty`) |

use std::net::SocketAddr;

use catalog_observability::LogFormat;
use thiserror::Error;

pub const BIND_ADDR_VAR: &str = "CATALOG_BIND_ADDR";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const LOG_FORMAT_VAR: &str = "CATALOG_LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value} is not a socket address: {source}")]
    InvalidBindAddr {
        var: &'static str,
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("{var}: {reason}")]
    InvalidLogFormat { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    /// SQLite URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub log_format: LogFormat,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = raw_addr
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                var: BIND_ADDR_VAR,
                value: raw_addr.clone(),
                source,
            })?;

        let database_url = lookup(DATABASE_URL_VAR).filter(|url| !url.trim().is_empty());

        let log_format = match lookup(LOG_FORMAT_VAR) {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|reason| ConfigError::InvalidLogFormat {
                    var: LOG_FORMAT_VAR,
                    reason,
                })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            database_url,
            log_format,
        })
    }

    /// In-memory store on an ephemeral localhost port.
    pub fn in_memory() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: None,
            log_format: LogFormat::Pretty,
        }
    }
}
