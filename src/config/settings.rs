//! Process settings read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};

/// Runtime settings for the server process.
///
/// Values come from environment variables, optionally seeded from a `.env`
/// file. Every setting has a default.
///
/// | Variable | Default |
/// |---|---|
/// | `REPERTOIRE_HOST` | `0.0.0.0` |
/// | `REPERTOIRE_PORT` | `8080` |
/// | `REPERTOIRE_CONFIG_DIR` | `./config/au` |
/// | `PERMISSION_CACHE_TTL_SECS` | `300` |
/// | `LOGIN_MAX_ATTEMPTS` | `5` |
/// | `LOGIN_WINDOW_SECS` | `300` |
/// | `LOGIN_BLOCK_SECS` | `900` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Directory holding the YAML rule files.
    pub config_dir: PathBuf,
    /// How long permission decisions are cached.
    pub permission_cache_ttl: Duration,
    /// Failed logins allowed within the window before blocking.
    pub login_max_attempts: u32,
    /// Window over which failed logins are counted.
    pub login_window: Duration,
    /// How long a blocked key stays blocked.
    pub login_block: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            config_dir: PathBuf::from("./config/au"),
            permission_cache_ttl: Duration::from_secs(300),
            login_max_attempts: 5,
            login_window: Duration::from_secs(300),
            login_block: Duration::from_secs(900),
        }
    }
}

impl Settings {
    /// Reads settings from the process environment, loading `.env` first if present.
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> EngineResult<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: lookup("REPERTOIRE_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "REPERTOIRE_PORT")?.unwrap_or(defaults.port),
            config_dir: lookup("REPERTOIRE_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_dir),
            permission_cache_ttl: parse_var(&lookup, "PERMISSION_CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.permission_cache_ttl),
            login_max_attempts: parse_var(&lookup, "LOGIN_MAX_ATTEMPTS")?
                .unwrap_or(defaults.login_max_attempts),
            login_window: parse_var(&lookup, "LOGIN_WINDOW_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.login_window),
            login_block: parse_var(&lookup, "LOGIN_BLOCK_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.login_block),
        })
    }

    /// The `host:port` address to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> EngineResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| EngineError::InvalidSetting {
                name: name.to_string(),
                message: format!("'{}': {}", raw, e),
            })
        })
        .transpose()
}
