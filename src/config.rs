use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

/// Application-level constants
pub const APP_NAME: &str = "Turnos";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Period of the reminder scan.
pub const REMINDER_INTERVAL: Duration = Duration::from_secs(2);

/// A reminder older than this is missed, never notified late.
pub const REMINDER_WINDOW_SECS: i64 = 5 * 60;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Argentina::Buenos_Aires;

pub const ENV_DB_PATH: &str = "TURNOS_DB_PATH";
pub const ENV_BIND_ADDR: &str = "TURNOS_BIND_ADDR";
pub const ENV_TIMEZONE: &str = "TURNOS_TIMEZONE";

/// Get the application data directory
/// ~/Turnos/ on all platforms; falls back to the working directory when
/// no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_db_path() -> PathBuf {
    app_data_dir().join("turnos.db")
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "turnos=info,turnos_lib=info,tower_http=info".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address '{value}': {reason}")]
    BindAddr { value: String, reason: String },
    #[error("Unknown time zone '{0}'")]
    TimeZone(String),
}

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub timezone: Tz,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = non_empty(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let raw_addr = non_empty(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::BindAddr {
                value: raw_addr.clone(),
                reason: e.to_string(),
            })?;

        let timezone = match non_empty(ENV_TIMEZONE) {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|_| ConfigError::TimeZone(name.clone()))?,
            None => DEFAULT_TIMEZONE,
        };

        Ok(Self {
            db_path,
            bind_addr,
            timezone,
        })
    }
}
