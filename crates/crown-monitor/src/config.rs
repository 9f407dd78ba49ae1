//! # Configuration
//!
//! [`MonitorConfig`] holds everything needed to reach the monitor backend.
//!
//! ## Loading Priority
//!
//! 1. Explicit struct fields (programmatic construction)
//! 2. Environment variables (`CROWN_BASE_URL`, `CROWN_SOCKET_URL`)
//! 3. TOML config file at an explicit path
//! 4. `./crown-monitor.toml` in the current directory
//! 5. `~/.config/crown-monitor/config.toml`
//!
//! Environment variables always override file values.

use serde::{Deserialize, Serialize};
#[cfg(feature = "config-toml")]
use std::path::{Path, PathBuf};

#[cfg(feature = "config-toml")]
use crate::error::{MonitorError, MonitorResult};

/// Default REST endpoint root of the monitor backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default request timeout for REST calls, in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default timeout for the connect request, in seconds.
///
/// Device detection on the backend collects live data for up to 20 seconds
/// before it decides; 35 leaves margin for the round trip.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 35;

/// Default device-status poll interval, in seconds.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default number of sessions materialized per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Configuration for the Crown monitor client.
///
/// # Examples
///
/// ```
/// use crown_monitor::config::MonitorConfig;
///
/// let config = MonitorConfig::new("http://localhost:5000");
/// assert_eq!(config.socket_url, "ws://localhost:5000/events");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// REST endpoint root (`/connect`, `/sessions`, ...).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Push-event socket endpoint. Derived from `base_url` when absent.
    #[serde(default)]
    pub socket_url: String,

    /// Timeout configuration.
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Periodic device-status poll configuration.
    #[serde(default)]
    pub status_poll: StatusPollConfig,

    /// Session list configuration.
    #[serde(default)]
    pub sessions: SessionListConfig,
}

/// Timeout settings for backend requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Timeout for ordinary REST calls, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for the connect request, in seconds. Connecting runs the
    /// backend's device detection and takes much longer than other calls.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Periodic `check_device_status` poll while connected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPollConfig {
    /// Enable the background poll.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interval between polls, in seconds.
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,
}

/// Session list pagination configuration.
///
/// Recognized option: `page_size`, the number of items materialized per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

// ─── Defaults ───────────────────────────────────────────────────────────

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Default for StatusPollConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl Default for SessionListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

// ─── MonitorConfig impl ────────────────────────────────────────────────

impl MonitorConfig {
    /// Create a config pointing at `base_url` with defaults everywhere else.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let socket_url = derive_socket_url(&base_url);
        Self {
            base_url,
            socket_url,
            timeouts: TimeoutConfig::default(),
            status_poll: StatusPollConfig::default(),
            sessions: SessionListConfig::default(),
        }
    }

    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized: `CROWN_BASE_URL`, `CROWN_SOCKET_URL`.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("CROWN_BASE_URL") {
            Ok(url) => Self::new(url),
            Err(_) => Self::default(),
        };
        if let Ok(url) = std::env::var("CROWN_SOCKET_URL") {
            config.socket_url = url;
        }
        config
    }

    /// Load config from a TOML file, with environment variable overrides.
    #[cfg(feature = "config-toml")]
    pub fn from_file(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| MonitorError::ConfigError {
            reason: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;
        let mut config: Self = toml::from_str(&contents)?;

        if config.socket_url.is_empty() {
            config.socket_url = derive_socket_url(&config.base_url);
        }

        // Environment variable overrides
        if let Ok(url) = std::env::var("CROWN_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(url) = std::env::var("CROWN_SOCKET_URL") {
            config.socket_url = url;
        }

        Ok(config)
    }

    /// Discover and load config from the standard search path:
    ///
    /// 1. Explicit path (if `Some`)
    /// 2. `CROWN_MONITOR_CONFIG` environment variable
    /// 3. `./crown-monitor.toml`
    /// 4. `~/.config/crown-monitor/config.toml`
    ///
    /// Falls back to environment-variable-only config if no file is found.
    #[cfg(feature = "config-toml")]
    pub fn discover(explicit_path: Option<&Path>) -> MonitorResult<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var("CROWN_MONITOR_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        let local_path = PathBuf::from("crown-monitor.toml");
        if local_path.exists() {
            return Self::from_file(&local_path);
        }

        if let Some(home_path) = dirs_config_path() {
            if home_path.exists() {
                return Self::from_file(&home_path);
            }
        }

        Ok(Self::from_env())
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

/// Derive the event socket URL from the REST root: `http(s)` becomes
/// `ws(s)` and `/events` is appended.
fn derive_socket_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    let ws = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        trimmed.to_string()
    };
    format!("{ws}/events")
}

/// Platform-appropriate config file path.
#[cfg(feature = "config-toml")]
fn dirs_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|dir| PathBuf::from(dir).join("crown-monitor").join("config.toml"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(|dir| {
            PathBuf::from(dir)
                .join(".config")
                .join("crown-monitor")
                .join("config.toml")
        })
    }
}
