//! # Error Types
//!
//! Semantic error types for the Crown monitor client. Every variant carries
//! enough context to diagnose the problem without digging through logs.
//!
//! Failures fall into three classes: transport errors (fetch rejected,
//! socket dropped), backend-reported logical failures (`success: false`
//! with `error`/`help` text, surfaced verbatim), and local precondition
//! rejects that never touch the network. Malformed optional payload fields
//! are *not* errors; they default permissively in [`crate::protocol::status`].

use thiserror::Error;

/// Convenient Result alias for monitor operations.
pub type MonitorResult<T> = std::result::Result<T, MonitorError>;

/// All errors that can occur when driving the Crown monitor backend.
#[derive(Error, Debug)]
pub enum MonitorError {
    // ─── Connection ─────────────────────────────────────────────────
    /// Failed to establish a connection to the backend.
    #[error("Failed to connect to the monitor backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The event socket was lost after being established.
    #[error("Connection to the monitor backend lost: {reason}")]
    ConnectionLost { reason: String },

    /// The headset is not connected; the operation requires a connection.
    #[error("Headset not connected")]
    NotConnected,

    /// A connect was requested while already connected.
    #[error("Headset already connected")]
    AlreadyConnected,

    /// A connect was requested while a previous connect is still in flight.
    #[error("A connect attempt is already in progress")]
    ConnectInFlight,

    // ─── Backend ────────────────────────────────────────────────────
    /// The backend answered the request but reported a logical failure.
    ///
    /// `message` and `help` are relayed verbatim from the response.
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        help: Option<String>,
    },

    // ─── Timeout ────────────────────────────────────────────────────
    /// An operation timed out waiting for a response.
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    // ─── Protocol ───────────────────────────────────────────────────
    /// Received an unexpected or malformed message from the backend.
    #[error("Protocol error: {reason}")]
    ProtocolError { reason: String },

    // ─── Config ─────────────────────────────────────────────────────
    /// Configuration file error (missing, malformed, or invalid values).
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    // ─── Transport ──────────────────────────────────────────────────
    /// Low-level WebSocket transport error on the event socket.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// HTTP transport error on a REST request.
    #[error("HTTP error: {0}")]
    Http(String),

    // ─── I/O ────────────────────────────────────────────────────────
    /// Filesystem or I/O error (config file reading, downloads, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MonitorError {
    /// Build a [`MonitorError::Backend`] from a response's optional
    /// `error`/`help` fields.
    pub fn from_backend(error: Option<String>, help: Option<String>) -> Self {
        MonitorError::Backend {
            message: error.unwrap_or_else(|| "unknown backend error".into()),
            help,
        }
    }

    /// Returns `true` if this error is transient and the operation can be
    /// retried by the user. Retries are never automatic.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MonitorError::ConnectionLost { .. }
                | MonitorError::Timeout { .. }
                | MonitorError::WebSocket(_)
                | MonitorError::Http(_)
        )
    }

    /// Returns `true` if this error indicates the transport is dead and a
    /// fresh connection is needed.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            MonitorError::ConnectionFailed { .. }
                | MonitorError::ConnectionLost { .. }
                | MonitorError::NotConnected
                | MonitorError::WebSocket(_)
        )
    }

    /// Returns `true` if the error was raised locally before any network
    /// request was issued (precondition rejects).
    pub fn is_local_reject(&self) -> bool {
        matches!(
            self,
            MonitorError::NotConnected
                | MonitorError::AlreadyConnected
                | MonitorError::ConnectInFlight
        )
    }
}

// ─── From impls for external error types ────────────────────────────────

impl From<tokio_tungstenite::tungstenite::Error> for MonitorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        MonitorError::WebSocket(err.to_string())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MonitorError::Timeout { seconds: 0 }
        } else {
            MonitorError::Http(err.to_string())
        }
    }
}

#[cfg(feature = "config-toml")]
impl From<toml::de::Error> for MonitorError {
    fn from(err: toml::de::Error) -> Self {
        MonitorError::ConfigError {
            reason: err.to_string(),
        }
    }
}
