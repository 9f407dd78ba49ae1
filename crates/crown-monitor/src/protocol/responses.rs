//! REST response payloads.
//!
//! All optional fields default permissively: the backend omits
//! `device_status`, `message`, `error`, and `help` depending on the
//! outcome, and older revisions omit more.

use serde::Deserialize;

use crate::protocol::status::DeviceStatus;

/// `POST /connect` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectResponse {
    pub success: bool,

    /// Device snapshot taken during detection; present on success and on
    /// detection failures.
    pub device_status: Option<DeviceStatus>,

    /// Human-readable success message.
    pub message: Option<String>,

    /// Human-readable failure reason.
    pub error: Option<String>,

    /// Remediation hints accompanying a failure.
    pub help: Option<String>,
}

/// `POST /disconnect` response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AckResponse {
    pub success: bool,
    pub error: Option<String>,
}

/// `POST /start_recording` and `POST /stop_recording` response.
///
/// `recording` is the server's authoritative flag: the client adopts it
/// rather than assuming its request took effect.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordingResponse {
    pub success: bool,
    pub recording: bool,

    /// Name of the finished session file, present after a stop.
    pub session_file: Option<String>,

    pub error: Option<String>,
}

/// `GET /sessions` response: session names, newest first (server order).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionsResponse {
    pub sessions: Vec<String>,
    pub error: Option<String>,
}

/// `GET /status` response: point-in-time snapshot of the backend manager.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusSnapshot {
    pub connected: bool,
    pub recording: bool,
    pub monitoring: bool,
    pub device_status: DeviceStatus,
    pub sessions_count: usize,
    pub connection_health: bool,
    pub last_data_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::status::{BatteryLevel, ValidationState};

    #[test]
    fn test_deserialize_connect_failure_with_help() {
        let json = r#"{
            "success": false,
            "error": "Casque Neurosity Crown NON DÉTECTÉ.",
            "device_status": {"online": false, "signal": "no_biological_data"},
            "help": "Allumez le casque, portez-le, attendez le voyant bleu"
        }"#;

        let resp: ConnectResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.success);
        assert!(resp.error.as_deref().unwrap().contains("NON DÉTECTÉ"));
        assert!(resp.help.is_some());
        assert!(!resp.device_status.unwrap().online);
    }

    #[test]
    fn test_deserialize_connect_success() {
        let json = r#"{
            "success": true,
            "message": "Headset detected and operational",
            "device_status": {
                "online": true,
                "battery": 90,
                "signal": "excellent",
                "validation": "biological_data_confirmed_v2"
            }
        }"#;

        let resp: ConnectResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        let status = resp.device_status.unwrap();
        assert_eq!(status.battery, BatteryLevel::Percent(90));
        assert_eq!(status.validation, ValidationState::Confirmed);
    }

    #[test]
    fn test_deserialize_recording_response() {
        let json = r#"{"success": true, "recording": false, "session_file": "neurosity_session_20240115_093000.csv"}"#;
        let resp: RecordingResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert!(!resp.recording);
        assert_eq!(
            resp.session_file.as_deref(),
            Some("neurosity_session_20240115_093000.csv")
        );
    }

    #[test]
    fn test_deserialize_sessions_response_empty_default() {
        let resp: SessionsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.sessions.is_empty());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_deserialize_status_snapshot() {
        let json = r#"{
            "connected": true,
            "recording": true,
            "monitoring": true,
            "device_status": {"online": true},
            "sessions_count": 12,
            "connection_health": false,
            "last_data_time": "2024-01-15T09:30:00"
        }"#;

        let snapshot: StatusSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.connected && snapshot.recording && snapshot.monitoring);
        assert_eq!(snapshot.sessions_count, 12);
        assert!(!snapshot.connection_health);
    }
}
