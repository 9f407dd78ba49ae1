//! Push events and push commands.
//!
//! The backend pushes status over the event socket at any time, solicited
//! or not. [`PushEvent::parse`] is the explicit dispatch table from event
//! name to typed payload, so the controller's transition set can be
//! exercised without a live socket.

use serde::Deserialize;

use crate::error::{MonitorError, MonitorResult};
use crate::protocol::status::DeviceStatus;

/// Known push event names.
pub struct Events;

impl Events {
    /// Full status snapshot, sent on socket connect.
    pub const STATUS: &'static str = "status";

    /// Incremental status refresh pushed by the backend.
    pub const STATUS_UPDATE: &'static str = "status_update";

    /// Monitoring start confirmed.
    pub const MONITORING_STARTED: &'static str = "monitoring_started";

    /// Monitoring stop confirmed.
    pub const MONITORING_STOPPED: &'static str = "monitoring_stopped";

    /// No data received recently; connection health degraded.
    pub const CONNECTION_WARNING: &'static str = "connection_warning";

    /// Data flow resumed; connection health restored.
    pub const CONNECTION_RESTORED: &'static str = "connection_restored";

    /// Reply to a `check_device_status` command.
    pub const DEVICE_STATUS_RESPONSE: &'static str = "device_status_response";

    /// Backend-side error report.
    pub const ERROR: &'static str = "error";
}

/// Known client-initiated push command names.
pub struct Commands;

impl Commands {
    pub const START_MONITORING: &'static str = "start_monitoring";
    pub const STOP_MONITORING: &'static str = "stop_monitoring";
    pub const CHECK_DEVICE_STATUS: &'static str = "check_device_status";
}

// ─── Payloads ───────────────────────────────────────────────────────────

/// Full status snapshot (`status` event).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatusEvent {
    pub connected: bool,
    pub recording: bool,
    pub monitoring: bool,
    pub device_status: DeviceStatus,
}

/// Incremental status refresh (`status_update` event). Carries no
/// recording flag; recording state is only authoritative in full
/// snapshots and recording responses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StatusUpdateEvent {
    pub connected: bool,
    pub monitoring: bool,
    pub device_status: DeviceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct MessagePayload {
    message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct DeviceStatusPayload {
    device_status: DeviceStatus,
}

// ─── Dispatch ───────────────────────────────────────────────────────────

/// A server-initiated push event, parsed and typed.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// Full authoritative snapshot.
    Status(StatusEvent),
    /// Partial authoritative refresh.
    StatusUpdate(StatusUpdateEvent),
    /// Monitoring confirmed active.
    MonitoringStarted,
    /// Monitoring confirmed stopped.
    MonitoringStopped,
    /// Health degraded (stale data); does not change connection state.
    ConnectionWarning { message: String },
    /// Health restored.
    ConnectionRestored { message: String },
    /// Device status answer to a poll.
    DeviceStatusResponse(DeviceStatus),
    /// Backend error report; informational only.
    BackendError { message: String },
}

impl PushEvent {
    /// Dispatch an event name + JSON payload to a typed event.
    ///
    /// Returns `Ok(None)` for event names this client does not handle
    /// (the backend also streams chart data on the same socket), and
    /// `Err` only when a *known* event carries an undecodable payload.
    pub fn parse(name: &str, payload: serde_json::Value) -> MonitorResult<Option<Self>> {
        let event = match name {
            Events::STATUS => Some(PushEvent::Status(decode(name, payload)?)),
            Events::STATUS_UPDATE => Some(PushEvent::StatusUpdate(decode(name, payload)?)),
            Events::MONITORING_STARTED => Some(PushEvent::MonitoringStarted),
            Events::MONITORING_STOPPED => Some(PushEvent::MonitoringStopped),
            Events::CONNECTION_WARNING => {
                let p: MessagePayload = decode(name, payload)?;
                Some(PushEvent::ConnectionWarning { message: p.message })
            }
            Events::CONNECTION_RESTORED => {
                let p: MessagePayload = decode(name, payload)?;
                Some(PushEvent::ConnectionRestored { message: p.message })
            }
            Events::DEVICE_STATUS_RESPONSE => {
                let p: DeviceStatusPayload = decode(name, payload)?;
                Some(PushEvent::DeviceStatusResponse(p.device_status))
            }
            Events::ERROR => {
                let p: MessagePayload = decode(name, payload)?;
                Some(PushEvent::BackendError { message: p.message })
            }
            other => {
                tracing::trace!(event = other, "Ignoring unhandled push event");
                None
            }
        };
        Ok(event)
    }

    /// The wire name this event arrived under.
    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::Status(_) => Events::STATUS,
            PushEvent::StatusUpdate(_) => Events::STATUS_UPDATE,
            PushEvent::MonitoringStarted => Events::MONITORING_STARTED,
            PushEvent::MonitoringStopped => Events::MONITORING_STOPPED,
            PushEvent::ConnectionWarning { .. } => Events::CONNECTION_WARNING,
            PushEvent::ConnectionRestored { .. } => Events::CONNECTION_RESTORED,
            PushEvent::DeviceStatusResponse(_) => Events::DEVICE_STATUS_RESPONSE,
            PushEvent::BackendError { .. } => Events::ERROR,
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    name: &str,
    payload: serde_json::Value,
) -> MonitorResult<T> {
    serde_json::from_value(payload).map_err(|e| MonitorError::ProtocolError {
        reason: format!("Failed to parse '{name}' payload: {e}"),
    })
}

// ─── Commands ───────────────────────────────────────────────────────────

/// A client-initiated push command sent over the event socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushCommand {
    StartMonitoring,
    StopMonitoring,
    CheckDeviceStatus,
}

impl PushCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushCommand::StartMonitoring => Commands::START_MONITORING,
            PushCommand::StopMonitoring => Commands::STOP_MONITORING,
            PushCommand::CheckDeviceStatus => Commands::CHECK_DEVICE_STATUS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::status::SignalQuality;
    use serde_json::json;

    #[test]
    fn test_parse_status_event() {
        let payload = json!({
            "connected": true,
            "recording": false,
            "monitoring": true,
            "device_status": {"online": true, "signal": "good"}
        });

        let event = PushEvent::parse(Events::STATUS, payload).unwrap().unwrap();
        match event {
            PushEvent::Status(status) => {
                assert!(status.connected);
                assert!(status.monitoring);
                assert!(!status.recording);
                assert_eq!(status.device_status.signal, SignalQuality::Good);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_status_update_without_device_status() {
        let payload = json!({"connected": true, "monitoring": false});
        let event = PushEvent::parse(Events::STATUS_UPDATE, payload)
            .unwrap()
            .unwrap();
        match event {
            PushEvent::StatusUpdate(update) => {
                assert!(update.connected);
                assert!(!update.monitoring);
                assert_eq!(update.device_status, DeviceStatus::default());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_payloadless_confirmations() {
        let started = PushEvent::parse(Events::MONITORING_STARTED, json!({"success": true}))
            .unwrap()
            .unwrap();
        assert_eq!(started, PushEvent::MonitoringStarted);

        let stopped = PushEvent::parse(Events::MONITORING_STOPPED, json!({}))
            .unwrap()
            .unwrap();
        assert_eq!(stopped, PushEvent::MonitoringStopped);
    }

    #[test]
    fn test_parse_health_and_error_messages() {
        let warning = PushEvent::parse(
            Events::CONNECTION_WARNING,
            json!({"message": "no data for 30s", "time_since_data": 31.2}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            warning,
            PushEvent::ConnectionWarning {
                message: "no data for 30s".into()
            }
        );

        let error = PushEvent::parse(Events::ERROR, json!({"message": "boom"}))
            .unwrap()
            .unwrap();
        assert_eq!(error, PushEvent::BackendError { message: "boom".into() });
    }

    #[test]
    fn test_parse_unknown_event_is_ignored() {
        let parsed = PushEvent::parse("brainwaves_data", json!({"alpha": [0.4]})).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_event_names_round_trip() {
        let events = [
            PushEvent::MonitoringStarted,
            PushEvent::MonitoringStopped,
            PushEvent::Status(StatusEvent::default()),
        ];
        for event in events {
            let reparsed = PushEvent::parse(event.name(), json!({})).unwrap().unwrap();
            assert_eq!(reparsed.name(), event.name());
        }
    }

    #[test]
    fn test_command_names() {
        assert_eq!(PushCommand::StartMonitoring.as_str(), "start_monitoring");
        assert_eq!(PushCommand::StopMonitoring.as_str(), "stop_monitoring");
        assert_eq!(
            PushCommand::CheckDeviceStatus.as_str(),
            "check_device_status"
        );
    }
}
