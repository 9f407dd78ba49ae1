//! # Connection Controller
//!
//! The state machine behind the dashboard. It reconciles two inputs that
//! can disagree: user commands (connect, record, filter) and asynchronous
//! push events from the backend. Push events are authoritative; whatever
//! the backend last said *is* the state, even when it contradicts an
//! in-flight request.
//!
//! Monitoring transitions are never optimistic. Requesting a monitoring
//! start or stop sends the command and leaves local state untouched; the
//! flag flips only when the backend confirms with `monitoring_started`
//! or `monitoring_stopped`.

use crate::catalog::SessionListStore;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::protocol::events::{PushCommand, PushEvent};
use crate::protocol::responses::{ConnectResponse, RecordingResponse, StatusSnapshot};
use crate::protocol::status::DeviceStatus;
use crate::transport::DeviceTransport;

// ─── State ──────────────────────────────────────────────────────────────

/// Connection lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No headset connection.
    #[default]
    Disconnected,

    /// A connect request is in flight. Device detection on the backend
    /// can take tens of seconds.
    Connecting,

    /// Headset connected and detected.
    Connected,
}

/// Observable client state.
///
/// Invariants maintained by [`ConnectionController`]:
/// - `monitoring` implies `phase == Connected`
/// - `recording` implies `phase == Connected`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,

    /// Backend is actively streaming device data.
    pub monitoring: bool,

    /// A recording session is in progress.
    pub recording: bool,

    /// `false` after a `connection_warning`, `true` again after
    /// `connection_restored`. Health is advisory and never changes the
    /// connection phase.
    pub healthy: bool,

    /// Latest device snapshot from any source.
    pub device_status: DeviceStatus,

    /// Message from the most recent unresolved `connection_warning`.
    pub last_warning: Option<String>,
}

impl ConnectionState {
    fn disconnected() -> Self {
        Self {
            phase: ConnectionPhase::Disconnected,
            monitoring: false,
            recording: false,
            healthy: true,
            device_status: DeviceStatus::offline(),
            last_warning: None,
        }
    }
}

// ─── Controller ─────────────────────────────────────────────────────────

/// Drives the monitor backend and holds the reconciled client state.
///
/// Generic over [`DeviceTransport`] so the full command/event matrix can
/// be exercised against scripted transports in tests.
pub struct ConnectionController<T: DeviceTransport> {
    transport: T,
    state: ConnectionState,
    sessions: SessionListStore,
}

impl<T: DeviceTransport> ConnectionController<T> {
    /// Create a controller in the disconnected state.
    pub fn new(transport: T, config: &MonitorConfig) -> Self {
        Self {
            transport,
            state: ConnectionState::disconnected(),
            sessions: SessionListStore::new(config.sessions.page_size),
        }
    }

    /// Current reconciled state.
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// The session list store.
    pub fn sessions(&self) -> &SessionListStore {
        &self.sessions
    }

    /// Mutable session list store, for filtering and pagination.
    pub fn sessions_mut(&mut self) -> &mut SessionListStore {
        &mut self.sessions
    }

    pub fn is_connected(&self) -> bool {
        self.state.phase == ConnectionPhase::Connected
    }

    pub fn is_recording(&self) -> bool {
        self.state.recording
    }

    pub fn is_monitoring(&self) -> bool {
        self.state.monitoring
    }

    // ─── Connection lifecycle ───────────────────────────────────────

    /// Connect to the headset.
    ///
    /// Rejected locally, without any network traffic, when already
    /// connected or while a previous connect is still in flight. On
    /// success the controller immediately requests monitoring; the
    /// monitoring flag itself stays down until the backend confirms.
    pub async fn connect(&mut self) -> MonitorResult<ConnectResponse> {
        match self.state.phase {
            ConnectionPhase::Connected => return Err(MonitorError::AlreadyConnected),
            ConnectionPhase::Connecting => return Err(MonitorError::ConnectInFlight),
            ConnectionPhase::Disconnected => {}
        }

        self.state.phase = ConnectionPhase::Connecting;
        tracing::info!("Connecting to headset");

        let response = match self.transport.connect().await {
            Ok(response) => response,
            Err(e) => {
                self.state.phase = ConnectionPhase::Disconnected;
                return Err(e);
            }
        };

        if let Some(status) = &response.device_status {
            self.state.device_status = status.clone();
        }

        if !response.success {
            self.state.phase = ConnectionPhase::Disconnected;
            tracing::warn!(error = ?response.error, "Headset connection refused");
            return Err(MonitorError::from_backend(
                response.error.clone(),
                response.help.clone(),
            ));
        }

        self.state.phase = ConnectionPhase::Connected;
        self.state.healthy = true;
        self.state.last_warning = None;
        tracing::info!("Headset connected");

        // Monitoring starts automatically after a connect. A failed
        // command is not fatal; the user can retry from the dashboard.
        if let Err(e) = self.transport.send_command(PushCommand::StartMonitoring).await {
            tracing::warn!(error = %e, "Failed to request monitoring start");
        }

        Ok(response)
    }

    /// Disconnect from the headset.
    ///
    /// Rejected locally when not connected. Monitoring is asked to stop
    /// first; state resets only once the backend acknowledges the
    /// disconnect, so a failed request leaves everything as it was.
    pub async fn disconnect(&mut self) -> MonitorResult<()> {
        if self.state.phase != ConnectionPhase::Connected {
            return Err(MonitorError::NotConnected);
        }

        if self.state.monitoring {
            if let Err(e) = self.transport.send_command(PushCommand::StopMonitoring).await {
                tracing::warn!(error = %e, "Failed to request monitoring stop");
            }
        }

        let response = self.transport.disconnect().await?;
        if !response.success {
            return Err(MonitorError::from_backend(response.error, None));
        }

        self.state = ConnectionState::disconnected();
        tracing::info!("Headset disconnected");
        Ok(())
    }

    // ─── Recording ──────────────────────────────────────────────────

    /// Toggle recording: start when idle, stop when recording.
    ///
    /// Requires a connection. The local flag adopts the server's
    /// authoritative `recording` field from the response rather than
    /// assuming the request took effect.
    pub async fn toggle_recording(&mut self) -> MonitorResult<RecordingResponse> {
        if self.state.phase != ConnectionPhase::Connected {
            return Err(MonitorError::NotConnected);
        }

        let response = if self.state.recording {
            self.transport.stop_recording().await?
        } else {
            self.transport.start_recording().await?
        };

        self.state.recording = response.recording;

        if !response.success {
            return Err(MonitorError::from_backend(response.error.clone(), None));
        }

        if let Some(file) = &response.session_file {
            tracing::info!(session_file = %file, "Recording saved");
        }
        Ok(response)
    }

    // ─── Monitoring ─────────────────────────────────────────────────

    /// Request a monitoring start. State changes only on confirmation.
    ///
    /// A no-op when monitoring is already active; rejected locally when
    /// not connected.
    pub async fn start_monitoring(&mut self) -> MonitorResult<()> {
        if self.state.monitoring {
            tracing::debug!("Monitoring already active, nothing to request");
            return Ok(());
        }
        if self.state.phase != ConnectionPhase::Connected {
            return Err(MonitorError::NotConnected);
        }
        self.transport.send_command(PushCommand::StartMonitoring).await
    }

    /// Request a monitoring stop. State changes only on confirmation.
    ///
    /// A no-op when monitoring is already inactive.
    pub async fn stop_monitoring(&mut self) -> MonitorResult<()> {
        if !self.state.monitoring {
            tracing::debug!("Monitoring already stopped, nothing to request");
            return Ok(());
        }
        self.transport.send_command(PushCommand::StopMonitoring).await
    }

    /// Request an on-demand device status report. The answer arrives as
    /// a `device_status_response` push event.
    pub async fn check_device_status(&mut self) -> MonitorResult<()> {
        if self.state.phase != ConnectionPhase::Connected {
            return Err(MonitorError::NotConnected);
        }
        self.transport.send_command(PushCommand::CheckDeviceStatus).await
    }

    // ─── Push event reconciliation ──────────────────────────────────

    /// Apply a push event to local state.
    ///
    /// Events overwrite unconditionally: the backend's word beats any
    /// local assumption, including state set by a request still in
    /// flight. Derived flags are clamped so that `monitoring` and
    /// `recording` can never be up while disconnected.
    pub fn apply_event(&mut self, event: PushEvent) {
        match event {
            PushEvent::Status(status) => {
                self.set_connected(status.connected);
                self.state.monitoring = status.monitoring && status.connected;
                self.state.recording = status.recording && status.connected;
                self.state.device_status = status.device_status;
            }
            PushEvent::StatusUpdate(update) => {
                self.set_connected(update.connected);
                self.state.monitoring = update.monitoring && update.connected;
                if !update.connected {
                    self.state.recording = false;
                }
                self.state.device_status = update.device_status;
            }
            PushEvent::MonitoringStarted => {
                if self.state.phase == ConnectionPhase::Connected {
                    self.state.monitoring = true;
                    tracing::info!("Monitoring started");
                } else {
                    tracing::warn!("Ignoring monitoring_started while disconnected");
                }
            }
            PushEvent::MonitoringStopped => {
                self.state.monitoring = false;
                tracing::info!("Monitoring stopped");
            }
            PushEvent::ConnectionWarning { message } => {
                tracing::warn!(%message, "Connection warning");
                self.state.healthy = false;
                self.state.last_warning = Some(message);
            }
            PushEvent::ConnectionRestored { message } => {
                tracing::info!(%message, "Connection restored");
                self.state.healthy = true;
                self.state.last_warning = None;
            }
            PushEvent::DeviceStatusResponse(status) => {
                self.state.device_status = status;
            }
            PushEvent::BackendError { message } => {
                tracing::warn!(%message, "Backend reported an error");
            }
        }
    }

    fn set_connected(&mut self, connected: bool) {
        self.state.phase = if connected {
            ConnectionPhase::Connected
        } else {
            ConnectionPhase::Disconnected
        };
    }

    // ─── Sessions ───────────────────────────────────────────────────

    /// Fetch the session catalog and replace the store's contents.
    ///
    /// Works regardless of connection state; recorded sessions remain
    /// browsable with the headset off.
    pub async fn refresh_sessions(&mut self) -> MonitorResult<usize> {
        let response = self.transport.fetch_sessions().await?;
        if let Some(error) = response.error {
            return Err(MonitorError::from_backend(Some(error), None));
        }
        let total = response.sessions.len();
        self.sessions.load_catalog(response.sessions);
        Ok(total)
    }

    /// Download a recorded session file.
    pub async fn download_session(&mut self, filename: &str) -> MonitorResult<Vec<u8>> {
        self.transport.download(filename).await
    }

    // ─── Status snapshot ────────────────────────────────────────────

    /// Fetch the backend's status snapshot and reconcile local state
    /// with it. Snapshots are as authoritative as push events.
    pub async fn refresh_status(&mut self) -> MonitorResult<StatusSnapshot> {
        let snapshot = self.transport.fetch_status().await?;

        self.set_connected(snapshot.connected);
        self.state.monitoring = snapshot.monitoring && snapshot.connected;
        self.state.recording = snapshot.recording && snapshot.connected;
        self.state.healthy = snapshot.connection_health;
        self.state.device_status = snapshot.device_status.clone();

        Ok(snapshot)
    }
}
