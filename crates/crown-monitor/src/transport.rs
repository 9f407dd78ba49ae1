//! Backend transport.
//!
//! [`DeviceTransport`] is the seam between the controller's state machine
//! and the wire. The production implementation, [`BackendTransport`],
//! speaks REST to the monitor backend and forwards push commands through
//! an attached event socket. Tests drive the controller with scripted
//! implementations instead.

use std::time::Duration;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::protocol::events::PushCommand;
use crate::protocol::responses::{
    AckResponse, ConnectResponse, RecordingResponse, SessionsResponse, StatusSnapshot,
};
use crate::socket::CommandSender;

/// Operations the controller needs from the backend.
///
/// Every method maps to exactly one REST request or push command; the
/// transport never retries and never interprets responses beyond
/// decoding them.
pub trait DeviceTransport {
    /// `POST /connect`. Runs the backend's device detection, which can
    /// take tens of seconds.
    async fn connect(&mut self) -> MonitorResult<ConnectResponse>;

    /// `POST /disconnect`.
    async fn disconnect(&mut self) -> MonitorResult<AckResponse>;

    /// `POST /start_recording`.
    async fn start_recording(&mut self) -> MonitorResult<RecordingResponse>;

    /// `POST /stop_recording`.
    async fn stop_recording(&mut self) -> MonitorResult<RecordingResponse>;

    /// Send a push command over the event socket.
    async fn send_command(&mut self, command: PushCommand) -> MonitorResult<()>;

    /// `GET /sessions`. Returns the full catalog, newest first.
    async fn fetch_sessions(&mut self) -> MonitorResult<SessionsResponse>;

    /// `GET /status`. Point-in-time backend snapshot.
    async fn fetch_status(&mut self) -> MonitorResult<StatusSnapshot>;

    /// `GET /download/{filename}`. Returns the raw session file bytes.
    async fn download(&mut self, filename: &str) -> MonitorResult<Vec<u8>>;
}

/// REST transport backed by [`reqwest`].
///
/// Push commands travel over the event socket, not REST; attach a
/// [`CommandSender`] once the socket is up, detach it when it goes down.
#[derive(Clone)]
pub struct BackendTransport {
    http: reqwest::Client,
    base_url: String,
    connect_timeout: Duration,
    request_timeout_secs: u64,
    commands: Option<CommandSender>,
}

impl BackendTransport {
    /// Build a transport for the backend described by `config`.
    pub fn new(config: &MonitorConfig) -> MonitorResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_timeout_secs))
            .build()
            .map_err(|e| MonitorError::ConfigError {
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_secs(config.timeouts.connect_timeout_secs),
            request_timeout_secs: config.timeouts.request_timeout_secs,
            commands: None,
        })
    }

    /// Attach the event socket's command channel.
    pub fn attach_socket(&mut self, sender: CommandSender) {
        self.commands = Some(sender);
    }

    /// Drop the command channel, e.g. after the socket closed.
    pub fn detach_socket(&mut self) {
        self.commands = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        timeout: Option<Duration>,
    ) -> MonitorResult<T> {
        let mut request = self.http.post(self.url(path));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|e| self.map_error(e, timeout))?;
        Ok(response.json().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> MonitorResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| self.map_error(e, None))?;
        Ok(response.json().await?)
    }

    /// Attribute timeouts to the per-request deadline actually in effect.
    fn map_error(&self, err: reqwest::Error, timeout: Option<Duration>) -> MonitorError {
        if err.is_timeout() {
            let seconds = timeout
                .map(|t| t.as_secs())
                .unwrap_or(self.request_timeout_secs);
            MonitorError::Timeout { seconds }
        } else {
            MonitorError::Http(err.to_string())
        }
    }
}

impl DeviceTransport for BackendTransport {
    async fn connect(&mut self) -> MonitorResult<ConnectResponse> {
        tracing::debug!(url = %self.url("/connect"), "Requesting headset connection");
        self.post_json("/connect", Some(self.connect_timeout)).await
    }

    async fn disconnect(&mut self) -> MonitorResult<AckResponse> {
        tracing::debug!("Requesting headset disconnection");
        self.post_json("/disconnect", None).await
    }

    async fn start_recording(&mut self) -> MonitorResult<RecordingResponse> {
        tracing::debug!("Requesting recording start");
        self.post_json("/start_recording", None).await
    }

    async fn stop_recording(&mut self) -> MonitorResult<RecordingResponse> {
        tracing::debug!("Requesting recording stop");
        self.post_json("/stop_recording", None).await
    }

    async fn send_command(&mut self, command: PushCommand) -> MonitorResult<()> {
        let Some(sender) = &self.commands else {
            return Err(MonitorError::NotConnected);
        };
        sender.send(command).await
    }

    async fn fetch_sessions(&mut self) -> MonitorResult<SessionsResponse> {
        self.get_json("/sessions").await
    }

    async fn fetch_status(&mut self) -> MonitorResult<StatusSnapshot> {
        self.get_json("/status").await
    }

    async fn download(&mut self, filename: &str) -> MonitorResult<Vec<u8>> {
        let response = self
            .http
            .get(self.url(&format!("/download/{filename}")))
            .send()
            .await
            .map_err(|e| self.map_error(e, None))?;

        if !response.status().is_success() {
            return Err(MonitorError::Backend {
                message: format!("Download of '{filename}' failed: HTTP {}", response.status()),
                help: None,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;

    #[test]
    fn test_url_joining_strips_trailing_slash() {
        let config = MonitorConfig::new("http://localhost:5000/");
        let transport = BackendTransport::new(&config).unwrap();
        assert_eq!(transport.url("/connect"), "http://localhost:5000/connect");
    }

    #[test]
    fn test_connect_timeout_is_separate_from_request_timeout() {
        let config = MonitorConfig::new("http://localhost:5000");
        let transport = BackendTransport::new(&config).unwrap();
        assert_eq!(transport.connect_timeout, Duration::from_secs(35));
        assert_eq!(transport.request_timeout_secs, 10);
    }

    #[tokio::test]
    async fn test_send_command_without_socket_is_rejected() {
        let config = MonitorConfig::new("http://localhost:5000");
        let mut transport = BackendTransport::new(&config).unwrap();
        let err = transport
            .send_command(PushCommand::CheckDeviceStatus)
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::NotConnected));
    }
}
