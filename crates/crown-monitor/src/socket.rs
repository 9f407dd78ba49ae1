//! # Event Socket
//!
//! Push channel to the monitor backend. The backend emits status events
//! at any time, solicited or not, and accepts a small set of commands
//! (`start_monitoring`, `stop_monitoring`, `check_device_status`) on the
//! same connection.
//!
//! ## Architecture
//!
//! The WebSocket connection is split into reader/writer halves using
//! `tokio-tungstenite`'s `StreamExt::split()`:
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                  EventSocket                    │
//! │                                                 │
//! │  writer: Arc<Mutex<SplitSink>> ◄── CommandSender│
//! │                                                 │
//! │  reader_loop (spawned task):                    │
//! │    SplitStream ──► PushEvent ──► events mpsc    │
//! │                                                 │
//! │  StatusPoll (spawned task):                     │
//! │    interval ──► check_device_status command     │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! Frames are JSON text messages of the form `{"event": "...", "data":
//! {...}}` in both directions. Malformed inbound frames are logged and
//! skipped; they never tear the socket down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

use crate::config::StatusPollConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::protocol::events::{PushCommand, PushEvent};

/// Timeout for the WebSocket handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Channel buffer size for inbound push events.
const EVENT_CHANNEL_BUFFER: usize = 64;

/// Type alias for the write half of the WebSocket connection.
type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Type alias for the read half of the WebSocket connection.
type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A single JSON frame on the event socket, either direction.
#[derive(Debug, Serialize, Deserialize)]
struct WireFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

// ─── CommandSender ──────────────────────────────────────────────────────

/// Cloneable handle for sending push commands over the event socket.
///
/// The writer half is shared behind `Arc<Mutex>` so commands can be sent
/// from the transport, the status poll, and the controller concurrently.
#[derive(Clone)]
pub struct CommandSender {
    writer: Arc<Mutex<WsWriter>>,
}

impl CommandSender {
    /// Send a push command. Commands carry no payload.
    pub async fn send(&self, command: PushCommand) -> MonitorResult<()> {
        let frame = WireFrame {
            event: command.as_str().to_string(),
            data: serde_json::Value::Object(serde_json::Map::new()),
        };
        let text = serde_json::to_string(&frame)?;
        tracing::debug!(command = command.as_str(), "Sending push command");

        let mut writer = self.writer.lock().await;
        writer.send(Message::text(text)).await?;
        Ok(())
    }
}

// ─── EventSocket ────────────────────────────────────────────────────────

/// The push-event connection to the monitor backend.
///
/// Connecting spawns a background reader task that decodes inbound
/// frames into [`PushEvent`]s and forwards them on an mpsc channel.
/// When the socket closes or errors, the reader exits and the channel
/// ends; callers observe this as `recv()` returning `None`.
pub struct EventSocket {
    writer: Arc<Mutex<WsWriter>>,
    events: mpsc::Receiver<PushEvent>,
    reader_handle: Option<JoinHandle<()>>,
    reader_running: Arc<AtomicBool>,
}

impl EventSocket {
    /// Connect to the backend's event socket.
    pub async fn connect(socket_url: &str) -> MonitorResult<Self> {
        let connect_fut = connect_async(socket_url);
        let (ws, response) = tokio::time::timeout(HANDSHAKE_TIMEOUT, connect_fut)
            .await
            .map_err(|_| MonitorError::Timeout {
                seconds: HANDSHAKE_TIMEOUT.as_secs(),
            })?
            .map_err(|e| MonitorError::ConnectionFailed {
                url: socket_url.to_string(),
                reason: format!("WebSocket connection failed: {e}"),
            })?;

        tracing::info!(url = socket_url, status = %response.status(), "Event socket connected");

        let (writer, reader) = ws.split();
        let writer = Arc::new(Mutex::new(writer));

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let reader_running = Arc::new(AtomicBool::new(true));
        let reader_handle =
            Self::spawn_reader_loop(reader, event_tx, Arc::clone(&reader_running));

        Ok(Self {
            writer,
            events: event_rx,
            reader_handle: Some(reader_handle),
            reader_running,
        })
    }

    /// Handle for sending push commands on this socket.
    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            writer: Arc::clone(&self.writer),
        }
    }

    /// Receive the next push event.
    ///
    /// Returns `None` once the socket has closed and all buffered events
    /// have been drained.
    pub async fn recv(&mut self) -> Option<PushEvent> {
        self.events.recv().await
    }

    /// Whether the reader loop is still running.
    pub fn is_running(&self) -> bool {
        self.reader_running.load(Ordering::SeqCst)
    }

    /// Close the socket gracefully and stop the reader.
    pub async fn close(&mut self) {
        self.reader_running.store(false, Ordering::SeqCst);
        {
            let mut writer = self.writer.lock().await;
            let _ = writer.send(Message::Close(None)).await;
        }
        if let Some(handle) = self.reader_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
        }
        tracing::info!("Event socket closed");
    }

    fn spawn_reader_loop(
        mut reader: WsReader,
        event_tx: mpsc::Sender<PushEvent>,
        running: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let Some(message) = reader.next().await else {
                    tracing::warn!("Event socket stream ended");
                    break;
                };

                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!(error = %e, "Event socket read error");
                        break;
                    }
                };

                match message {
                    Message::Text(text) => {
                        if let Some(event) = Self::decode_frame(&text) {
                            if event_tx.send(event).await.is_err() {
                                tracing::debug!("Event receiver dropped, stopping reader");
                                break;
                            }
                        }
                    }
                    Message::Close(frame) => {
                        tracing::info!(?frame, "Event socket closed by backend");
                        break;
                    }
                    // Pings are answered by tungstenite internally.
                    Message::Ping(_) | Message::Pong(_) => {}
                    other => {
                        tracing::trace!(?other, "Ignoring non-text frame");
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
            tracing::debug!("Event socket reader stopped");
        })
    }

    /// Decode one inbound frame. Malformed frames and unhandled event
    /// names both come back as `None`; only the former is logged at a
    /// visible level.
    fn decode_frame(text: &str) -> Option<PushEvent> {
        let frame: WireFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed event frame");
                return None;
            }
        };

        match PushEvent::parse(&frame.event, frame.data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(event = frame.event, error = %e, "Discarding undecodable event");
                None
            }
        }
    }
}

impl Drop for EventSocket {
    fn drop(&mut self) {
        self.reader_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
    }
}

// ─── StatusPoll ─────────────────────────────────────────────────────────

/// Background task that periodically requests a device status report.
///
/// Sends `check_device_status` over the event socket at a configurable
/// interval; the backend answers with a `device_status_response` push
/// event. Stops itself when the socket dies.
pub struct StatusPoll {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl StatusPoll {
    /// Start the poll. Returns a no-op handle when polling is disabled.
    pub fn start(sender: CommandSender, config: &StatusPollConfig) -> Self {
        let running = Arc::new(AtomicBool::new(config.enabled));
        if !config.enabled {
            return Self {
                handle: None,
                running,
            };
        }

        let interval = Duration::from_secs(config.interval_secs);
        let handle = {
            let running = Arc::clone(&running);
            tokio::spawn(async move {
                while running.load(Ordering::SeqCst) {
                    tokio::time::sleep(interval).await;

                    if !running.load(Ordering::SeqCst) {
                        break;
                    }

                    if let Err(e) = sender.send(PushCommand::CheckDeviceStatus).await {
                        tracing::warn!(error = %e, "Status poll failed, stopping");
                        break;
                    }
                }

                running.store(false, Ordering::SeqCst);
                tracing::debug!("Status poll stopped");
            })
        };

        Self {
            handle: Some(handle),
            running,
        }
    }

    /// Stop the poll.
    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
    }

    /// Returns whether the poll is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for StatusPoll {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
