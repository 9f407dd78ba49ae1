//! # crown-monitor
//!
//! A Rust client for the Neurosity Crown monitor backend: connection
//! lifecycle, live monitoring, session recording, and the recorded
//! session catalog.
//!
//! The backend owns the headset; this crate owns the dashboard side of
//! the contract. Commands go out over REST (`/connect`, `/disconnect`,
//! `/start_recording`, ...) and a WebSocket event socket; status comes
//! back as authoritative push events that the [`ConnectionController`]
//! reconciles into a single observable state.
//!
//! ## Quick Start
//!
//! ```ignore
//! use crown_monitor::{
//!     BackendTransport, ConnectionController, EventSocket, MonitorConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> crown_monitor::MonitorResult<()> {
//!     let config = MonitorConfig::discover(None)?;
//!
//!     let mut socket = EventSocket::connect(&config.socket_url).await?;
//!     let mut transport = BackendTransport::new(&config)?;
//!     transport.attach_socket(socket.command_sender());
//!
//!     let mut controller = ConnectionController::new(transport, &config);
//!     controller.connect().await?;
//!
//!     while let Some(event) = socket.recv().await {
//!         controller.apply_event(event);
//!         println!("{:?}", controller.state());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Push events win.** The backend may announce state changes the
//!   client never requested (headset died, another client disconnected
//!   it). [`ConnectionController::apply_event`] overwrites local state
//!   unconditionally, last write wins.
//! - **Monitoring is never optimistic.** `start_monitoring` and
//!   `stop_monitoring` are requests; the local flag flips only on the
//!   backend's confirmation events.
//! - **Sessions page incrementally.** [`SessionListStore`] materializes
//!   the catalog in fixed-size pages so large archives stay cheap to
//!   render.
//!
//! ## Configuration
//!
//! See [`MonitorConfig`]. The simplest setup uses environment variables:
//!
//! ```bash
//! export CROWN_BASE_URL="http://localhost:5000"
//! ```
//!
//! Or a `crown-monitor.toml` file:
//!
//! ```toml
//! base_url = "http://localhost:5000"
//!
//! [sessions]
//! page_size = 50
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod session;
pub mod socket;
pub mod transport;

// ─── Public re-exports ──────────────────────────────────────────────────

pub use catalog::SessionListStore;
pub use config::MonitorConfig;
pub use controller::{ConnectionController, ConnectionPhase, ConnectionState};
pub use error::{MonitorError, MonitorResult};
pub use protocol::events::{PushCommand, PushEvent};
pub use protocol::status::DeviceStatus;
pub use session::SessionTimestamp;
pub use socket::{CommandSender, EventSocket, StatusPoll};
pub use transport::{BackendTransport, DeviceTransport};
