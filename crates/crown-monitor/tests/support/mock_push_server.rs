#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

pub const STEP_TIMEOUT: Duration = Duration::from_secs(3);

enum ConnectionCommand {
    SendJson(Value),
    SendRaw(String),
    ForceClose,
}

/// One accepted client connection on the mock backend.
pub struct MockConnection {
    inbound_rx: mpsc::Receiver<Value>,
    command_tx: mpsc::Sender<ConnectionCommand>,
}

impl MockConnection {
    /// Receive the next frame the client sent.
    pub async fn recv_frame(&mut self) -> Value {
        timeout(STEP_TIMEOUT, self.inbound_rx.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("mock connection frame channel closed")
    }

    /// Receive the next frame and assert its event name.
    pub async fn recv_command(&mut self, expected_event: &str) -> Value {
        let frame = self.recv_frame().await;
        let event = frame.get("event").and_then(Value::as_str);
        assert_eq!(event, Some(expected_event), "unexpected command frame");
        frame
    }

    /// Push an event frame to the client.
    pub async fn push_event(&self, event: &str, data: Value) {
        self.send(ConnectionCommand::SendJson(json!({
            "event": event,
            "data": data,
        })))
        .await;
    }

    /// Push a raw text frame, bypassing frame construction.
    pub async fn push_raw(&self, text: &str) {
        self.send(ConnectionCommand::SendRaw(text.to_string())).await;
    }

    /// Drop the connection without a close handshake.
    pub async fn force_close(&self) {
        let _ = self.command_tx.send(ConnectionCommand::ForceClose).await;
    }

    async fn send(&self, command: ConnectionCommand) {
        self.command_tx
            .send(command)
            .await
            .expect("failed to send command to mock connection");
    }
}

/// In-process WebSocket server standing in for the monitor backend's
/// event socket.
pub struct MockPushServer {
    addr: SocketAddr,
    connection_rx: mpsc::Receiver<MockConnection>,
    server_task: JoinHandle<()>,
}

impl MockPushServer {
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let addr = listener.local_addr()?;
        let (connection_tx, connection_rx) = mpsc::channel(16);

        let server_task = tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };

                let connection_tx = connection_tx.clone();
                tokio::spawn(async move {
                    let ws_stream = match accept_async(stream).await {
                        Ok(ws) => ws,
                        Err(_) => return,
                    };

                    let (mut ws_sink, mut ws_source) = ws_stream.split();
                    let (inbound_tx, inbound_rx) = mpsc::channel(64);
                    let (command_tx, mut command_rx) = mpsc::channel(64);

                    let connection = MockConnection {
                        inbound_rx,
                        command_tx,
                    };

                    if connection_tx.send(connection).await.is_err() {
                        return;
                    }

                    loop {
                        tokio::select! {
                            maybe_command = command_rx.recv() => {
                                match maybe_command {
                                    Some(ConnectionCommand::SendJson(value)) => {
                                        let message = Message::Text(value.to_string().into());
                                        if ws_sink.send(message).await.is_err() {
                                            break;
                                        }
                                    }
                                    Some(ConnectionCommand::SendRaw(text)) => {
                                        if ws_sink.send(Message::Text(text.into())).await.is_err() {
                                            break;
                                        }
                                    }
                                    Some(ConnectionCommand::ForceClose) => break,
                                    None => break,
                                }
                            }
                            maybe_message = ws_source.next() => {
                                match maybe_message {
                                    Some(Ok(Message::Text(text))) => {
                                        if let Ok(value) = serde_json::from_str::<Value>(&text) {
                                            let _ = inbound_tx.send(value).await;
                                        }
                                    }
                                    Some(Ok(Message::Close(_))) => break,
                                    Some(Ok(_)) => {}
                                    Some(Err(_)) => break,
                                    None => break,
                                }
                            }
                        }
                    }
                });
            }
        });

        Ok(Self {
            addr,
            connection_rx,
            server_task,
        })
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/events", self.addr)
    }

    pub async fn accept_connection(&mut self) -> MockConnection {
        timeout(STEP_TIMEOUT, self.connection_rx.recv())
            .await
            .expect("timed out waiting for client connection")
            .expect("mock server connection channel closed")
    }
}

impl Drop for MockPushServer {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}
