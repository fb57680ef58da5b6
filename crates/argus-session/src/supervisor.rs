//! Connection supervisor: owns the single active WebSocket connection to
//! the detection backend and drives its replacement lifecycle.
//!
//! Every connect bumps a generation counter (epoch) and all events from the
//! reader task carry it, so frames and close notifications from a replaced
//! connection can be dropped by the session instead of corrupting the state
//! of the connection that superseded it.

use argus_common::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

/// Grace period between closing a connection and opening its replacement,
/// so the server observes the close before the new handshake arrives.
pub const SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Normal-closure code used for every client-initiated close. Anything
/// else, or an unclean teardown, counts as abnormal downstream.
pub const CLOSE_NORMAL: u16 = 1000;

/// Events emitted by a connection's reader task.
#[derive(Debug, Clone)]
pub enum ConnEvent {
    Opened { epoch: u64 },
    Message { epoch: u64, text: String },
    Error { epoch: u64, message: String },
    Closed {
        epoch: u64,
        code: Option<u16>,
        clean: bool,
    },
}

impl ConnEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            ConnEvent::Opened { epoch }
            | ConnEvent::Message { epoch, .. }
            | ConnEvent::Error { epoch, .. }
            | ConnEvent::Closed { epoch, .. } => *epoch,
        }
    }
}

/// Why the client is closing: determines the close reason sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseIntent {
    UserRequested,
    Replacing,
}

/// Handle to an open connection; closing is fire-and-forget.
pub trait ConnectionControl: Send {
    fn close(&mut self, intent: CloseIntent);
}

/// Seam between the supervisor and the actual socket, so tests can stand in
/// a scripted connection.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(
        &self,
        url: String,
        epoch: u64,
        events: mpsc::UnboundedSender<ConnEvent>,
    ) -> Result<Box<dyn ConnectionControl>>;
}

/// Production transport over tokio-tungstenite.
pub struct WsTransport;

struct WsControl {
    close_tx: mpsc::UnboundedSender<CloseIntent>,
}

impl ConnectionControl for WsControl {
    fn close(&mut self, intent: CloseIntent) {
        let _ = self.close_tx.send(intent);
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn open(
        &self,
        url: String,
        epoch: u64,
        events: mpsc::UnboundedSender<ConnEvent>,
    ) -> Result<Box<dyn ConnectionControl>> {
        let (ws, _) = connect_async(url.as_str()).await?;
        let (close_tx, mut close_rx) = mpsc::unbounded_channel::<CloseIntent>();
        let _ = events.send(ConnEvent::Opened { epoch });

        tokio::spawn(async move {
            let (mut sink, mut stream) = ws.split();
            loop {
                tokio::select! {
                    intent = close_rx.recv() => {
                        let reason = match intent {
                            Some(CloseIntent::Replacing) => "reconnecting",
                            // A dropped control handle behaves like a user close.
                            Some(CloseIntent::UserRequested) | None => "client disconnect",
                        };
                        let frame = CloseFrame {
                            code: CloseCode::Normal,
                            reason: reason.into(),
                        };
                        if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                            debug!("close frame send failed: {e}");
                        }
                        let _ = events.send(ConnEvent::Closed {
                            epoch,
                            code: Some(CLOSE_NORMAL),
                            clean: true,
                        });
                        return;
                    }
                    incoming = stream.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            let _ = events.send(ConnEvent::Message {
                                epoch,
                                text: text.to_string(),
                            });
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let code = frame.map(|f| u16::from(f.code));
                            let _ = events.send(ConnEvent::Closed { epoch, code, clean: true });
                            return;
                        }
                        // Ping/pong are answered by tungstenite; binary
                        // frames are not part of this protocol.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = events.send(ConnEvent::Error {
                                epoch,
                                message: e.to_string(),
                            });
                            let _ = events.send(ConnEvent::Closed { epoch, code: None, clean: false });
                            return;
                        }
                        None => {
                            let _ = events.send(ConnEvent::Closed { epoch, code: None, clean: false });
                            return;
                        }
                    }
                }
            }
        });

        Ok(Box::new(WsControl { close_tx }))
    }
}

/// Owns the single active connection. Opening while connected is defined as
/// "replace": the old connection is closed gracefully first.
pub struct ConnectionSupervisor {
    transport: Arc<dyn Transport>,
    events_tx: mpsc::UnboundedSender<ConnEvent>,
    active: Option<Box<dyn ConnectionControl>>,
    epoch: u64,
}

impl ConnectionSupervisor {
    pub fn new(transport: Arc<dyn Transport>, events_tx: mpsc::UnboundedSender<ConnEvent>) -> Self {
        Self {
            transport,
            events_tx,
            active: None,
            epoch: 0,
        }
    }

    /// Generation of the most recent connect attempt.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Close any existing connection, wait for the settle delay, then open
    /// a new one. Returns the epoch of the new connection.
    pub async fn connect(&mut self, url: &str) -> Result<u64> {
        if let Some(mut old) = self.active.take() {
            old.close(CloseIntent::Replacing);
            tokio::time::sleep(SETTLE_DELAY).await;
        }
        self.epoch += 1;
        let epoch = self.epoch;
        let control = self
            .transport
            .open(url.to_string(), epoch, self.events_tx.clone())
            .await?;
        self.active = Some(control);
        Ok(epoch)
    }

    /// User-initiated close with the distinguished normal code.
    pub fn disconnect(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.close(CloseIntent::UserRequested);
        }
    }
}
