//! Connection handle
//!
//! `Client` models one connected WebSocket client and holds the sending
//! side of its per-connection channel. The broker pushes frames onto this
//! channel; the connection's own send loop drains it onto the socket, so
//! publishing never blocks on socket I/O.
//!
//! Lifecycle: `Connecting` until the handshake is validated, then `Open`
//! once subscribed. Cleanup moves the handle through `Closing` to `Closed`.
//! A handshake that fails validation ends in `Rejected` and the handle is
//! never registered.

use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::transport::message::ServerMessage;
use crate::utils::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
    Rejected,
}

#[derive(Debug)]
pub struct Client {
    pub id: String,
    pub city_uuid: String,
    pub sender: UnboundedSender<WsMessage>,
    pub state: ConnectionState,
}

impl Client {
    /// Create a handle for a connection requesting `city_uuid`. The `id` is
    /// a UUID used to identify the connection across broker operations.
    pub fn new(city_uuid: impl Into<String>, sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            city_uuid: city_uuid.into(),
            sender,
            state: ConnectionState::Connecting,
        }
    }

    pub fn open(&mut self) {
        self.state = ConnectionState::Open;
    }

    pub fn reject(&mut self) {
        self.state = ConnectionState::Rejected;
    }

    /// Serialize a server frame onto this connection's outbound queue.
    pub fn send(&self, frame: &ServerMessage) -> Result<()> {
        let text = serde_json::to_string(frame)?;
        self.sender
            .send(WsMessage::text(text))
            .map_err(|_| Error::ChannelClosed)
    }
}
