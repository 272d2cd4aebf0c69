//! The `client` module defines the broker-side representation of a
//! connected WebSocket client: its identifier, the city it subscribed to,
//! the channel used to push frames to it, and its lifecycle state.

pub mod connection;
pub use connection::{Client, ConnectionState};
