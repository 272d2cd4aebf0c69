//! The `transport` module handles network communication with clients over
//! WebSockets: the frame protocol, the handshake gate (token check + city
//! resolution) and the per-connection receive/send loops.

pub mod message;
pub mod websocket;

pub use message::{Claims, ClientMessage, ServerMessage};
pub use websocket::{CLOSE_AUTH_REJECTED, CLOSE_CITY_NOT_FOUND, serve, start_websocket_server};

#[cfg(test)]
mod websocket_tests;
