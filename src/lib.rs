//! # Skywatch
//!
//! `skywatch` is a real-time weather alert server built with Rust. It fans
//! alert events out over WebSockets to subscribers grouped by city, and it
//! acquires current readings from a rate-limited third-party weather
//! provider, falling back to the last known good reading when the provider
//! cannot be reached.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `broker`: topic registry that routes alert events to subscribed connections.
//! - `client`: the broker-side handle for a connected WebSocket client.
//! - `cities`: resolves city identifiers to names and coordinates.
//! - `weather`: provider client, sliding-window rate limiter and cache fallback.
//! - `cache`: sled-backed store of the last known good reading per city.
//! - `transport`: the WebSocket server and per-connection message loops.
//! - `config`: loading and merging server configuration.
//! - `utils`: shared error type and logging setup.

pub mod broker;
pub mod cache;
pub mod cities;
pub mod client;
pub mod config;
pub mod transport;
pub mod utils;
pub mod weather;
