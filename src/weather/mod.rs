//! Weather acquisition.
//!
//! `WeatherClient` performs the upstream provider call, gated by a
//! sliding-window rate limiter and a latched availability flag.
//! `WeatherService` wraps it with the cache-fallback policy and the
//! periodic refresh sweep over all known cities.

pub mod client;
pub mod rate_limit;
pub mod service;

pub use client::WeatherClient;
pub use rate_limit::SlidingWindow;
pub use service::{WeatherReport, WeatherService};
