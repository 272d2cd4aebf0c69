//! Last-known-good reading cache.
//!
//! Every successful provider fetch upserts the reading for its city here;
//! the fallback path reads it back when the provider is unavailable or the
//! quota is exhausted. Backed by `sled` so readings survive restarts.

pub mod reading_store;

pub use reading_store::{ReadingStore, WeatherReading};
