//! Shared utilities: the crate-wide error type and logging initialization.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
