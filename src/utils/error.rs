//! Crate-wide error type.
//!
//! Connection-level rejections (`AuthRejected`, `CityNotFound`) are terminal
//! for that connection only. Fetch-path errors (`ProviderUnavailable`,
//! `RateLimited`) are returned to the caller, which decides whether to fall
//! back to a cached reading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The connect attempt carried no valid capability token.
    #[error("authentication missing or invalid")]
    AuthRejected,

    /// The requested city does not resolve to a known entity.
    #[error("unknown city: {0}")]
    CityNotFound(String),

    /// An inbound frame failed to parse. Reported back, non-fatal.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The provider circuit is open or the last upstream call failed.
    /// Recoverable via cache fallback or an explicit reset.
    #[error("weather provider unavailable")]
    ProviderUnavailable,

    /// Request quota exhausted for the current window.
    #[error("rate limit exceeded")]
    RateLimited,

    /// The connection's outbound channel closed while a frame was queued.
    #[error("outbound channel closed")]
    ChannelClosed,

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Store(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
