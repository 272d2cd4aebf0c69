use serde::{Deserialize, Serialize};

use crate::broker::alert::WeatherAlert;

/// Inbound control frames. Clients mostly just listen; the only supported
/// request today is a liveness ping.
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "ping")]
    Ping,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "connection_established")]
    ConnectionEstablished {
        message: String,
        city_uuid: String,
        city_name: String,
    },
    #[serde(rename = "weather_alert")]
    WeatherAlert { alert: WeatherAlert },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}
