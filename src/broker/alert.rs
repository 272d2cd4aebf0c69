//! Alert event definitions
//!
//! `WeatherAlert` is the event published through the broker. It is immutable
//! once constructed: the UUID and timestamp are assigned at creation and an
//! alert is published at most once. A connection that subscribes after the
//! publish never sees it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cities::City;

/// Severity scale for weather alerts, mildest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Severe,
    Extreme,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Severe => "severe",
            Severity::Extreme => "extreme",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub uuid: String,
    pub city_uuid: String,
    pub city_name: String,
    pub severity: Severity,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl WeatherAlert {
    pub fn new(city: &City, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            city_uuid: city.uuid.clone(),
            city_name: city.name.clone(),
            severity,
            description: description.into(),
            timestamp: Utc::now(),
        }
    }
}
