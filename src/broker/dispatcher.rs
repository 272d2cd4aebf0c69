//! Alert dispatch
//!
//! `AlertDispatcher` is the entry point domain logic calls when a weather
//! alert occurs for a city. It turns the occurrence into an immutable
//! `WeatherAlert` event and publishes it through the broker.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::broker::alert::{Severity, WeatherAlert};
use crate::broker::engine::Broker;
use crate::cities::City;

#[derive(Clone)]
pub struct AlertDispatcher {
    broker: Arc<Mutex<Broker>>,
}

impl AlertDispatcher {
    pub fn new(broker: Arc<Mutex<Broker>>) -> Self {
        Self { broker }
    }

    /// Publish an alert for `city`, returning the number of live
    /// connections it was offered to.
    pub fn dispatch(
        &self,
        city: &City,
        severity: Severity,
        description: impl Into<String>,
    ) -> usize {
        let alert = WeatherAlert::new(city, severity, description);
        let delivered = self.broker.lock().unwrap().publish(&alert);
        info!(
            "alert {} ({severity}) for {} delivered to {delivered} connection(s)",
            alert.uuid, alert.city_name
        );
        delivered
    }
}
