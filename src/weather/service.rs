//! Weather service: cache fallback and the periodic refresh sweep.
//!
//! The fallback contract lives on the caller side of the provider client:
//! any fetch failure is answered from the last known good reading when one
//! exists, explicitly marked stale. When neither a live nor a cached
//! reading is available the original failure propagates unchanged.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{ReadingStore, WeatherReading};
use crate::cities::{City, CityDirectory};
use crate::utils::{Error, Result};
use crate::weather::client::WeatherClient;

/// A reading plus its provenance: `stale` marks a cached reading served
/// because the live fetch failed.
#[derive(Debug, Clone)]
pub struct WeatherReport {
    pub reading: WeatherReading,
    pub stale: bool,
}

#[derive(Debug)]
pub struct WeatherService {
    client: WeatherClient,
    cache: ReadingStore,
}

impl WeatherService {
    pub fn new(client: WeatherClient, cache: ReadingStore) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &WeatherClient {
        &self.client
    }

    /// Current weather for a city: live when possible, cached otherwise.
    pub async fn current_for_city(&self, city: &City) -> Result<WeatherReport> {
        match self.client.fetch_current(city).await {
            Ok(reading) => Ok(WeatherReport {
                reading,
                stale: false,
            }),
            Err(err) => {
                if let Ok(Some(reading)) = self.cache.get(&city.uuid) {
                    warn!(
                        "serving cached reading for {} after fetch failure: {err}",
                        city.name
                    );
                    Ok(WeatherReport {
                        reading,
                        stale: true,
                    })
                } else {
                    Err(err)
                }
            }
        }
    }

    /// One sweep over every known city, refreshing the cache. Returns the
    /// number of cities updated. Quota exhaustion or an open circuit ends
    /// the sweep early; there is no point hammering a gate that will not
    /// move until the window slides or someone resets it.
    pub async fn refresh_all(&self, directory: &CityDirectory) -> usize {
        let mut updated = 0;
        for city in directory.all() {
            match self.client.fetch_current(&city).await {
                Ok(reading) => {
                    debug!("refreshed {}: {:.1}°C", city.name, reading.temperature);
                    updated += 1;
                }
                Err(Error::RateLimited) => {
                    warn!("quota exhausted, ending refresh sweep early");
                    break;
                }
                Err(Error::ProviderUnavailable) => {
                    warn!("provider unavailable, ending refresh sweep");
                    break;
                }
                Err(e) => {
                    warn!("failed to refresh {}: {e}", city.name);
                }
            }
        }
        updated
    }

    /// Background task: sweep all known cities on a fixed interval.
    pub async fn run_refresh_loop(
        service: Arc<WeatherService>,
        directory: Arc<CityDirectory>,
        interval: Duration,
    ) {
        loop {
            tokio::time::sleep(interval).await;
            let updated = service.refresh_all(&directory).await;
            debug!("refresh sweep updated {updated} of {} cities", directory.len());
        }
    }
}
