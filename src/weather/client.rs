//! Third-party weather provider client.
//!
//! One upstream call per fetch, gated by the sliding-window quota and by a
//! latched availability flag. The flag opens on any transport or protocol
//! failure and stays open until `reset` is called; there is no timed
//! half-open probe. While the flag is open, fetches fail immediately
//! without touching the network or consuming quota.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::cache::{ReadingStore, WeatherReading};
use crate::cities::City;
use crate::utils::{Error, Result};
use crate::weather::rate_limit::SlidingWindow;

/// Availability latch for the upstream provider.
#[derive(Debug)]
pub struct ProviderState {
    pub available: bool,
    pub last_error: Option<String>,
}

impl ProviderState {
    fn new() -> Self {
        Self {
            available: true,
            last_error: None,
        }
    }
}

/// Shape of the provider's current-weather response. Wind speed arrives in
/// m/s and precipitation lives under `rain.1h`, absent when dry.
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    main: MainData,
    wind: WindData,
    #[serde(default)]
    rain: Option<RainData>,
}

#[derive(Debug, Deserialize)]
struct MainData {
    temp: f64,
    humidity: f64,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct WindData {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct RainData {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: Mutex<SlidingWindow>,
    state: Mutex<ProviderState>,
    cache: ReadingStore,
}

impl WeatherClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        rate_limit: usize,
        request_timeout: Duration,
        cache: ReadingStore,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            limiter: Mutex::new(SlidingWindow::per_minute(rate_limit)),
            state: Mutex::new(ProviderState::new()),
            cache,
        })
    }

    /// Fetch the current reading for a city's coordinates.
    ///
    /// Order matters: the availability latch is checked before the quota,
    /// so a fetch against an open circuit consumes nothing. A denied
    /// admission is never refunded, even if the upstream call later fails.
    pub async fn fetch_current(&self, city: &City) -> Result<WeatherReading> {
        if !self.is_available() {
            debug!("provider circuit open, skipping fetch for {}", city.name);
            return Err(Error::ProviderUnavailable);
        }

        if !self.limiter.lock().unwrap().try_admit(Instant::now()) {
            debug!("quota exhausted, denying fetch for {}", city.name);
            return Err(Error::RateLimited);
        }

        let url = format!("{}/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", city.latitude.to_string()),
                ("lon", city.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let response = match response {
            Ok(r) => r,
            Err(e) => return Err(self.mark_unavailable(e)),
        };

        let body: ProviderResponse = match response.json().await {
            Ok(b) => b,
            Err(e) => return Err(self.mark_unavailable(e)),
        };

        let reading = WeatherReading {
            city_uuid: city.uuid.clone(),
            temperature: body.main.temp,
            humidity: body.main.humidity,
            pressure: body.main.pressure,
            // provider reports m/s
            wind_speed: body.wind.speed * 3.6,
            precipitation: body.rain.map(|r| r.one_hour).unwrap_or(0.0),
            captured_at: Utc::now(),
        };

        self.cache.upsert(&reading)?;
        debug!(
            "fetched reading for {}: {:.1}°C, wind {:.1} km/h",
            city.name, reading.temperature, reading.wind_speed
        );
        Ok(reading)
    }

    fn mark_unavailable(&self, err: reqwest::Error) -> Error {
        warn!("provider call failed, opening circuit: {err}");
        let mut state = self.state.lock().unwrap();
        state.available = false;
        state.last_error = Some(err.to_string());
        Error::ProviderUnavailable
    }

    pub fn is_available(&self) -> bool {
        self.state.lock().unwrap().available
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().unwrap().last_error.clone()
    }

    /// Close the circuit again. The only recovery path; nothing re-probes
    /// the provider automatically.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.available = true;
        state.last_error = None;
        info!("provider availability reset");
    }
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("base_url", &self.base_url)
            .field("available", &self.is_available())
            .finish()
    }
}
