use serde::Deserialize;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub weather: WeatherSettings,
    pub cache: CacheSettings,
    pub cities: CitySettings,
}

/// Host/port the WebSocket server binds to, plus the secret used to
/// validate capability tokens.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
}

/// Third-party weather provider settings.
#[derive(Debug, Deserialize, Clone)]
pub struct WeatherSettings {
    pub base_url: String,
    pub api_key: String,
    /// Requests admitted per trailing 60-second window.
    pub rate_limit: usize,
    pub request_timeout_secs: u64,
    pub refresh_interval_secs: u64,
}

/// Location of the last-known-good reading store.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub path: String,
}

/// City directory seeding.
#[derive(Debug, Deserialize, Clone)]
pub struct CitySettings {
    pub seed_file: Option<String>,
}

/// Partial configuration loaded from files or environment.
///
/// Allows partial specification of settings. Missing values are filled
/// from defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub weather: Option<PartialWeatherSettings>,
    pub cache: Option<PartialCacheSettings>,
    pub cities: Option<PartialCitySettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialWeatherSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub rate_limit: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialCacheSettings {
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialCitySettings {
    pub seed_file: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                jwt_secret: "skywatch-dev-secret".to_string(),
            },
            weather: WeatherSettings {
                base_url: "https://api.openweathermap.org/data/2.5".to_string(),
                api_key: String::new(),
                rate_limit: 60,
                request_timeout_secs: 10,
                refresh_interval_secs: 300,
            },
            cache: CacheSettings {
                path: "weather_cache_db".to_string(),
            },
            cities: CitySettings { seed_file: None },
        }
    }
}
