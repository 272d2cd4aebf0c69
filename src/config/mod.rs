mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{CacheSettings, CitySettings, ServerSettings, Settings, WeatherSettings};

/// Loads the configuration from the default file and environment variables,
/// merging whatever is present over built-in defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("_"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
            jwt_secret: partial
                .server
                .as_ref()
                .and_then(|s| s.jwt_secret.clone())
                .unwrap_or(default.server.jwt_secret),
        },
        weather: WeatherSettings {
            base_url: partial
                .weather
                .as_ref()
                .and_then(|w| w.base_url.clone())
                .unwrap_or(default.weather.base_url),
            api_key: partial
                .weather
                .as_ref()
                .and_then(|w| w.api_key.clone())
                .unwrap_or(default.weather.api_key),
            rate_limit: partial
                .weather
                .as_ref()
                .and_then(|w| w.rate_limit)
                .unwrap_or(default.weather.rate_limit),
            request_timeout_secs: partial
                .weather
                .as_ref()
                .and_then(|w| w.request_timeout_secs)
                .unwrap_or(default.weather.request_timeout_secs),
            refresh_interval_secs: partial
                .weather
                .as_ref()
                .and_then(|w| w.refresh_interval_secs)
                .unwrap_or(default.weather.refresh_interval_secs),
        },
        cache: CacheSettings {
            path: partial
                .cache
                .as_ref()
                .and_then(|c| c.path.clone())
                .unwrap_or(default.cache.path),
        },
        cities: CitySettings {
            seed_file: partial
                .cities
                .as_ref()
                .and_then(|c| c.seed_file.clone())
                .or(default.cities.seed_file),
        },
    })
}
