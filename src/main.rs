use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{error, info};

use skywatch::broker::Broker;
use skywatch::cache::ReadingStore;
use skywatch::cities::CityDirectory;
use skywatch::config::load_config;
use skywatch::transport::start_websocket_server;
use skywatch::weather::{WeatherClient, WeatherService};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    skywatch::utils::logging::init("info");

    if let Err(e) = run_server().await {
        error!("Server failed: {e}");
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let directory = Arc::new(match &config.cities.seed_file {
        Some(path) => CityDirectory::from_json_file(path)?,
        None => CityDirectory::new(),
    });
    info!("{} cities known at startup", directory.len());

    let store = ReadingStore::open(&config.cache.path)?;
    let client = WeatherClient::new(
        &config.weather.base_url,
        &config.weather.api_key,
        config.weather.rate_limit,
        Duration::from_secs(config.weather.request_timeout_secs),
        store.clone(),
    )?;
    let service = Arc::new(WeatherService::new(client, store));

    let broker = Arc::new(Mutex::new(Broker::new()));

    tokio::spawn(WeatherService::run_refresh_loop(
        service.clone(),
        directory.clone(),
        Duration::from_secs(config.weather.refresh_interval_secs),
    ));

    tokio::select! {
        result = start_websocket_server(addr, broker, directory, config.clone()) => {
            if let Err(e) = result {
                error!("WebSocket server exited unexpectedly: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}
