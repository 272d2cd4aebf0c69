use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;

use crate::utils::Result;

/// A normalized weather reading for one city.
///
/// Units: temperature °C, humidity %, pressure hPa, wind speed km/h,
/// precipitation mm (trailing hour).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WeatherReading {
    pub city_uuid: String,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
    pub captured_at: DateTime<Utc>,
}

/// Keyed store of the most recent reading per city UUID.
#[derive(Clone)]
pub struct ReadingStore {
    db: Db,
}

impl ReadingStore {
    /// Open or create the store at `path`.
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    /// Insert or replace the reading for its city.
    pub fn upsert(&self, reading: &WeatherReading) -> Result<()> {
        let serialized = serde_json::to_vec(reading)?;
        self.db.insert(reading.city_uuid.as_bytes(), serialized)?;
        Ok(())
    }

    /// Last known good reading for a city, if one was ever stored.
    pub fn get(&self, city_uuid: &str) -> Result<Option<WeatherReading>> {
        match self.db.get(city_uuid.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for ReadingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingStore")
            .field("db", &"sled::Db")
            .finish()
    }
}
