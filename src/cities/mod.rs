//! City resolution.
//!
//! Connections subscribe per city and the weather client fetches per city
//! coordinates, so both need a way to turn an opaque city UUID into a real
//! entity. `CityDirectory` is an in-memory directory, optionally seeded from
//! a JSON file at startup.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::utils::Result;

/// A city known to the system, identified by an opaque UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub uuid: String,
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Directory of known cities, keyed by UUID.
#[derive(Debug, Default)]
pub struct CityDirectory {
    cities: RwLock<HashMap<String, City>>,
}

impl CityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a directory from a JSON file containing an array of cities.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cities: Vec<City> = serde_json::from_str(&data)?;
        let directory = Self::new();
        for city in cities {
            directory.insert(city);
        }
        Ok(directory)
    }

    pub fn insert(&self, city: City) {
        self.cities.write().unwrap().insert(city.uuid.clone(), city);
    }

    /// Resolve a city UUID to its entity. Returns `None` for unknown ids.
    pub fn resolve(&self, uuid: &str) -> Option<City> {
        self.cities.read().unwrap().get(uuid).cloned()
    }

    /// Snapshot of all known cities, used by the periodic refresh sweep.
    pub fn all(&self) -> Vec<City> {
        self.cities.read().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.cities.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests;
