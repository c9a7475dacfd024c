//! Station and pole reference data, loaded once at startup.

use std::collections::HashMap;

use tracing::{debug, info};

use super::client::TransitApi;
use super::error::BusApiError;
use super::models::{BusStopPoleInfos, StationNames};
use super::similarity;

/// Default similarity threshold for fuzzy station lookup.
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.6;

/// Immutable lookup tables for stations and poles.
#[derive(Debug, Clone, Default)]
pub struct BaseData {
    pole_names: HashMap<String, String>,
    station_numbers: HashMap<String, u32>,
    station_names: HashMap<u32, String>,
    /// Upstream order, which decides fuzzy-match ties.
    stations: StationNames,
}

impl BaseData {
    pub fn new(poles: BusStopPoleInfos, stations: StationNames) -> Self {
        let pole_names = poles
            .into_iter()
            .map(|(code, pole)| (code, pole.n))
            .collect();
        let station_numbers = stations
            .iter()
            .map(|e| (e.name.clone(), e.number))
            .collect();
        let station_names = stations
            .iter()
            .map(|e| (e.number, e.name.clone()))
            .collect();

        Self {
            pole_names,
            station_numbers,
            station_names,
            stations,
        }
    }

    /// Fetch both reference tables concurrently and index them.
    pub async fn load(api: &dyn TransitApi) -> Result<Self, BusApiError> {
        info!("Loading station and pole reference data");
        let (poles, stations) = tokio::try_join!(api.bus_stop_pole_info(), api.station_names())?;
        let data = Self::new(poles, stations);
        info!(
            "Loaded {} stations and {} poles",
            data.station_count(),
            data.pole_names.len()
        );
        Ok(data)
    }

    pub fn get_pole_name(&self, bus_stop_code: &str) -> Option<&str> {
        self.pole_names.get(bus_stop_code).map(String::as_str)
    }

    pub fn get_station_number(&self, name: &str) -> Option<u32> {
        self.station_numbers.get(name).copied()
    }

    pub fn get_station_name(&self, number: u32) -> Option<&str> {
        self.station_names.get(&number).map(String::as_str)
    }

    pub fn station_count(&self) -> usize {
        self.stations.0.len()
    }

    /// Closest station by similarity ratio, if any reaches `cutoff`.
    ///
    /// An exact name wins immediately. Among equal ratios the station listed
    /// first upstream wins. A cutoff outside `[0, 1]` never matches.
    pub fn find_station_number(&self, name: &str, cutoff: f64) -> Option<u32> {
        if !(0.0..=1.0).contains(&cutoff) {
            return None;
        }
        if let Some(number) = self.get_station_number(name) {
            return Some(number);
        }

        let mut best: Option<(f64, u32)> = None;
        for entry in self.stations.iter() {
            let score = similarity::ratio(&entry.name, name);
            if score >= cutoff && best.is_none_or(|(top, _)| score > top) {
                best = Some((score, entry.number));
            }
        }

        if let Some((score, number)) = best {
            debug!("Fuzzy match for {:?}: {} (ratio {:.3})", name, number, score);
        }
        best.map(|(_, number)| number)
    }
}
