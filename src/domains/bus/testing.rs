//! In-memory [`TransitApi`] used by unit tests across the crate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use super::base_data::BaseData;
use super::client::TransitApi;
use super::error::BusApiError;
use super::models::{
    BusStopPoleInfos, BusStopResponse, DiagramResponse, Keito, RealtimeApproach, StationNames,
};

pub const BASE_URL: &str = "https://bus.example.test";

/// Canned upstream data. Anything not registered answers 404.
#[derive(Default)]
pub struct FakeTransitApi {
    pub stations: StationNames,
    pub poles: BusStopPoleInfos,
    pub diagrams: HashMap<u32, DiagramResponse>,
    pub bus_stops: HashMap<u32, BusStopResponse>,
    pub keitos: HashMap<String, Keito>,
    pub feeds: HashMap<String, RealtimeApproach>,
    pub broken_feeds: HashSet<String>,
    keito_calls: AtomicUsize,
    realtime_calls: AtomicUsize,
}

impl FakeTransitApi {
    /// Route 1123002 (中川車庫前 -> 野田 -> 栄) with one latest pass and
    /// two buses on the road, plus 栄's bus-stop master and timetable.
    pub fn sakae_route() -> Self {
        let mut api = Self {
            stations: StationNames::from([
                ("名古屋駅", 41200),
                ("栄", 21010),
                ("中川車庫前", 11015),
                ("野田", 45055),
            ]),
            poles: serde_json::from_value(json!({
                "11015301": {"BC": "301", "C": "301", "N": "1番"},
                "45055301": {"BC": "301", "C": "301", "N": "2番"},
                "210101E1": {"BC": "1E1", "C": "1E1", "N": "3番"}
            }))
            .unwrap(),
            ..Self::default()
        };
        api.add_keito(
            "1123002",
            json!({
                "NAME": "栄２３",
                "FROM": "中川車庫前",
                "TO": "栄",
                "ARTICLE": "",
                "BUSSTOPS": ["11015301", "45055301", "210101E1"]
            }),
        );
        api.add_feed(
            "1123002",
            json!({
                "LATEST_BUS_PASS": {"45055/301": {"NF 0612": "21:24:41"}},
                "45055/301": {"NF 0612": "21:31:42"},
                "21010/1E1": {"NF 0613": "21:44:45"}
            }),
        );
        api.add_bus_stop(
            21010,
            json!({
                "NAME": "栄",
                "KANA": "さかえ",
                "POLES": [{"KEITOS": ["1123002"], "CODE": "1E1", "BCODE": "1E1", "NORIBA": "3番"}]
            }),
        );
        api.add_diagram(
            21010,
            json!({
                "栄23": [{
                    "POLENAME": "3番",
                    "RAILWAY": ["中川車庫前", "野田"],
                    "RAILWAY_IDS": [1123002, 1123003],
                    "STATIONS": [["栄", "野田"], ["中川車庫前"]],
                    "DIAGRAM": {"平日": {"6": [5, 40], "10": [0]}, "土曜": {"7": [15]}}
                }]
            }),
        );
        api
    }

    pub fn add_keito(&mut self, route_code: &str, value: Value) {
        self.keitos
            .insert(route_code.to_string(), serde_json::from_value(value).unwrap());
    }

    pub fn add_feed(&mut self, route_code: &str, value: Value) {
        self.feeds.insert(
            route_code.to_string(),
            RealtimeApproach::from_json(value).unwrap(),
        );
    }

    pub fn add_bus_stop(&mut self, station_number: u32, value: Value) {
        self.bus_stops
            .insert(station_number, serde_json::from_value(value).unwrap());
    }

    pub fn add_diagram(&mut self, station_number: u32, value: Value) {
        self.diagrams
            .insert(station_number, serde_json::from_value(value).unwrap());
    }

    /// Make the live feed of `route_code` answer 500.
    pub fn break_feed(&mut self, route_code: &str) {
        self.broken_feeds.insert(route_code.to_string());
    }

    pub fn base_data(&self) -> BaseData {
        BaseData::new(self.poles.clone(), self.stations.clone())
    }

    pub fn keito_calls(&self) -> usize {
        self.keito_calls.load(Ordering::SeqCst)
    }

    pub fn realtime_calls(&self) -> usize {
        self.realtime_calls.load(Ordering::SeqCst)
    }
}

fn missing(path: String) -> BusApiError {
    BusApiError::not_found(format!("{BASE_URL}{path}"))
}

#[async_trait]
impl TransitApi for FakeTransitApi {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn station_names(&self) -> Result<StationNames, BusApiError> {
        Ok(self.stations.clone())
    }

    async fn bus_stop_pole_info(&self) -> Result<BusStopPoleInfos, BusApiError> {
        Ok(self.poles.clone())
    }

    async fn station_diagram(&self, station_number: u32) -> Result<DiagramResponse, BusApiError> {
        self.diagrams
            .get(&station_number)
            .cloned()
            .ok_or_else(|| missing(format!("/diagrams/{station_number}.json")))
    }

    async fn bus_stop(&self, station_number: u32) -> Result<BusStopResponse, BusApiError> {
        self.bus_stops
            .get(&station_number)
            .cloned()
            .ok_or_else(|| missing(format!("/busstops/{station_number:05}.json")))
    }

    async fn keito(&self, route_code: &str) -> Result<Arc<Keito>, BusApiError> {
        self.keito_calls.fetch_add(1, Ordering::SeqCst);
        self.keitos
            .get(route_code)
            .cloned()
            .map(Arc::new)
            .ok_or_else(|| missing(format!("/keitos/{route_code}.json")))
    }

    async fn realtime_approach(&self, route_code: &str) -> Result<RealtimeApproach, BusApiError> {
        self.realtime_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken_feeds.contains(route_code) {
            return Err(BusApiError::status(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{BASE_URL}/realtime_json/{route_code}.json"),
            ));
        }
        self.feeds
            .get(route_code)
            .cloned()
            .ok_or_else(|| missing(format!("/realtime_json/{route_code}.json")))
    }
}
