//! Live approach engine for a single route.
//!
//! Joins a route's stop sequence with its live feed. Every feed event is
//! keyed by the stop the bus is heading to; the engine resolves the stop it
//! last passed from the sequence and builds [`ApproachPosition`]s.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Serialize;
use tracing::{debug, error, warn};

use super::base_data::BaseData;
use super::client::TransitApi;
use super::error::ApproachError;
use super::models::{Keito, StopEvents};

/// Placeholder for a station missing from the reference data.
pub const UNKNOWN_STATION: &str = "不明なバス停";

/// Placeholder for a pole missing from the reference data.
pub const UNKNOWN_POLE: &str = "不明なのりば";

/// A stop of a route, resolved against the reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ApproachBusStop {
    /// のりばコード (例: 02200702)
    pub bus_stop_code: String,
    /// バス停番号 (例: 2200)
    pub station_number: u32,
    /// バス停名
    pub station_name: String,
    /// のりば
    pub pole: String,
}

/// A bus observed between two stops of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ApproachPosition {
    /// 車両コード
    pub car_code: String,
    /// 直前に通過したのりば
    pub previous_stop: ApproachBusStop,
    /// 通過時刻(HH:MM:SS形式)
    pub passed_time: String,
    /// 次に通過するのりば
    pub next_stop: ApproachBusStop,
}

/// Snapshot of a route's live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApproachInfo {
    pub route: String,
    pub direction: String,
    pub bus_stops: Vec<ApproachBusStop>,
    /// Latest pass per previous-stop code.
    pub latest_passes: BTreeMap<String, ApproachPosition>,
    /// Every bus currently on the road, in feed order.
    pub current_positions: Vec<ApproachPosition>,
}

impl ApproachInfo {
    fn index_of(&self, bus_stop_code: &str) -> Option<usize> {
        self.bus_stops
            .iter()
            .position(|stop| stop.bus_stop_code == bus_stop_code)
    }

    pub fn last_pass_time_for_code(&self, bus_stop_code: &str) -> Option<&str> {
        self.latest_passes
            .get(bus_stop_code)
            .map(|position| position.passed_time.as_str())
    }

    pub fn bus_stop_for_code(&self, bus_stop_code: &str) -> Option<&ApproachBusStop> {
        self.index_of(bus_stop_code).map(|i| &self.bus_stops[i])
    }

    /// Buses that last passed a stop before `bus_stop_code`, with how many
    /// stops away they are. Keeps feed order.
    pub fn current_positions_before_code(
        &self,
        bus_stop_code: &str,
    ) -> Vec<(usize, &ApproachPosition)> {
        let Some(target) = self.index_of(bus_stop_code) else {
            return Vec::new();
        };
        self.current_positions
            .iter()
            .filter_map(|position| {
                let previous = self.index_of(&position.previous_stop.bus_stop_code)?;
                (previous < target).then(|| (target - previous, position))
            })
            .collect()
    }
}

/// Station number encoded in the first five digits of a bus-stop code.
pub fn station_number_from_code(bus_stop_code: &str) -> Result<u32, ApproachError> {
    bus_stop_code
        .get(..5)
        .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|prefix| prefix.parse().ok())
        .ok_or_else(|| ApproachError::InvalidBusStopCode(bus_stop_code.to_string()))
}

pub fn resolve_bus_stop(
    base_data: &BaseData,
    bus_stop_code: &str,
) -> Result<ApproachBusStop, ApproachError> {
    let station_number = station_number_from_code(bus_stop_code)?;
    Ok(ApproachBusStop {
        bus_stop_code: bus_stop_code.to_string(),
        station_number,
        station_name: base_data
            .get_station_name(station_number)
            .unwrap_or(UNKNOWN_STATION)
            .to_string(),
        pole: base_data
            .get_pole_name(bus_stop_code)
            .unwrap_or(UNKNOWN_POLE)
            .to_string(),
    })
}

/// Map full-width digits, `Ｃ` and `－` in a route name to ASCII.
pub fn normalize_route_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            'Ｃ' => 'C',
            '－' => '-',
            other => other,
        })
        .collect()
}

/// Human-readable direction, e.g. "中川車庫前発 栄行き".
pub fn direction(keito: &Keito) -> String {
    if keito.article.is_empty() {
        format!("{}発 {}行き", keito.from, keito.to)
    } else {
        format!("{}発 {} {}行き", keito.from, keito.article, keito.to)
    }
}

/// Previous and next stop of a feed entry, or `None` when the bus is heading
/// to the first stop.
fn stop_pair<'a>(
    route_code: &str,
    bus_stops: &'a [ApproachBusStop],
    events: &StopEvents,
) -> Result<Option<(&'a ApproachBusStop, &'a ApproachBusStop)>, ApproachError> {
    let next_code = events.next_stop_code();
    let Some(index) = bus_stops.iter().position(|s| s.bus_stop_code == next_code) else {
        error!(
            "Live feed for route {} references stop {} outside the route",
            route_code, next_code
        );
        return Err(ApproachError::StopNotInRoute {
            route_code: route_code.to_string(),
            bus_stop_code: next_code,
        });
    };
    if index == 0 {
        warn!(
            "Next stop {} is the first stop of route {}, skipping as there is no previous stop",
            next_code, route_code
        );
        return Ok(None);
    }
    Ok(Some((&bus_stops[index - 1], &bus_stops[index])))
}

/// Fetch a route and its live feed and build the route snapshot.
pub async fn get_realtime_approach(
    api: &dyn TransitApi,
    base_data: &BaseData,
    route_code: &str,
) -> Result<ApproachInfo, ApproachError> {
    let (keito, feed) = tokio::try_join!(api.keito(route_code), api.realtime_approach(route_code))?;

    let bus_stops = keito
        .busstops
        .iter()
        .map(|code| resolve_bus_stop(base_data, code))
        .collect::<Result<Vec<_>, _>>()?;

    let mut latest_passes: BTreeMap<String, ApproachPosition> = BTreeMap::new();
    for events in &feed.latest_bus_pass {
        let Some((previous, next)) = stop_pair(route_code, &bus_stops, events)? else {
            continue;
        };
        for car in &events.cars {
            let newer = latest_passes
                .get(&previous.bus_stop_code)
                .is_none_or(|seen| car.passed_time > seen.passed_time);
            if newer {
                latest_passes.insert(
                    previous.bus_stop_code.clone(),
                    ApproachPosition {
                        car_code: car.car_code.clone(),
                        previous_stop: previous.clone(),
                        passed_time: car.passed_time.clone(),
                        next_stop: next.clone(),
                    },
                );
            }
        }
    }

    let mut current_positions = Vec::new();
    for events in &feed.current_bus_positions {
        let Some((previous, next)) = stop_pair(route_code, &bus_stops, events)? else {
            continue;
        };
        current_positions.extend(events.cars.iter().map(|car| ApproachPosition {
            car_code: car.car_code.clone(),
            previous_stop: previous.clone(),
            passed_time: car.passed_time.clone(),
            next_stop: next.clone(),
        }));
    }

    debug!(
        "Route {}: {} stops, {} latest passes, {} buses on the road",
        route_code,
        bus_stops.len(),
        latest_passes.len(),
        current_positions.len()
    );

    Ok(ApproachInfo {
        route: normalize_route_name(&keito.name),
        direction: direction(&keito),
        bus_stops,
        latest_passes,
        current_positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::bus::testing::FakeTransitApi;
    use serde_json::json;

    fn stop(code: &str, number: u32, name: &str) -> ApproachBusStop {
        ApproachBusStop {
            bus_stop_code: code.to_string(),
            station_number: number,
            station_name: name.to_string(),
            pole: "1番".to_string(),
        }
    }

    fn position(
        car: &str,
        previous: &ApproachBusStop,
        time: &str,
        next: &ApproachBusStop,
    ) -> ApproachPosition {
        ApproachPosition {
            car_code: car.to_string(),
            previous_stop: previous.clone(),
            passed_time: time.to_string(),
            next_stop: next.clone(),
        }
    }

    fn sample_info() -> ApproachInfo {
        let stops = vec![
            stop("41025701", 41025, "中川車庫前"),
            stop("52025701", 52025, "野田"),
            stop("31090101", 31090, "栄"),
        ];
        let mut latest_passes = BTreeMap::new();
        latest_passes.insert(
            "41025701".to_string(),
            position("NF 0612", &stops[0], "21:24:41", &stops[1]),
        );
        let current_positions = vec![
            position("NF 0612", &stops[0], "21:31:42", &stops[1]),
            position("NF 0613", &stops[1], "21:44:45", &stops[2]),
        ];
        ApproachInfo {
            route: "栄23".to_string(),
            direction: "中川車庫前発 栄行き".to_string(),
            bus_stops: stops,
            latest_passes,
            current_positions,
        }
    }

    #[test]
    fn last_pass_time_lookup() {
        let info = sample_info();
        assert_eq!(info.last_pass_time_for_code("41025701"), Some("21:24:41"));
        assert_eq!(info.last_pass_time_for_code("52025701"), None);
        assert_eq!(info.last_pass_time_for_code("99999999"), None);
    }

    #[test]
    fn bus_stop_lookup() {
        let info = sample_info();
        assert_eq!(
            info.bus_stop_for_code("31090101").map(|s| s.station_name.as_str()),
            Some("栄")
        );
        assert!(info.bus_stop_for_code("nonexistent").is_none());
    }

    #[test]
    fn positions_before_last_stop() {
        let info = sample_info();
        let positions = info.current_positions_before_code("31090101");
        let summary: Vec<_> = positions.iter().map(|(n, p)| (*n, p.car_code.as_str())).collect();
        assert_eq!(summary, vec![(2, "NF 0612"), (1, "NF 0613")]);
    }

    #[test]
    fn positions_before_middle_stop() {
        let info = sample_info();
        let positions = info.current_positions_before_code("52025701");
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].0, 1);
    }

    #[test]
    fn positions_before_first_or_unknown_stop() {
        let info = sample_info();
        assert!(info.current_positions_before_code("41025701").is_empty());
        assert!(info.current_positions_before_code("99999999").is_empty());
    }

    #[test]
    fn station_number_strips_leading_zeros() {
        assert_eq!(station_number_from_code("02200702").unwrap(), 2200);
        assert_eq!(station_number_from_code("210101E1").unwrap(), 21010);
        assert_eq!(station_number_from_code("41025").unwrap(), 41025);
        assert_eq!(
            station_number_from_code("02200702").unwrap(),
            station_number_from_code("02200702").unwrap()
        );
    }

    #[test]
    fn station_number_rejects_malformed_codes() {
        for code in ["", "1234", "12a45678", "ABCDE123", "１２３４５"] {
            assert!(
                matches!(
                    station_number_from_code(code),
                    Err(ApproachError::InvalidBusStopCode(_))
                ),
                "{code:?} should be rejected"
            );
        }
    }

    #[test]
    fn resolve_falls_back_to_placeholders() {
        let data = BaseData::default();
        let stop = resolve_bus_stop(&data, "99999123").unwrap();
        assert_eq!(stop.station_number, 99999);
        assert_eq!(stop.station_name, UNKNOWN_STATION);
        assert_eq!(stop.pole, UNKNOWN_POLE);
    }

    #[test]
    fn route_name_normalization() {
        assert_eq!(normalize_route_name("栄２３"), "栄23");
        assert_eq!(normalize_route_name("Ｃ－７５８"), "C-758");
        assert_eq!(normalize_route_name("１２３４５６７８９０"), "1234567890");
        assert_eq!(normalize_route_name(""), "");
        assert_eq!(normalize_route_name("幹名駅１"), "幹名駅1");
    }

    #[test]
    fn route_name_normalization_is_idempotent() {
        for name in ["栄２３", "Ｃ－７５８", "基幹２", "名古屋駅"] {
            let once = normalize_route_name(name);
            assert_eq!(normalize_route_name(&once), once);
        }
    }

    #[test]
    fn direction_with_and_without_article() {
        let mut keito: Keito = serde_json::from_value(json!({
            "NAME": "栄２３", "FROM": "中川車庫前", "TO": "栄", "BUSSTOPS": []
        }))
        .unwrap();
        assert_eq!(direction(&keito), "中川車庫前発 栄行き");

        keito.article = "地下鉄高畑経由".to_string();
        assert_eq!(direction(&keito), "中川車庫前発 地下鉄高畑経由 栄行き");
    }

    #[tokio::test]
    async fn end_to_end_route_snapshot() {
        let api = FakeTransitApi::sakae_route();
        let info = get_realtime_approach(&api, &api.base_data(), "1123002")
            .await
            .unwrap();

        assert_eq!(info.route, "栄23");
        assert_eq!(info.direction, "中川車庫前発 栄行き");

        let codes: Vec<_> = info.bus_stops.iter().map(|s| s.bus_stop_code.as_str()).collect();
        assert_eq!(codes, vec!["11015301", "45055301", "210101E1"]);
        assert_eq!(info.bus_stops[0].station_name, "中川車庫前");
        assert_eq!(info.bus_stops[2].station_number, 21010);

        assert_eq!(info.latest_passes.len(), 1);
        let latest = &info.latest_passes["11015301"];
        assert_eq!(latest.car_code, "NF 0612");
        assert_eq!(latest.passed_time, "21:24:41");
        assert_eq!(latest.previous_stop.bus_stop_code, "11015301");
        assert_eq!(latest.next_stop.bus_stop_code, "45055301");

        let cars: Vec<_> = info
            .current_positions
            .iter()
            .map(|p| (p.car_code.as_str(), p.previous_stop.bus_stop_code.as_str()))
            .collect();
        assert_eq!(cars, vec![("NF 0612", "11015301"), ("NF 0613", "45055301")]);
    }

    #[tokio::test]
    async fn latest_pass_keeps_most_recent_in_either_order() {
        for cars in [
            json!({"NF 0001": "20:00:00", "NF 0002": "21:00:00"}),
            json!({"NF 0002": "21:00:00", "NF 0001": "20:00:00"}),
        ] {
            let mut api = FakeTransitApi::sakae_route();
            api.add_feed("1123002", json!({"LATEST_BUS_PASS": {"45055/301": cars}}));

            let info = get_realtime_approach(&api, &api.base_data(), "1123002")
                .await
                .unwrap();
            let latest = &info.latest_passes["11015301"];
            assert_eq!(latest.passed_time, "21:00:00");
            assert_eq!(latest.car_code, "NF 0002");
        }
    }

    #[tokio::test]
    async fn latest_pass_tie_keeps_first_seen() {
        let mut api = FakeTransitApi::sakae_route();
        api.add_feed(
            "1123002",
            json!({"LATEST_BUS_PASS": {"45055/301": {"NF 0001": "21:00:00", "NF 0002": "21:00:00"}}}),
        );

        let info = get_realtime_approach(&api, &api.base_data(), "1123002")
            .await
            .unwrap();
        assert_eq!(info.latest_passes["11015301"].car_code, "NF 0001");
    }

    #[tokio::test]
    async fn first_stop_events_are_dropped() {
        let mut api = FakeTransitApi::sakae_route();
        api.add_feed(
            "1123002",
            json!({
                "LATEST_BUS_PASS": {"11015/301": {"NF 9999": "20:00:00"}},
                "11015/301": {"NF 9998": "20:01:00"}
            }),
        );

        let info = get_realtime_approach(&api, &api.base_data(), "1123002")
            .await
            .unwrap();
        assert!(info.latest_passes.is_empty());
        assert!(info.current_positions.is_empty());
    }

    #[tokio::test]
    async fn current_positions_are_not_collapsed() {
        let mut api = FakeTransitApi::sakae_route();
        api.add_feed(
            "1123002",
            json!({"45055/301": {"NF 0001": "21:00:00", "NF 0002": "21:05:00"}}),
        );

        let info = get_realtime_approach(&api, &api.base_data(), "1123002")
            .await
            .unwrap();
        assert_eq!(info.current_positions.len(), 2);
        assert_eq!(info.current_positions[0].car_code, "NF 0001");
    }

    #[tokio::test]
    async fn stop_outside_route_is_an_error() {
        let mut api = FakeTransitApi::sakae_route();
        api.add_feed("1123002", json!({"99999/999": {"NF 0001": "21:00:00"}}));

        let err = get_realtime_approach(&api, &api.base_data(), "1123002")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApproachError::StopNotInRoute { ref bus_stop_code, .. } if bus_stop_code == "99999999"
        ));
    }

    #[tokio::test]
    async fn malformed_stop_code_in_route_is_an_error() {
        let mut api = FakeTransitApi::sakae_route();
        api.add_keito(
            "1123002",
            json!({"NAME": "栄２３", "FROM": "a", "TO": "b", "BUSSTOPS": ["12"]}),
        );

        let err = get_realtime_approach(&api, &api.base_data(), "1123002")
            .await
            .unwrap_err();
        assert!(matches!(err, ApproachError::InvalidBusStopCode(_)));
    }

    #[tokio::test]
    async fn unknown_route_propagates_not_found() {
        let api = FakeTransitApi::sakae_route();
        let err = get_realtime_approach(&api, &api.base_data(), "0000000")
            .await
            .unwrap_err();
        assert!(matches!(err, ApproachError::Api(ref e) if e.is_not_found()));
        assert!(err.to_string().contains("404 Not Found"));
    }
}
