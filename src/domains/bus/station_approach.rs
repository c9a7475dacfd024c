//! Live approach view of a whole station.
//!
//! Runs the route engine for every (route, pole) pair at the station,
//! keeps the pairs with some activity and orders them by how close the
//! nearest bus is.

use futures::future::try_join_all;
use tracing::info;

use super::approach::{ApproachPosition, UNKNOWN_POLE, get_realtime_approach};
use super::base_data::BaseData;
use super::client::TransitApi;
use super::error::ApproachError;
use super::models::BusStopPole;

/// Rank of a route with no bus approaching the pole.
pub const NO_APPROACH_RANK: usize = u32::MAX as usize;

/// A bus heading to the pole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproachingBus {
    /// Stops between the bus and the pole (at least 1).
    pub stops_before: usize,
    pub position: ApproachPosition,
}

/// One route at one pole of the station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAtPole {
    pub route_code: String,
    pub route: String,
    pub direction: String,
    pub pole: String,
    pub last_pass_time: Option<String>,
    pub approaching: Vec<ApproachingBus>,
    /// Smallest `stops_before`, or [`NO_APPROACH_RANK`].
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationApproach {
    pub station_number: u32,
    pub station_name: String,
    /// Active routes, nearest bus first.
    pub routes: Vec<RouteAtPole>,
}

/// Bus-stop code of a pole: zero-padded station number + pole suffix.
pub fn pole_bus_stop_code(station_number: u32, pole: &BusStopPole) -> String {
    format!("{station_number:05}{}", pole.code)
}

/// Fetch the station's poles and aggregate live state over all routes.
///
/// A failure on any route fails the whole call.
pub async fn get_station_approach(
    api: &dyn TransitApi,
    base_data: &BaseData,
    station_number: u32,
) -> Result<StationApproach, ApproachError> {
    let bus_stop = api.bus_stop(station_number).await?;

    let pairs: Vec<(&str, &BusStopPole)> = bus_stop
        .poles
        .iter()
        .flat_map(|pole| pole.keitos.iter().map(move |code| (code.as_str(), pole)))
        .collect();
    info!(
        "Fetching live state of {} route(s) at station {}",
        pairs.len(),
        station_number
    );

    let infos = try_join_all(
        pairs
            .iter()
            .map(|(route_code, _)| get_realtime_approach(api, base_data, route_code)),
    )
    .await?;

    let mut routes = Vec::new();
    for ((route_code, pole), info) in pairs.into_iter().zip(infos) {
        let target = pole_bus_stop_code(station_number, pole);

        let approaching: Vec<ApproachingBus> = info
            .current_positions_before_code(&target)
            .into_iter()
            .map(|(stops_before, position)| ApproachingBus {
                stops_before,
                position: position.clone(),
            })
            .collect();
        let last_pass_time = info.last_pass_time_for_code(&target).map(str::to_string);

        if last_pass_time.is_none() && approaching.is_empty() {
            continue;
        }

        let rank = approaching
            .iter()
            .map(|bus| bus.stops_before)
            .min()
            .unwrap_or(NO_APPROACH_RANK);
        let pole = info
            .bus_stop_for_code(&target)
            .map_or(UNKNOWN_POLE, |stop| stop.pole.as_str())
            .to_string();

        routes.push(RouteAtPole {
            route_code: route_code.to_string(),
            route: info.route,
            direction: info.direction,
            pole,
            last_pass_time,
            approaching,
            rank,
        });
    }

    routes.sort_by_key(|route| route.rank);

    Ok(StationApproach {
        station_number,
        station_name: bus_stop.name,
        routes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::bus::testing::FakeTransitApi;
    use serde_json::json;

    /// 栄 with a second route whose nearest bus is closer than route 1123002's.
    fn busy_station() -> FakeTransitApi {
        let mut api = FakeTransitApi::sakae_route();
        api.add_feed("1123002", json!({"45055/301": {"NF 0612": "21:31:42"}}));
        api.add_keito(
            "1201001",
            json!({
                "NAME": "基幹２",
                "FROM": "野田",
                "TO": "栄",
                "ARTICLE": "新出来町経由",
                "BUSSTOPS": ["45055301", "210101E1"]
            }),
        );
        api.add_feed("1201001", json!({"21010/1E1": {"NF 0700": "21:50:00"}}));
        api.add_keito(
            "1301001",
            json!({
                "NAME": "栄１",
                "FROM": "野田",
                "TO": "栄",
                "BUSSTOPS": ["45055301", "210101E1"]
            }),
        );
        api.add_feed("1301001", json!({}));
        api.add_bus_stop(
            21010,
            json!({
                "NAME": "栄",
                "POLES": [
                    {"KEITOS": ["1123002", "1301001"], "CODE": "1E1", "NORIBA": "3番"},
                    {"KEITOS": ["1201001"], "CODE": "1E1", "NORIBA": "3番"}
                ]
            }),
        );
        api
    }

    #[tokio::test]
    async fn ranks_routes_by_nearest_bus() {
        let api = busy_station();
        let approach = get_station_approach(&api, &api.base_data(), 21010)
            .await
            .unwrap();

        assert_eq!(approach.station_name, "栄");
        let codes: Vec<_> = approach.routes.iter().map(|r| r.route_code.as_str()).collect();
        // 1301001 has no activity and is dropped.
        assert_eq!(codes, vec!["1201001", "1123002"]);

        let nearest = &approach.routes[0];
        assert_eq!(nearest.rank, 1);
        assert_eq!(nearest.route, "基幹2");
        assert_eq!(nearest.direction, "野田発 新出来町経由 栄行き");
        assert_eq!(nearest.pole, "3番");
        assert_eq!(nearest.last_pass_time, None);

        let sakae = &approach.routes[1];
        let stops: Vec<_> = sakae.approaching.iter().map(|b| b.stops_before).collect();
        assert_eq!(stops, vec![2]);
        assert_eq!(sakae.rank, 2);
        assert_eq!(sakae.approaching[0].position.previous_stop.station_name, "中川車庫前");
    }

    #[tokio::test]
    async fn last_pass_only_routes_sort_last() {
        let mut api = FakeTransitApi::sakae_route();
        // Bus already past 野田: latest pass recorded at the station, nobody approaching.
        api.add_keito(
            "1123002",
            json!({
                "NAME": "栄２３", "FROM": "中川車庫前", "TO": "栄",
                "BUSSTOPS": ["11015301", "210101E1", "45055301"]
            }),
        );
        api.add_feed(
            "1123002",
            json!({"LATEST_BUS_PASS": {"45055/301": {"NF 0612": "21:24:41"}}}),
        );

        let approach = get_station_approach(&api, &api.base_data(), 21010)
            .await
            .unwrap();
        assert_eq!(approach.routes.len(), 1);
        let route = &approach.routes[0];
        assert_eq!(route.rank, NO_APPROACH_RANK);
        assert_eq!(route.last_pass_time.as_deref(), Some("21:24:41"));
        assert!(route.approaching.is_empty());
    }

    #[tokio::test]
    async fn equal_ranks_keep_pole_order() {
        let mut api = busy_station();
        api.add_feed("1201001", json!({"21010/1E1": {"NF 0700": "21:50:00"}}));
        api.add_feed("1123002", json!({"21010/1E1": {"NF 0613": "21:44:45"}}));

        let approach = get_station_approach(&api, &api.base_data(), 21010)
            .await
            .unwrap();
        let codes: Vec<_> = approach.routes.iter().map(|r| r.route_code.as_str()).collect();
        assert_eq!(codes, vec!["1123002", "1201001"]);
    }

    #[tokio::test]
    async fn unknown_pole_uses_placeholder() {
        let mut api = FakeTransitApi::sakae_route();
        api.poles.remove("210101E1");

        let approach = get_station_approach(&api, &api.base_data(), 21010)
            .await
            .unwrap();
        assert_eq!(approach.routes[0].pole, UNKNOWN_POLE);
    }

    #[tokio::test]
    async fn one_failing_route_fails_the_station() {
        let mut api = busy_station();
        api.break_feed("1301001");

        let err = get_station_approach(&api, &api.base_data(), 21010)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500 Internal Server Error"));
    }

    #[tokio::test]
    async fn unknown_station_is_not_found() {
        let api = FakeTransitApi::sakae_route();
        let err = get_station_approach(&api, &api.base_data(), 99999)
            .await
            .unwrap_err();
        assert!(matches!(err, ApproachError::Api(ref e) if e.is_not_found()));
    }

    #[test]
    fn pole_code_is_zero_padded() {
        let pole = BusStopPole {
            keitos: vec![],
            code: "702".to_string(),
            bcode: String::new(),
            noriba: "2番".to_string(),
        };
        assert_eq!(pole_bus_stop_code(2200, &pole), "02200702");
    }
}
