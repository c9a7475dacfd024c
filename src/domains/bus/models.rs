//! Upstream JSON schema of the Nagoya city transit API.
//!
//! Field names on the wire are upper-case. Objects whose key order carries
//! meaning are read either through `serde_json::Map`, which keeps insertion
//! order with the `preserve_order` feature, or into [`OrderedMap`].

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// JSON object kept as a list of entries in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<K, V>(pub Vec<(K, V)>);

impl<K, V> OrderedMap<K, V> {
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.0.iter().map(|(k, _)| k)
    }
}

impl<K: PartialEq, V> OrderedMap<K, V> {
    /// First value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<K, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'de, K, V> Deserialize<'de> for OrderedMap<K, V>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<K, V>(PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for EntriesVisitor<K, V>
        where
            K: Deserialize<'de>,
            V: Deserialize<'de>,
        {
            type Value = OrderedMap<K, V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

impl<K: Serialize, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<V: JsonSchema> JsonSchema for OrderedMap<String, V> {
    fn schema_name() -> Cow<'static, str> {
        <BTreeMap<String, V>>::schema_name()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        <BTreeMap<String, V>>::json_schema(generator)
    }
}

/// One `(name, number)` row of the station-name table, in upstream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationEntry {
    pub name: String,
    pub number: u32,
}

/// Station-name table, e.g. `{"白川通大津": 22460, "栄": 22010}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationNames(pub Vec<StationEntry>);

impl StationNames {
    /// Parse the upstream object, keeping key order.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let map: Map<String, Value> = serde_json::from_value(value)?;
        map.into_iter()
            .map(|(name, number)| {
                Ok(StationEntry {
                    name,
                    number: serde_json::from_value(number)?,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()
            .map(Self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationEntry> {
        self.0.iter()
    }
}

impl<const N: usize> From<[(&str, u32); N]> for StationNames {
    fn from(rows: [(&str, u32); N]) -> Self {
        Self(
            rows.into_iter()
                .map(|(name, number)| StationEntry {
                    name: name.to_string(),
                    number,
                })
                .collect(),
        )
    }
}

/// Entry of the global pole table, keyed by bus-stop code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusStopPoleInfo {
    #[serde(rename = "BC", default)]
    pub bc: String,
    #[serde(rename = "C", default)]
    pub c: String,
    /// Pole label, e.g. "1番".
    #[serde(rename = "N")]
    pub n: String,
}

/// Global pole table, e.g. `{"01110301": {"BC": "301", "C": "301", "N": "1番"}}`.
pub type BusStopPoleInfos = BTreeMap<String, BusStopPoleInfo>;

/// Timetable of one route/pole at a station.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct DiagramRoute {
    /// Pole label, e.g. "1番".
    pub polename: String,
    /// Destinations, e.g. `["名古屋大学(吹上経由)"]`.
    pub railway: Vec<String>,
    /// Route codes served by this timetable.
    #[serde(default, rename = "RAILWAY_IDS")]
    pub railway_ids: Vec<u64>,
    /// Stops, grouped by segment.
    pub stations: Vec<Vec<String>>,
    /// Departures: day label -> hour -> minutes, in upstream order.
    pub diagram: OrderedMap<String, OrderedMap<u32, Vec<u32>>>,
}

/// Station timetable: route name (e.g. "栄17") -> timetables.
pub type DiagramResponse = OrderedMap<String, Vec<DiagramRoute>>;

/// A boarding pole listed in a station's bus-stop master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BusStopPole {
    /// Route codes served, e.g. `["1117001", "1120011"]`.
    pub keitos: Vec<String>,
    /// Pole suffix of the bus-stop code, e.g. "5E1".
    pub code: String,
    #[serde(default)]
    pub bcode: String,
    /// Pole label, e.g. "1番".
    pub noriba: String,
}

/// Bus-stop master of a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct BusStopResponse {
    pub poles: Vec<BusStopPole>,
    pub name: String,
    #[serde(default)]
    pub kana: String,
}

/// Route ("keito") master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Keito {
    /// Display name, possibly with full-width digits ("栄２３").
    pub name: String,
    pub from: String,
    pub to: String,
    /// Routing qualifier such as "地下鉄高畑経由"; empty when absent.
    #[serde(default)]
    pub article: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub no: String,
    #[serde(default)]
    pub keito: String,
    #[serde(default)]
    pub rosen: String,
    /// Ordered stop sequence (bus-stop codes).
    pub busstops: Vec<String>,
}

/// A car and the time it passed the stop before the keyed next stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarPass {
    pub car_code: String,
    pub passed_time: String,
}

/// Feed events sharing one next-stop key ("71145/1E1").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopEvents {
    pub next_stop: String,
    pub cars: Vec<CarPass>,
}

impl StopEvents {
    /// Next-stop key in bus-stop code form (slash removed).
    pub fn next_stop_code(&self) -> String {
        self.next_stop.replace('/', "")
    }
}

/// Live approach feed of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealtimeApproach {
    pub latest_bus_pass: Vec<StopEvents>,
    pub current_bus_positions: Vec<StopEvents>,
}

const LATEST_BUS_PASS: &str = "LATEST_BUS_PASS";

impl RealtimeApproach {
    /// Split the raw feed into latest-pass and current-position events.
    ///
    /// `LATEST_BUS_PASS` holds `{next_stop: {car: time}}`; every other
    /// top-level key is itself a current-position entry.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let map: Map<String, Value> = serde_json::from_value(value)?;
        let mut approach = Self::default();
        for (key, value) in map {
            if key == LATEST_BUS_PASS {
                let stops: Map<String, Value> = serde_json::from_value(value)?;
                for (next_stop, cars) in stops {
                    approach
                        .latest_bus_pass
                        .push(stop_events(next_stop, cars)?);
                }
            } else {
                approach.current_bus_positions.push(stop_events(key, value)?);
            }
        }
        Ok(approach)
    }
}

fn stop_events(next_stop: String, cars: Value) -> Result<StopEvents, serde_json::Error> {
    let cars: Map<String, Value> = serde_json::from_value(cars)?;
    let cars = cars
        .into_iter()
        .map(|(car_code, time)| {
            Ok(CarPass {
                car_code,
                passed_time: serde_json::from_value(time)?,
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;
    Ok(StopEvents { next_stop, cars })
}
