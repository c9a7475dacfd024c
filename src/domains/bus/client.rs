//! HTTP gateway to the Nagoya city transit API.
//!
//! [`TransitApi`] is the seam the engine depends on. [`BusClient`] is the
//! real implementation over a single shared `reqwest::Client`, and
//! [`CachedBusClient`] memoizes the immutable route masters on top of any
//! other implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::core::config::BusApiConfig;

use super::error::BusApiError;
use super::models::{
    BusStopPoleInfos, BusStopResponse, DiagramResponse, Keito, RealtimeApproach, StationNames,
};

/// Marker the upstream puts in the HTML page it serves (with a 200) for
/// unknown resources.
const NOT_FOUND_MARKER: &[u8] = b"404 NotFound";

/// Read operations against the transit API.
#[async_trait]
pub trait TransitApi: Send + Sync {
    /// Base URL, used to build links to the public web pages.
    fn base_url(&self) -> &str;

    /// Station-name table.
    async fn station_names(&self) -> Result<StationNames, BusApiError>;

    /// Global bus-stop-code -> pole table.
    async fn bus_stop_pole_info(&self) -> Result<BusStopPoleInfos, BusApiError>;

    /// Timetable diagram of a station.
    async fn station_diagram(&self, station_number: u32) -> Result<DiagramResponse, BusApiError>;

    /// Bus-stop master (poles and their routes) of a station.
    async fn bus_stop(&self, station_number: u32) -> Result<BusStopResponse, BusApiError>;

    /// Route master.
    async fn keito(&self, route_code: &str) -> Result<Arc<Keito>, BusApiError>;

    /// Live approach feed of a route. Never cached.
    async fn realtime_approach(&self, route_code: &str) -> Result<RealtimeApproach, BusApiError>;
}

/// Client for the transit API.
///
/// Holds one `reqwest::Client` for the server's lifetime; dropping the
/// `BusClient` releases its connection pool.
#[derive(Debug, Clone)]
pub struct BusClient {
    http: reqwest::Client,
    base_url: String,
}

impl BusClient {
    /// Create a client from configuration.
    pub fn new(config: &BusApiConfig) -> Result<Self, BusApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| BusApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let mut builder = reqwest::Client::builder();
        // 0 means no timeout.
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let http = builder.build()?;

        Ok(Self { http, base_url })
    }

    /// Live approach feed with an explicit cache-busting timestamp.
    pub async fn realtime_approach_at(
        &self,
        route_code: &str,
        at: DateTime<Utc>,
    ) -> Result<RealtimeApproach, BusApiError> {
        check_route_code(route_code)?;
        let path = format!("/BUS_SEKKIN/realtime_json/{route_code}.json");
        let (url, value) = self
            .fetch::<serde_json::Value>(&path, &[("_", at.timestamp().to_string())])
            .await?;
        RealtimeApproach::from_json(value).map_err(|source| BusApiError::Json { url, source })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BusApiError> {
        self.fetch(path, &[]).await.map(|(_, value)| value)
    }

    /// GET `path`, reject error statuses and the disguised 404 page, and
    /// decode the body.
    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(String, T), BusApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("Upstream returned {} for {}", status, url);
            return Err(BusApiError::status(status, url));
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/html"));
        let body = response.bytes().await?;

        if is_html && contains(&body, NOT_FOUND_MARKER) {
            warn!("Upstream served its not-found page for {}", url);
            return Err(BusApiError::not_found(url));
        }

        match serde_json::from_slice(&body) {
            Ok(value) => Ok((url, value)),
            Err(source) => Err(BusApiError::Json { url, source }),
        }
    }
}

/// Route codes become a URL path segment, so only ASCII alphanumerics pass.
fn check_route_code(route_code: &str) -> Result<(), BusApiError> {
    if route_code.is_empty() || !route_code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(BusApiError::InvalidRouteCode(route_code.to_string()));
    }
    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[async_trait]
impl TransitApi for BusClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn station_names(&self) -> Result<StationNames, BusApiError> {
        let path = "/STATION_DATA/station_infos/station_name.json";
        let value = self.get_json(path).await?;
        StationNames::from_json(value).map_err(|source| BusApiError::Json {
            url: format!("{}{}", self.base_url, path),
            source,
        })
    }

    async fn bus_stop_pole_info(&self) -> Result<BusStopPoleInfos, BusApiError> {
        self.get_json("/STATION_DATA/station_infos/buspole_infos.json")
            .await
    }

    async fn station_diagram(&self, station_number: u32) -> Result<DiagramResponse, BusApiError> {
        self.get_json(&format!(
            "/STATION_DATA/station_infos/diagrams/{station_number}.json"
        ))
        .await
    }

    async fn bus_stop(&self, station_number: u32) -> Result<BusStopResponse, BusApiError> {
        self.get_json(&format!(
            "/BUS_SEKKIN/master_json/busstops/{station_number:05}.json"
        ))
        .await
    }

    async fn keito(&self, route_code: &str) -> Result<Arc<Keito>, BusApiError> {
        check_route_code(route_code)?;
        self.get_json(&format!("/BUS_SEKKIN/master_json/keitos/{route_code}.json"))
            .await
            .map(Arc::new)
    }

    async fn realtime_approach(&self, route_code: &str) -> Result<RealtimeApproach, BusApiError> {
        self.realtime_approach_at(route_code, Utc::now()).await
    }
}

/// [`TransitApi`] decorator caching route masters by route code.
///
/// Route masters do not change while the server runs. Two concurrent misses
/// for the same code both fetch; the later insert wins.
pub struct CachedBusClient<A = BusClient> {
    inner: A,
    keitos: Cache<String, Arc<Keito>>,
}

impl<A: TransitApi> CachedBusClient<A> {
    /// Wrap `inner`, keeping at most `capacity` route masters.
    pub fn new(inner: A, capacity: u64) -> Self {
        Self {
            inner,
            keitos: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// The wrapped implementation.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: TransitApi> TransitApi for CachedBusClient<A> {
    fn base_url(&self) -> &str {
        self.inner.base_url()
    }

    async fn station_names(&self) -> Result<StationNames, BusApiError> {
        self.inner.station_names().await
    }

    async fn bus_stop_pole_info(&self) -> Result<BusStopPoleInfos, BusApiError> {
        self.inner.bus_stop_pole_info().await
    }

    async fn station_diagram(&self, station_number: u32) -> Result<DiagramResponse, BusApiError> {
        self.inner.station_diagram(station_number).await
    }

    async fn bus_stop(&self, station_number: u32) -> Result<BusStopResponse, BusApiError> {
        self.inner.bus_stop(station_number).await
    }

    async fn keito(&self, route_code: &str) -> Result<Arc<Keito>, BusApiError> {
        if let Some(keito) = self.keitos.get(route_code).await {
            debug!("Route master cache hit for {}", route_code);
            return Ok(keito);
        }
        let keito = self.inner.keito(route_code).await?;
        self.keitos
            .insert(route_code.to_string(), keito.clone())
            .await;
        Ok(keito)
    }

    async fn realtime_approach(&self, route_code: &str) -> Result<RealtimeApproach, BusApiError> {
        self.inner.realtime_approach(route_code).await
    }
}
