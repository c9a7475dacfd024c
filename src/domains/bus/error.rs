//! Error types for the bus domain.
//!
//! Gateway failures ([`BusApiError`]) and engine failures ([`ApproachError`])
//! are kept apart so tools can tell an upstream outage from malformed data.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the upstream transit API gateway.
#[derive(Debug, Error)]
pub enum BusApiError {
    /// Upstream answered with a non-success status, or with the HTML
    /// "not found" page the city API serves under a 200.
    #[error("{status} for url {url}")]
    Status { status: StatusCode, url: String },

    /// Network failure, timeout, or an unreadable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body did not match the expected upstream JSON shape.
    #[error("Unexpected JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A route code that cannot be used as a URL path segment.
    #[error("Invalid route code: {0:?}")]
    InvalidRouteCode(String),

    /// The configured base URL could not be used to build a request.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl BusApiError {
    /// Create a status error.
    pub fn status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::Status {
            status,
            url: url.into(),
        }
    }

    /// Create a 404 error, used for both genuine and disguised "not found".
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::status(StatusCode::NOT_FOUND, url)
    }

    /// Whether this error means the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Errors from the approach engine and the station aggregator.
#[derive(Debug, Error)]
pub enum ApproachError {
    /// Upstream fetch failed.
    #[error(transparent)]
    Api(#[from] BusApiError),

    /// A bus-stop code did not start with a 5-digit station number.
    #[error("bus_stop_code must be at least 5 digits, got: {0:?}")]
    InvalidBusStopCode(String),

    /// The live feed referenced a stop that is not on the route.
    #[error("bus stop {bus_stop_code} is not part of route {route_code}")]
    StopNotInRoute {
        route_code: String,
        bus_stop_code: String,
    },
}
