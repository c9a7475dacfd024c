//! Nagoya city bus domain.
//!
//! - `client` - transit API gateway and route master cache
//! - `models` - upstream JSON schema
//! - `base_data` - station and pole reference tables, fuzzy lookup
//! - `approach` - live approach engine for one route
//! - `station_approach` - live approach aggregated over a station
//! - `context` - shared state handed to tools

pub mod approach;
pub mod base_data;
pub mod client;
pub mod context;
pub mod error;
pub mod models;
pub mod similarity;
pub mod station_approach;

#[cfg(test)]
pub(crate) mod testing;

pub use approach::{ApproachBusStop, ApproachInfo, ApproachPosition, get_realtime_approach};
pub use base_data::{BaseData, DEFAULT_FUZZY_CUTOFF};
pub use client::{BusClient, CachedBusClient, TransitApi};
pub use context::BusContext;
pub use error::{ApproachError, BusApiError};
pub use station_approach::{StationApproach, get_station_approach};
