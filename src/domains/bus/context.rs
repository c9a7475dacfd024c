//! Shared state for every tool call.

use std::sync::Arc;

use tracing::info;

use crate::core::config::BusApiConfig;

use super::base_data::BaseData;
use super::client::{BusClient, CachedBusClient, TransitApi};
use super::error::BusApiError;

/// Transit API gateway plus the reference data loaded from it.
///
/// Built once before the transport starts and handed to each tool route.
/// Dropping the last handle releases the HTTP connection pool.
pub struct BusContext {
    pub api: Arc<dyn TransitApi>,
    pub base_data: BaseData,
}

impl BusContext {
    /// Build the real client stack and load reference data.
    pub async fn init(config: &BusApiConfig) -> Result<Self, BusApiError> {
        info!("Initializing transit API client for {}", config.base_url);
        let client = BusClient::new(config)?;
        let api: Arc<dyn TransitApi> =
            Arc::new(CachedBusClient::new(client, config.route_cache_capacity));
        Self::with_api(api).await
    }

    /// Load reference data through an existing gateway.
    pub async fn with_api(api: Arc<dyn TransitApi>) -> Result<Self, BusApiError> {
        let base_data = BaseData::load(api.as_ref()).await?;
        Ok(Self { api, base_data })
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }
}
