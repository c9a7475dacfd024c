//! Tool-specific error types.

use thiserror::Error;

use crate::domains::bus::{ApproachError, BusApiError};

/// Errors that can occur during tool operations.
///
/// The display text is what the MCP client sees, so upstream messages such
/// as "404 Not Found for url ..." are carried unchanged.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A station or other business entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The upstream API or the approach engine failed.
    #[error("{0}")]
    ExecutionFailed(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// No station matched the name, exactly or fuzzily.
    pub fn station_not_found(name: &str) -> Self {
        Self::not_found(format!("Station not found: {name}"))
    }

    /// The station number is not in the reference data.
    pub fn station_number_not_found(number: u32) -> Self {
        Self::not_found(format!("Station number not found: {number}"))
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<BusApiError> for ToolError {
    fn from(err: BusApiError) -> Self {
        match err {
            BusApiError::InvalidRouteCode(_) => Self::invalid_arguments(err.to_string()),
            other => Self::ExecutionFailed(other.to_string()),
        }
    }
}

impl From<ApproachError> for ToolError {
    fn from(err: ApproachError) -> Self {
        match err {
            ApproachError::Api(api) => api.into(),
            ApproachError::InvalidBusStopCode(_) => Self::invalid_arguments(err.to_string()),
            other => Self::ExecutionFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn station_messages() {
        assert_eq!(
            ToolError::station_not_found("存在しない").to_string(),
            "Station not found: 存在しない"
        );
        assert_eq!(
            ToolError::station_number_not_found(99999).to_string(),
            "Station number not found: 99999"
        );
    }

    #[test]
    fn upstream_message_is_preserved() {
        let err: ToolError = ApproachError::from(BusApiError::not_found("https://x/y.json")).into();
        assert_eq!(err.to_string(), "404 Not Found for url https://x/y.json");
    }

    #[test]
    fn bad_route_code_is_invalid_arguments() {
        let err: ToolError = ApproachError::from(BusApiError::InvalidRouteCode("../x".into())).into();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert_eq!(err.to_string(), "Invalid arguments: Invalid route code: \"../x\"");
    }

    #[test]
    fn malformed_code_is_invalid_arguments() {
        let err: ToolError = ApproachError::InvalidBusStopCode("12".into()).into();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
