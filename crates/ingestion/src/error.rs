//! Ingestion error types

use contracts::FlowName;
use drr_engine::DrrError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The scheduler rejected a flow
    #[error("failed to register flow {flow}: {source}")]
    Register {
        flow: FlowName,
        #[source]
        source: DrrError,
    },

    /// A producer rate that cannot be turned into a period
    #[error("invalid rate for flow {flow}: {rate_hz} Hz")]
    InvalidRate { flow: FlowName, rate_hz: f64 },

    /// Channel capacity of zero
    #[error("flow {flow} needs a channel capacity above zero")]
    ZeroCapacity { flow: FlowName },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
