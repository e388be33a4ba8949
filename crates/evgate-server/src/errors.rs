use evgate_broker::prelude::BrokerError;
use evgate_store::prelude::StoreError;
use thiserror::Error;

/// Failures a request cannot answer for itself. Routing, validation
/// and authentication problems become 4xx/5xx responses instead; only
/// configuration mistakes and downstream outages surface here, always
/// scoped to the single request (or construction) that hit them.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid gateway configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("crypto failure: {0}")]
    Crypto(String),
}

pub fn config(msg: &str) -> GatewayError {
    GatewayError::Config(msg.to_string())
}

pub fn crypto(msg: &str) -> GatewayError {
    GatewayError::Crypto(msg.to_string())
}
