use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("publish not acknowledged: {0}")]
    NotAcknowledged(String),

    #[error("broker unavailable: {0}")]
    Unavailable(String),

    #[error("invalid broker configuration: {0}")]
    Config(String),
}

pub fn not_acknowledged(msg: &str) -> BrokerError {
    BrokerError::NotAcknowledged(msg.to_string())
}

pub fn unavailable(msg: &str) -> BrokerError {
    BrokerError::Unavailable(msg.to_string())
}

pub fn config(msg: &str) -> BrokerError {
    BrokerError::Config(msg.to_string())
}
