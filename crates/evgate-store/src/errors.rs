use evgate_types::prelude::BodyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),
}

pub fn unavailable(msg: &str) -> StoreError {
    StoreError::Unavailable(msg.to_string())
}

pub fn unsupported_query(msg: &str) -> StoreError {
    StoreError::UnsupportedQuery(msg.to_string())
}

impl From<StoreError> for BodyError {
    fn from(err: StoreError) -> Self {
        BodyError(err.to_string())
    }
}
