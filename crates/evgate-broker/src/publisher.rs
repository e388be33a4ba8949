use async_trait::async_trait;
use serde_json::Value;

use crate::errors::BrokerError;

/// Publishes a keyed JSON record to a topic and resolves once the
/// broker has acknowledged it. The gateway treats this as its only
/// reliable-publish primitive; partitioning and delivery guarantees
/// live behind it.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &Value) -> Result<(), BrokerError>;
}
