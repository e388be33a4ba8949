use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::BrokerError;
use crate::publisher::Publisher;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedRecord {
    pub topic: String,
    pub key: String,
    pub payload: Value,
}

/// A publisher that acknowledges immediately and keeps every record,
/// so tests can assert on what was sent where.
#[derive(Default)]
pub struct MemoryPublisher {
    records: Mutex<Vec<PublishedRecord>>,
}

impl MemoryPublisher {
    pub fn new() -> Self {
        MemoryPublisher::default()
    }

    pub fn records(&self) -> Vec<PublishedRecord> {
        self.records.lock().clone()
    }

    pub fn records_for(&self, topic: &str) -> Vec<PublishedRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.topic == topic)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &Value) -> Result<(), BrokerError> {
        self.records.lock().push(PublishedRecord {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.clone(),
        });
        Ok(())
    }
}
