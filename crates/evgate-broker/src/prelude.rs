pub use crate::errors::BrokerError;
#[cfg(feature = "kafka")]
pub use crate::kafka::{KafkaConfig, KafkaPublisher, KafkaSecurityConfig};
pub use crate::memory::{MemoryPublisher, PublishedRecord};
pub use crate::publisher::Publisher;
