use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::{self, BrokerError};
use crate::publisher::Publisher;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    #[serde(default = "KafkaConfig::default_acks")]
    pub acks: String,
    #[serde(default = "KafkaConfig::default_linger_ms")]
    pub linger_ms: u64,
    #[serde(default = "KafkaConfig::default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,
    #[serde(default)]
    pub security: Option<KafkaSecurityConfig>,
}

impl KafkaConfig {
    fn default_acks() -> String {
        "all".to_string()
    }

    fn default_linger_ms() -> u64 {
        50
    }

    fn default_delivery_timeout_ms() -> u64 {
        30_000
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct KafkaSecurityConfig {
    #[serde(default)]
    pub security_protocol: Option<String>,
    #[serde(default)]
    pub sasl_mechanism: Option<String>,
    #[serde(default)]
    pub sasl_username: Option<String>,
    #[serde(default)]
    pub sasl_password: Option<String>,
    #[serde(default)]
    pub ca_location: Option<String>,
}

/// A Kafka-backed publisher. Records are keyed so the broker keeps
/// per-instance command ordering within a partition.
pub struct KafkaPublisher {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaPublisher {
    pub fn new(cfg: KafkaConfig) -> Result<Self, BrokerError> {
        if cfg.brokers.is_empty() {
            return Err(errors::config("kafka brokers must not be empty"));
        }

        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", cfg.brokers.join(","))
            .set("linger.ms", cfg.linger_ms.to_string())
            .set("acks", &cfg.acks)
            .set("enable.idempotence", "true")
            .set("message.timeout.ms", cfg.delivery_timeout_ms.to_string());

        if let Some(security) = cfg.security.as_ref() {
            if let Some(protocol) = &security.security_protocol {
                client_config.set("security.protocol", protocol);
            }
            if let Some(mechanism) = &security.sasl_mechanism {
                client_config.set("sasl.mechanism", mechanism);
            }
            if let Some(username) = &security.sasl_username {
                client_config.set("sasl.username", username);
            }
            if let Some(password) = &security.sasl_password {
                client_config.set("sasl.password", password);
            }
            if let Some(ca) = &security.ca_location {
                client_config.set("ssl.ca.location", ca);
            }
        }

        let producer = client_config
            .create()
            .map_err(|err| errors::unavailable(&format!("kafka producer: {err}")))?;

        Ok(Self {
            producer,
            timeout: Duration::from_millis(cfg.delivery_timeout_ms.max(1)),
        })
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &Value) -> Result<(), BrokerError> {
        let data = serde_json::to_vec(payload)
            .map_err(|err| errors::config(&format!("payload not serializable: {err}")))?;
        let record = FutureRecord::to(topic).key(key).payload(&data);
        let (partition, offset) = self
            .producer
            .send(record, self.timeout)
            .await
            .map_err(|(err, _)| errors::not_acknowledged(&format!("kafka send failed: {err}")))?;
        debug!(topic, key, partition, offset, "record acknowledged");
        Ok(())
    }
}
