//! Read-side audit trail. Every read answered from the store yields a
//! record on the audit topic saying who read what and when; the write
//! side is already audited downstream by the event-sourcing engine.

use std::sync::Arc;

use chrono::Utc;
use evgate_broker::prelude::{BrokerError, Publisher};
use evgate_types::fields::audit;
use evgate_types::prelude::{Address, Claims};
use serde_json::{json, Value};
use tracing::debug;

pub struct AuditEmitter {
    topic: Option<String>,
    publisher: Arc<dyn Publisher>,
}

impl AuditEmitter {
    pub fn new(topic: Option<String>, publisher: Arc<dyn Publisher>) -> Self {
        AuditEmitter { topic, publisher }
    }

    /// Publishes an activity record for a read action, keyed by the
    /// addressed instance or, for collection reads, the full type. A
    /// no-op when auditing is disabled. Failed publishes fail the
    /// request; a read that cannot be audited is not answered.
    pub async fn emit(
        &self,
        claims: &Claims,
        address: &Address,
        action: &str,
    ) -> Result<(), BrokerError> {
        let Some(topic) = self.topic.as_deref() else {
            return Ok(());
        };
        let Some(full_type) = address.full_type() else {
            return Ok(());
        };

        let record = audit_record(claims, &full_type, address.instance_id(), action);
        let key = address.instance_id().unwrap_or(&full_type);
        debug!(topic, key, action, "emitting audit record");
        self.publisher.publish(topic, key, &record).await
    }
}

fn audit_record(claims: &Claims, full_type: &str, id: Option<&str>, action: &str) -> Value {
    let mut record = json!({
        (audit::TYPE): full_type,
        (audit::COMMAND): action,
        (audit::TIMESTAMP): Utc::now().timestamp_millis(),
        // Dispatch already requires a subject; the fallback keeps the
        // record well-formed should that ever change.
        (audit::USER): claims.subject().unwrap_or("anonymous"),
        (audit::BREAKING_THE_GLASS): claims.breaking_the_glass(),
    });
    if let Some(id) = id {
        record[audit::AGGREGATE] = json!(id);
    }
    record
}
