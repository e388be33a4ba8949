use async_trait::async_trait;
use evgate_types::prelude::JsonStream;
use serde_json::Value;

use crate::errors::StoreError;

/// The read-side document store. Collections are named by the
/// aggregate full type (plus any environment suffix); filters and
/// pipelines use the query syntax of [`crate::filter`]. Handles are
/// long-lived and safe to share across in-flight requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Value,
    ) -> Result<Option<Value>, StoreError>;

    async fn find(&self, collection: &str, filter: &Value) -> Result<JsonStream, StoreError>;

    /// Runs an aggregation pipeline, a sequence of stage documents.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Value],
    ) -> Result<JsonStream, StoreError>;
}
