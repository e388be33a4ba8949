use std::collections::HashMap;

use async_trait::async_trait;
use evgate_types::prelude::JsonStream;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;

use crate::errors::{unsupported_query, StoreError};
use crate::filter;
use crate::spi::DocumentStore;

const MATCH: &str = "$match";

/// An in-memory document store. The default backend for embedded and
/// test setups; aggregation supports the `$match` stages the gateway
/// produces and rejects everything else.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn insert(&self, collection: &str, doc: Value) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    fn select(&self, collection: &str, filter: &Value) -> Vec<Value> {
        self.collections
            .read()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter::matches(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Value,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.select(collection, filter).into_iter().next())
    }

    async fn find(&self, collection: &str, filter: &Value) -> Result<JsonStream, StoreError> {
        let docs = self.select(collection, filter);
        Ok(stream::iter(docs.into_iter().map(Ok)).boxed())
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &[Value],
    ) -> Result<JsonStream, StoreError> {
        let mut docs: Vec<Value> = self
            .collections
            .read()
            .get(collection)
            .cloned()
            .unwrap_or_default();

        for stage in pipeline {
            match stage.as_object().and_then(|s| s.get(MATCH)) {
                Some(condition) => {
                    docs.retain(|doc| filter::matches(doc, condition));
                }
                None => {
                    return Err(unsupported_query(&format!(
                        "memory store only supports {MATCH} stages, got: {stage}"
                    )))
                }
            }
        }

        Ok(stream::iter(docs.into_iter().map(Ok)).boxed())
    }
}
