//! Request dispatch. One [`Gateway`] instance serves all requests: it
//! resolves the address, authenticates the caller, then routes by
//! method. Writes become command envelopes on the broker and answer
//! 202 before any effect is visible; reads run against the document
//! store with the caller's ACL filter applied.

use std::sync::Arc;

use evgate_auth::prelude::{bearer_token, TokenVerifier};
use evgate_broker::prelude::Publisher;
use evgate_store::prelude::{filter, DocumentStore};
use evgate_types::fields;
use evgate_types::prelude::{Address, Claims, JsonStream, Request, Response};
use futures::{future, StreamExt};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::audit::AuditEmitter;
use crate::command;
use crate::config::GatewayConfig;
use crate::errors::GatewayError;
use crate::fanout::FanoutBridge;
use crate::query;

/// Decides per document whether it may appear in a response body.
/// Documents it rejects are dropped from collection results and turn a
/// single-instance read into a forbidden response.
pub type ResponseFilter = Arc<dyn Fn(&Value, &Claims) -> bool + Send + Sync>;

pub struct Gateway {
    context_path: Vec<String>,
    environment: Option<String>,
    breaking_the_glass: bool,
    verifier: TokenVerifier,
    publisher: Arc<dyn Publisher>,
    store: Option<Arc<dyn DocumentStore>>,
    audit: AuditEmitter,
    fanout: Option<FanoutBridge>,
    response_filter: ResponseFilter,
}

impl Gateway {
    /// Builds a gateway from validated configuration. The store is
    /// optional; without one, read requests answer 501 while the write
    /// side keeps working.
    pub fn new(
        config: &GatewayConfig,
        verifier: TokenVerifier,
        publisher: Arc<dyn Publisher>,
        store: Option<Arc<dyn DocumentStore>>,
    ) -> Result<Self, GatewayError> {
        let context_path = config.context_segments();
        let fanout = config
            .fanout
            .as_ref()
            .map(|fanout| FanoutBridge::new(fanout, &context_path))
            .transpose()?;

        Ok(Gateway {
            context_path,
            environment: config.environment.clone(),
            breaking_the_glass: config.breaking_the_glass,
            verifier,
            publisher: publisher.clone(),
            store,
            audit: AuditEmitter::new(config.audit_topic.clone(), publisher),
            fanout,
            response_filter: Arc::new(|_, _| true),
        })
    }

    pub fn with_response_filter(mut self, filter: ResponseFilter) -> Self {
        self.response_filter = filter;
        self
    }

    /// Handles one request. Errors are downstream failures only;
    /// routing, validation and authentication problems all come back
    /// as regular responses.
    pub async fn request(&self, request: &Request) -> Result<Response, GatewayError> {
        let Some(address) = Address::parse(&request.path, &self.context_path) else {
            return Ok(Response::not_found());
        };

        // The fanout service calls back anonymously; its encrypted
        // identity parameter is the credential.
        if address == Address::LiveUpdateSetup {
            return Ok(match &self.fanout {
                Some(fanout) => fanout.complete_handshake(request),
                None => Response::forbidden(),
            });
        }

        let Some(claims) = self.authenticate(request) else {
            return Ok(Response::not_authorized());
        };

        debug!(
            method = %request.method,
            path = %request.path,
            subject = claims.subject(),
            "dispatching"
        );

        match request.method.as_str() {
            "DELETE" => self.delete(&claims, &address).await,
            "GET" => self.get(request, &claims, &address).await,
            "PATCH" => self.patch(request, &claims, &address).await,
            "POST" => self.post(request, &claims, &address).await,
            "PUT" => self.put(request, &claims, &address).await,
            _ => Ok(Response::not_implemented()),
        }
    }

    /// Whether a request would yield a body with more than one JSON
    /// object, so clients can decide up front to expect an array. Has
    /// no side effects.
    pub fn returns_multiple(&self, request: &Request) -> bool {
        (request.method == "GET" || request.method == "POST")
            && Address::parse(&request.path, &self.context_path)
                .map(|address| address.instance_id().is_none())
                .unwrap_or(false)
    }

    fn authenticate(&self, request: &Request) -> Option<Claims> {
        let token = match bearer_token(request) {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(err) => {
                warn!(path = %request.path, "credential rejected: {err}");
                return None;
            }
        };

        match self.verifier.verify(&token) {
            Ok(claims) if claims.subject().map(|s| !s.is_empty()).unwrap_or(false) => Some(claims),
            Ok(_) => None,
            Err(err) => {
                warn!(path = %request.path, "token rejected: {err}");
                None
            }
        }
    }

    async fn get(
        &self,
        request: &Request,
        claims: &Claims,
        address: &Address,
    ) -> Result<Response, GatewayError> {
        match address {
            Address::LiveUpdate => match &self.fanout {
                Some(fanout) => fanout.issue_handshake(claims),
                None => Ok(Response::not_implemented()),
            },
            Address::Aggregate { id: Some(id), .. } => self.get_one(claims, address, id).await,
            Address::Aggregate { .. } => self.get_list(claims, address).await,
            Address::LiveUpdateSetup => Ok(Response::not_found()),
        }
    }

    async fn get_one(
        &self,
        claims: &Claims,
        address: &Address,
        id: &str,
    ) -> Result<Response, GatewayError> {
        let Some(store) = &self.store else {
            return Ok(Response::not_implemented());
        };
        let Some(collection) = self.collection(address) else {
            return Ok(Response::not_found());
        };

        let query = query::complete_filter(
            Some(filter::field_eq(fields::ID, json!(id))),
            claims,
            self.breaking_the_glass,
        );
        let Some(doc) = store.find_one(&collection, &query).await? else {
            return Ok(Response::not_found());
        };

        // The record says the read happened, so only confirmed hits
        // are audited.
        self.audit.emit(claims, address, "get").await?;

        Ok(if (self.response_filter)(&doc, claims) {
            Response::ok().with_body_values(vec![doc])
        } else {
            Response::forbidden()
        })
    }

    async fn get_list(&self, claims: &Claims, address: &Address) -> Result<Response, GatewayError> {
        let Some(store) = &self.store else {
            return Ok(Response::not_implemented());
        };
        let Some(collection) = self.collection(address) else {
            return Ok(Response::not_found());
        };

        // Collection reads are audited before the cursor opens; the
        // body streams out after this response returns.
        self.audit.emit(claims, address, "list").await?;

        let query = query::complete_filter(None, claims, self.breaking_the_glass);
        let docs = store.find(&collection, &query).await?;
        Ok(Response::ok().with_body(self.filtered(docs, claims)))
    }

    async fn post(
        &self,
        request: &Request,
        claims: &Claims,
        address: &Address,
    ) -> Result<Response, GatewayError> {
        match (address.instance_id(), address.full_type()) {
            (Some(id), Some(full_type)) => {
                if !command::body_matches_id(request.body.as_ref(), id) {
                    return Ok(Response::bad_request());
                }
                match request.body.as_ref().and_then(Value::as_object) {
                    Some(body) => {
                        self.send_command(command::create_command(body, claims, &full_type))
                            .await
                    }
                    None => Ok(Response::bad_request()),
                }
            }
            (None, Some(_)) => self.search(request, claims, address).await,
            _ => Ok(Response::not_found()),
        }
    }

    async fn put(
        &self,
        request: &Request,
        claims: &Claims,
        address: &Address,
    ) -> Result<Response, GatewayError> {
        match (address.instance_id(), address.full_type()) {
            (Some(id), Some(full_type)) => {
                if !command::body_matches_id(request.body.as_ref(), id) {
                    return Ok(Response::bad_request());
                }
                match request.body.as_ref().and_then(Value::as_object) {
                    Some(body) => {
                        self.send_command(command::replace_command(body, claims, &full_type))
                            .await
                    }
                    None => Ok(Response::bad_request()),
                }
            }
            _ => Ok(Response::not_found()),
        }
    }

    async fn patch(
        &self,
        request: &Request,
        claims: &Claims,
        address: &Address,
    ) -> Result<Response, GatewayError> {
        match (address.instance_id(), address.full_type()) {
            (Some(id), Some(full_type)) => {
                match request.body.as_ref().and_then(Value::as_array) {
                    Some(ops) => {
                        self.send_command(command::patch_command(id, &full_type, claims, ops))
                            .await
                    }
                    None => Ok(Response::bad_request()),
                }
            }
            _ => Ok(Response::not_found()),
        }
    }

    async fn delete(&self, claims: &Claims, address: &Address) -> Result<Response, GatewayError> {
        match (address.instance_id(), address.full_type()) {
            (Some(id), Some(full_type)) => {
                self.send_command(command::delete_command(id, &full_type, claims))
                    .await
            }
            _ => Ok(Response::not_found()),
        }
    }

    async fn search(
        &self,
        request: &Request,
        claims: &Claims,
        address: &Address,
    ) -> Result<Response, GatewayError> {
        let Some(store) = &self.store else {
            return Ok(Response::not_implemented());
        };
        let Some(collection) = self.collection(address) else {
            return Ok(Response::not_found());
        };
        let Some(stages) = request.body.as_ref().and_then(Value::as_array) else {
            return Ok(Response::bad_request());
        };
        let Some(pipeline) =
            query::complete_pipeline(stages, claims, self.breaking_the_glass)
        else {
            return Ok(Response::bad_request());
        };

        // The audit record carries the pipeline as submitted, not the
        // augmented one.
        let submitted = Value::Array(stages.clone()).to_string();
        self.audit.emit(claims, address, &submitted).await?;

        let docs = store.aggregate(&collection, &pipeline).await?;
        Ok(Response::ok().with_body(self.filtered(docs, claims)))
    }

    async fn send_command(&self, command: Value) -> Result<Response, GatewayError> {
        let command = command::complete(command);
        let topic = command::topic(&command, self.environment.as_deref());
        let key = command
            .get(fields::ID)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        debug!(topic = %topic, key = %key, "publishing command");
        self.publisher.publish(&topic, &key, &command).await?;
        Ok(Response::accepted())
    }

    fn collection(&self, address: &Address) -> Option<String> {
        address.full_type().map(|full_type| match &self.environment {
            Some(environment) => format!("{full_type}-{environment}"),
            None => full_type,
        })
    }

    fn filtered(&self, docs: JsonStream, claims: &Claims) -> JsonStream {
        let include = Arc::clone(&self.response_filter);
        let claims = claims.clone();
        docs.filter(move |result| {
            let keep = match result {
                Ok(doc) => include(doc, &claims),
                Err(_) => true,
            };
            future::ready(keep)
        })
        .boxed()
    }
}
