use std::collections::HashMap;
use std::fmt;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;
use thiserror::Error;

/// An error surfaced while lazily producing a response body, typically
/// a read-side cursor failing mid-stream.
#[derive(Debug, Error)]
#[error("response body failed: {0}")]
pub struct BodyError(pub String);

/// A lazily produced sequence of JSON values forming a response body.
pub type JsonStream = BoxStream<'static, Result<Value, BodyError>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    Accepted,
    Redirect,
    BadRequest,
    NotAuthorized,
    Forbidden,
    NotFound,
    NotImplemented,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Accepted => 202,
            Status::Redirect => 303,
            Status::BadRequest => 400,
            Status::NotAuthorized => 401,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::NotImplemented => 501,
        }
    }
}

/// The outbound response handed back to the embedding HTTP server. The
/// body, when present, is only consumed as the server streams it out.
pub struct Response {
    pub status: Status,
    pub headers: HashMap<String, Vec<String>>,
    pub body: Option<JsonStream>,
}

impl Response {
    fn with_status(status: Status) -> Self {
        Response {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn ok() -> Self {
        Response::with_status(Status::Ok)
    }

    pub fn accepted() -> Self {
        Response::with_status(Status::Accepted)
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Response::with_status(Status::Redirect).with_header("Location", location)
    }

    pub fn bad_request() -> Self {
        Response::with_status(Status::BadRequest)
    }

    pub fn not_authorized() -> Self {
        Response::with_status(Status::NotAuthorized)
    }

    pub fn forbidden() -> Self {
        Response::with_status(Status::Forbidden)
    }

    pub fn not_found() -> Self {
        Response::with_status(Status::NotFound)
    }

    pub fn not_implemented() -> Self {
        Response::with_status(Status::NotImplemented)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: JsonStream) -> Self {
        self.body = Some(body);
        self
    }

    /// Convenience for bodies that are already materialized.
    pub fn with_body_values(self, values: Vec<Value>) -> Self {
        self.with_body(stream::iter(values.into_iter().map(Ok)).boxed())
    }

    /// Drains the body into memory. Mostly useful for clients and
    /// tests; servers should stream instead.
    pub async fn into_body_values(self) -> Result<Vec<Value>, BodyError> {
        match self.body {
            Some(body) => body.try_collect().await,
            None => Ok(Vec::new()),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}
