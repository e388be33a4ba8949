use std::collections::HashMap;

use serde_json::Value;

/// An inbound request, already decoded by the embedding HTTP server.
/// Header names are case-insensitive and both headers and query-string
/// parameters may repeat, so values are kept as ordered lists.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method: String,
    pub path: String,
    headers: HashMap<String, Vec<String>>,
    pub query: HashMap<String, Vec<String>>,
    pub cookies: HashMap<String, String>,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Request {
            method: method.into(),
            path: path.into(),
            ..Request::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// All values for a header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
    }

    pub fn query_values(&self, name: &str) -> Option<&[String]> {
        self.query.get(name).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = Request::new("GET", "/acme/order")
            .with_header("Authorization", "Bearer abc")
            .with_header("AUTHORIZATION", "Bearer def");
        let values = request.header("authorization").expect("values");
        assert_eq!(values, ["Bearer abc", "Bearer def"]);
    }

    #[test]
    fn query_values_keep_repeats_in_order() {
        let request = Request::new("GET", "/sse-setup")
            .with_query("u", "one")
            .with_query("u", "two");
        assert_eq!(request.query_values("u").expect("values"), ["one", "two"]);
    }
}
