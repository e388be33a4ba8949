use evgate_types::prelude::Request;
use percent_encoding::percent_decode_str;

use crate::errors::{unauthenticated, AuthError};

const ACCESS_TOKEN: &str = "access_token";

/// Finds the bearer token of a request, trying the `Authorization`
/// header, the `access_token` query parameter and the `access_token`
/// cookie, in that order. A present but malformed or repeated
/// `Authorization` header is an error rather than a reason to try the
/// next source, so a broken credential never silently degrades into an
/// anonymous or differently-authenticated request.
pub fn bearer_token(request: &Request) -> Result<Option<String>, AuthError> {
    match request.header("authorization") {
        Some([value]) => return from_authorization(value).map(Some),
        Some(_) => return Err(unauthenticated("repeated authorization header")),
        None => {}
    }

    let token = match request.query_values(ACCESS_TOKEN) {
        Some([value]) => Some(value.as_str()),
        _ => request.cookies.get(ACCESS_TOKEN).map(String::as_str),
    };

    token.map(decode_token).transpose()
}

fn from_authorization(value: &str) -> Result<String, AuthError> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            decode_token(token)
        }
        _ => Err(unauthenticated("malformed authorization header")),
    }
}

fn decode_token(token: &str) -> Result<String, AuthError> {
    percent_decode_str(token)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| unauthenticated("token is not valid percent-encoded utf-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_authorization_header() {
        let request = Request::new("GET", "/acme/order")
            .with_header("Authorization", "Bearer from-header")
            .with_query("access_token", "from-query")
            .with_cookie("access_token", "from-cookie");
        assert_eq!(
            bearer_token(&request).expect("token"),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn rejects_malformed_authorization() {
        let request =
            Request::new("GET", "/acme/order").with_header("Authorization", "Basic dXNlcg==");
        assert!(bearer_token(&request).is_err());

        let request = Request::new("GET", "/acme/order").with_header("Authorization", "Bearer");
        assert!(bearer_token(&request).is_err());
    }

    #[test]
    fn rejects_repeated_authorization() {
        let request = Request::new("GET", "/acme/order")
            .with_header("Authorization", "Bearer one")
            .with_header("Authorization", "Bearer two")
            .with_cookie("access_token", "fallback");
        assert!(bearer_token(&request).is_err());
    }

    #[test]
    fn falls_back_to_query_then_cookie() {
        let request = Request::new("GET", "/acme/order").with_query("access_token", "from-query");
        assert_eq!(
            bearer_token(&request).expect("token"),
            Some("from-query".to_string())
        );

        let request = Request::new("GET", "/acme/order")
            .with_query("access_token", "one")
            .with_query("access_token", "two")
            .with_cookie("access_token", "from-cookie");
        assert_eq!(
            bearer_token(&request).expect("token"),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn decodes_percent_encoding() {
        let request =
            Request::new("GET", "/acme/order").with_query("access_token", "a%2Bb%3Dc");
        assert_eq!(
            bearer_token(&request).expect("token"),
            Some("a+b=c".to_string())
        );
    }

    #[test]
    fn absent_everywhere_is_none() {
        let request = Request::new("GET", "/acme/order");
        assert_eq!(bearer_token(&request).expect("token"), None);
    }
}
