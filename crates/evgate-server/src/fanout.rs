//! The live-update handshake with the external push-fanout service.
//!
//! Step one redirects an authenticated `/sse` request to the fanout
//! service with the caller's encrypted subject as the `u` parameter.
//! The fanout service then calls back on `/sse-setup`, anonymously,
//! with that same parameter as its only proof; step two decrypts it
//! and answers with the headers that hold the event stream open.
//!
//! The encryption key is derived from a per-instance random salt plus
//! the configured passphrase, so the same subject encrypts differently
//! per server run and only the issuing instance can complete the
//! handshake it started.

use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use evgate_types::address::SSE_SETUP;
use evgate_types::prelude::{Claims, Request, Response};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::FanoutConfig;
use crate::errors::{self, GatewayError};

const NONCE_SIZE: usize = 12;
const USERNAME_PARAMETER: &str = "u";

pub struct FanoutBridge {
    setup_uri: String,
    cipher: Aes256Gcm,
    timeout_secs: u64,
}

impl FanoutBridge {
    pub fn new(config: &FanoutConfig, context_path: &[String]) -> Result<Self, GatewayError> {
        if config.uri.is_empty() {
            return Err(errors::config("fanout.uri must not be empty"));
        }
        if config.secret.is_empty() {
            return Err(errors::config("fanout.secret must not be empty"));
        }

        let salt = Uuid::new_v4().to_string();
        let key: Key<Aes256Gcm> = Sha256::digest(format!("{salt}{}", config.secret));

        let context = if context_path.is_empty() {
            String::new()
        } else {
            format!("/{}", context_path.join("/"))
        };

        Ok(FanoutBridge {
            setup_uri: format!("{}{context}/{SSE_SETUP}", config.uri),
            cipher: Aes256Gcm::new(&key),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Step one: a redirect to the fanout service carrying the
    /// caller's encrypted subject.
    pub fn issue_handshake(&self, claims: &Claims) -> Result<Response, GatewayError> {
        let subject = claims.subject().unwrap_or_default();
        let token = self.encode_username(subject)?;
        debug!(subject, "issuing live-update redirect");
        Ok(Response::redirect(format!(
            "{}?{USERNAME_PARAMETER}={token}",
            self.setup_uri
        )))
    }

    /// Step two: the fanout service's callback. Decrypts the identity
    /// parameter and answers with streaming-keepalive headers, or
    /// forbidden when the parameter is absent or not decryptable.
    pub fn complete_handshake(&self, request: &Request) -> Response {
        let username = match request.query_values(USERNAME_PARAMETER) {
            Some([value]) => self.decode_username(value),
            _ => None,
        };

        match username {
            Some(username) => {
                debug!(username = %username, "live-update channel established");
                self.stream_headers(&username)
            }
            None => {
                warn!("live-update setup with missing or undecryptable identity");
                Response::forbidden()
            }
        }
    }

    fn stream_headers(&self, username: &str) -> Response {
        Response::ok()
            .with_header("Content-Type", "text/event-stream")
            .with_header("Cache-Control", "no-cache")
            .with_header("Grip-Hold", "stream")
            .with_header("Grip-Channel", username)
            .with_header(
                "Grip-Keep-Alive",
                format!(":\\n\\n; format=cstring; timeout={}", self.timeout_secs),
            )
    }

    fn encode_username(&self, username: &str) -> Result<String, GatewayError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, username.as_bytes())
            .map_err(|_| errors::crypto("failed to encrypt identity token"))?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    fn decode_username(&self, parameter: &str) -> Option<String> {
        // Query-string transport turns '+' into a space; undo it
        // before the base64 decode.
        let sealed = STANDARD.decode(parameter.replace(' ', "+")).ok()?;
        if sealed.len() < NONCE_SIZE {
            return None;
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .ok()?;
        String::from_utf8(plaintext).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evgate_types::prelude::Status;
    use serde_json::json;

    fn bridge() -> FanoutBridge {
        FanoutBridge::new(
            &FanoutConfig {
                uri: "https://fanout.example".into(),
                secret: "passphrase".into(),
                timeout_secs: 20,
            },
            &[],
        )
        .expect("bridge")
    }

    fn claims(subject: &str) -> Claims {
        match json!({ "sub": subject }) {
            serde_json::Value::Object(map) => Claims::new(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn handshake_round_trip_recovers_subject() {
        let bridge = bridge();
        let response = bridge.issue_handshake(&claims("u1")).expect("redirect");
        let location = response.headers.get("Location").expect("location")[0].clone();
        let (_, token) = location.split_once("?u=").expect("parameter");

        // Simulate the '+' to space substitution of query transport.
        let request =
            Request::new("GET", "/sse-setup").with_query("u", token.replace('+', " "));
        let response = bridge.complete_handshake(&request);
        assert_eq!(response.status, Status::Ok);
        assert_eq!(
            response.headers.get("Grip-Channel").map(Vec::as_slice),
            Some(&["u1".to_string()][..])
        );
    }

    #[test]
    fn same_subject_encrypts_differently_per_instance() {
        let location = |bridge: &FanoutBridge| {
            let response = bridge.issue_handshake(&claims("u1")).expect("redirect");
            response.headers.get("Location").expect("location")[0].clone()
        };
        assert_ne!(location(&bridge()), location(&bridge()));
    }

    #[test]
    fn setup_rejects_garbage_and_absent_parameters() {
        let bridge = bridge();
        let request = Request::new("GET", "/sse-setup").with_query("u", "garbage");
        assert_eq!(bridge.complete_handshake(&request).status, Status::Forbidden);

        let request = Request::new("GET", "/sse-setup");
        assert_eq!(bridge.complete_handshake(&request).status, Status::Forbidden);
    }

    #[test]
    fn context_path_lands_in_setup_uri() {
        let bridge = FanoutBridge::new(
            &FanoutConfig {
                uri: "https://fanout.example".into(),
                secret: "passphrase".into(),
                timeout_secs: 20,
            },
            &["api".into(), "v1".into()],
        )
        .expect("bridge");
        let response = bridge.issue_handshake(&claims("u1")).expect("redirect");
        let location = &response.headers.get("Location").expect("location")[0];
        assert!(location.starts_with("https://fanout.example/api/v1/sse-setup?u="));
    }

    #[test]
    fn rejects_empty_configuration() {
        let config = FanoutConfig {
            uri: String::new(),
            secret: "s".into(),
            timeout_secs: 20,
        };
        assert!(FanoutBridge::new(&config, &[]).is_err());
    }
}
