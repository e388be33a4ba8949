use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The request carried no usable credentials or the token failed
    /// verification. Always answered as not-authorized, never with
    /// detail.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The verifier itself is misconfigured (bad key material). Fails
    /// closed: no request authenticates until fixed.
    #[error("verifier misconfigured: {0}")]
    KeyInvalid(String),
}

pub fn unauthenticated(msg: &str) -> AuthError {
    AuthError::Unauthenticated(msg.to_string())
}

pub fn key_invalid(msg: &str) -> AuthError {
    AuthError::KeyInvalid(msg.to_string())
}
