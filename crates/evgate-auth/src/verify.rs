use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use evgate_types::prelude::Claims;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::errors::{key_invalid, unauthenticated, AuthError};

/// Verifies token signatures against the key configured at
/// construction time and hands back the embedded claims. Anything that
/// does not verify is unauthenticated; no claims leak out of a failed
/// verification.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// An RS256 verifier from a base64-encoded DER (SubjectPublicKeyInfo)
    /// public key, the form token issuers typically publish.
    pub fn rsa_from_base64_der(key: &str) -> Result<Self, AuthError> {
        let der = STANDARD
            .decode(key.trim())
            .map_err(|err| key_invalid(&format!("public key is not valid base64: {err}")))?;
        Ok(TokenVerifier {
            key: DecodingKey::from_rsa_der(&der),
            validation: validation(Algorithm::RS256),
        })
    }

    /// An HS256 verifier from a shared secret. Meant for development
    /// setups and tests; production deployments use the RSA form.
    pub fn hmac_from_secret(secret: &[u8]) -> Self {
        TokenVerifier {
            key: DecodingKey::from_secret(secret),
            validation: validation(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Value>(token, &self.key, &self.validation)
            .map_err(|err| unauthenticated(&format!("token verification failed: {err}")))?;

        match data.claims {
            Value::Object(map) => Ok(Claims::new(map)),
            _ => Err(unauthenticated("token claims must be an object")),
        }
    }
}

fn validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.set_required_spec_claims::<&str>(&[]);
    validation.validate_aud = false;
    validation
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"verifier-test-secret";

    fn token(claims: Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("encode jwt")
    }

    #[test]
    fn verifies_and_exposes_claims() {
        let verifier = TokenVerifier::hmac_from_secret(SECRET);
        let exp = chrono::Utc::now().timestamp() + 600;
        let claims = verifier
            .verify(&token(json!({"sub": "u1", "roles": ["ops"], "exp": exp})))
            .expect("claims");
        assert_eq!(claims.subject(), Some("u1"));
        assert_eq!(claims.roles(), vec!["ops".to_string()]);
    }

    #[test]
    fn rejects_wrong_signature() {
        let verifier = TokenVerifier::hmac_from_secret(b"other-secret");
        let exp = chrono::Utc::now().timestamp() + 600;
        assert!(verifier
            .verify(&token(json!({"sub": "u1", "exp": exp})))
            .is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = TokenVerifier::hmac_from_secret(SECRET);
        let exp = chrono::Utc::now().timestamp() - 600;
        assert!(verifier
            .verify(&token(json!({"sub": "u1", "exp": exp})))
            .is_err());
    }

    #[test]
    fn rejects_garbage_key_material() {
        assert!(TokenVerifier::rsa_from_base64_der("not base64 !!").is_err());
    }

    #[test]
    fn rejects_garbage_tokens() {
        let verifier = TokenVerifier::hmac_from_secret(SECRET);
        assert!(verifier.verify("not.a.jwt").is_err());
    }
}
