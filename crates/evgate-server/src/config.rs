use std::env;
use std::path::Path;

use evgate_auth::prelude::TokenVerifier;
use serde::{Deserialize, Serialize};

use crate::errors::{self, GatewayError};

/// Immutable gateway configuration, assembled once before the gateway
/// starts handling requests and validated by [`crate::server::Gateway::new`].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// URL context prefix, e.g. `/api/v1`. Absent means requests are
    /// addressed from the root.
    #[serde(default)]
    pub context_path: Option<String>,

    /// Suffix for command topics and read-side collections, so several
    /// environments can share one broker cluster and store.
    #[serde(default)]
    pub environment: Option<String>,

    /// Topic for read-side audit records. Absent disables auditing.
    #[serde(default)]
    pub audit_topic: Option<String>,

    /// Honour the `breakingTheGlass` claim as an audited ACL override.
    #[serde(default)]
    pub breaking_the_glass: bool,

    /// Base64-encoded DER public key for token verification.
    #[serde(default)]
    pub jwt_public_key: Option<String>,

    #[serde(default)]
    pub fanout: Option<FanoutConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FanoutConfig {
    /// Base URI of the fanout service the live-update redirect points
    /// at.
    pub uri: String,

    /// Passphrase half of the identity-token encryption secret; the
    /// other half is a per-instance random salt.
    pub secret: String,

    #[serde(default = "FanoutConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FanoutConfig {
    fn default_timeout_secs() -> u64 {
        20
    }
}

impl GatewayConfig {
    /// Loads configuration from the file named by `EVGATE_CONFIG_FILE`
    /// (default `config/evgate.toml`) overlaid with `EVGATE__`-prefixed
    /// environment variables.
    pub fn load() -> Result<Self, GatewayError> {
        let config_file =
            env::var("EVGATE_CONFIG_FILE").unwrap_or_else(|_| "config/evgate.toml".to_string());

        let mut builder = config::Config::builder();
        if Path::new(&config_file).exists() {
            builder = builder.add_source(config::File::from(Path::new(&config_file)));
        }
        builder = builder.add_source(config::Environment::with_prefix("EVGATE").separator("__"));

        builder
            .build()
            .map_err(|err| errors::config(&format!("failed to build configuration: {err}")))?
            .try_deserialize()
            .map_err(|err| errors::config(&format!("failed to deserialize configuration: {err}")))
    }

    /// A token verifier for the configured public key.
    pub fn verifier(&self) -> Result<TokenVerifier, GatewayError> {
        let key = self
            .jwt_public_key
            .as_deref()
            .ok_or_else(|| errors::config("jwt_public_key must be set"))?;
        TokenVerifier::rsa_from_base64_der(key)
            .map_err(|err| errors::config(&format!("jwt_public_key rejected: {err}")))
    }

    /// The context path as segments, the form the address parser needs.
    pub fn context_segments(&self) -> Vec<String> {
        self.context_path
            .as_deref()
            .map(|path| {
                path.split('/')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_segments_drop_empty_parts() {
        let config = GatewayConfig {
            context_path: Some("/api//v1/".to_string()),
            ..GatewayConfig::default()
        };
        assert_eq!(config.context_segments(), ["api", "v1"]);
        assert!(GatewayConfig::default().context_segments().is_empty());
    }

    #[test]
    fn verifier_requires_key() {
        assert!(GatewayConfig::default().verifier().is_err());
    }
}
