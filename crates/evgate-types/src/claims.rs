use serde_json::{Map, Value};

use crate::fields::{JWT_BREAKING_THE_GLASS, JWT_ROLES, JWT_SUB};

/// The subject that the privileged-override and ACL checks never apply
/// to.
pub const SYSTEM_SUBJECT: &str = "system";

/// The verified claims of a caller. The claim set is kept as the raw
/// JSON object so unknown claims travel through command envelopes
/// untouched; the accessors below read the fields the gateway acts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Claims(claims)
    }

    /// The subject identifier. Requests without one are rejected before
    /// dispatch.
    pub fn subject(&self) -> Option<&str> {
        self.0.get(JWT_SUB).and_then(Value::as_str)
    }

    /// The role strings granted to the caller. Non-string entries are
    /// ignored.
    pub fn roles(&self) -> Vec<String> {
        self.0
            .get(JWT_ROLES)
            .and_then(Value::as_array)
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the caller invoked the audited ACL override.
    pub fn breaking_the_glass(&self) -> bool {
        self.0
            .get(JWT_BREAKING_THE_GLASS)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_system(&self) -> bool {
        self.subject() == Some(SYSTEM_SUBJECT)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(claims: Map<String, Value>) -> Self {
        Claims::new(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Claims {
        match value {
            Value::Object(map) => Claims::new(map),
            _ => panic!("claims must be an object"),
        }
    }

    #[test]
    fn reads_subject_and_roles() {
        let claims = claims(json!({"sub": "u1", "roles": ["ops", 7, "dev"]}));
        assert_eq!(claims.subject(), Some("u1"));
        assert_eq!(claims.roles(), vec!["ops".to_string(), "dev".to_string()]);
        assert!(!claims.breaking_the_glass());
    }

    #[test]
    fn missing_fields_default() {
        let claims = claims(json!({}));
        assert_eq!(claims.subject(), None);
        assert!(claims.roles().is_empty());
        assert!(!claims.is_system());
    }

    #[test]
    fn recognises_system_subject() {
        assert!(claims(json!({"sub": "system"})).is_system());
    }
}
