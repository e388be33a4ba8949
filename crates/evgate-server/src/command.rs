//! Command envelope construction. Envelopes carry the verb, the target
//! instance and full type, the caller's claims, a correlation id and a
//! server-assigned timestamp; they are completed immediately before
//! publish so two envelopes never share a timestamp source observation.

use chrono::Utc;
use evgate_types::fields::{self, commands};
use evgate_types::prelude::Claims;
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// A create command is the submitted body itself, stamped with the
/// caller's claims and the addressed type.
pub fn create_command(body: &Map<String, Value>, claims: &Claims, full_type: &str) -> Value {
    let mut command = body.clone();
    command.insert(fields::JWT.to_string(), claims.to_value());
    command.insert(fields::TYPE.to_string(), json!(full_type));
    Value::Object(command)
}

pub fn replace_command(body: &Map<String, Value>, claims: &Claims, full_type: &str) -> Value {
    let mut command = body.clone();
    command.insert(fields::JWT.to_string(), claims.to_value());
    command.insert(fields::TYPE.to_string(), json!(full_type));
    command.insert(fields::COMMAND.to_string(), json!(commands::PUT));
    Value::Object(command)
}

pub fn patch_command(id: &str, full_type: &str, claims: &Claims, ops: &[Value]) -> Value {
    json!({
        (fields::COMMAND): commands::PATCH,
        (fields::JWT): claims.to_value(),
        (fields::ID): id,
        (fields::TYPE): full_type,
        (fields::OPS): ops,
    })
}

pub fn delete_command(id: &str, full_type: &str, claims: &Claims) -> Value {
    json!({
        (fields::COMMAND): commands::DELETE,
        (fields::JWT): claims.to_value(),
        (fields::ID): id,
        (fields::TYPE): full_type,
    })
}

/// Whether a submitted body is a JSON object whose own id matches the
/// addressed instance, case-insensitively. Guards create and replace
/// against writes redirected to a different identity than the URL
/// names.
pub fn body_matches_id(body: Option<&Value>, id: &str) -> bool {
    body.and_then(Value::as_object)
        .and_then(|object| object.get(fields::ID))
        .and_then(Value::as_str)
        .map(|body_id| body_id.eq_ignore_ascii_case(id))
        .unwrap_or(false)
}

/// Completes an envelope at the point of publish: normalizes the id,
/// stamps the server timestamp (overwriting any caller-supplied value)
/// and settles the correlation id, keeping a well-formed caller value
/// so client-side retries stay identifiable.
pub fn complete(command: Value) -> Value {
    let mut command = match command {
        Value::Object(map) => map,
        other => return other,
    };

    if let Some(id) = command
        .get(fields::ID)
        .and_then(Value::as_str)
        .map(str::to_lowercase)
    {
        command.insert(fields::ID.to_string(), json!(id));
    }

    command.insert(
        fields::TIMESTAMP.to_string(),
        json!(Utc::now().timestamp_millis()),
    );

    let corr = command
        .get(fields::CORR)
        .and_then(Value::as_str)
        .and_then(|corr| Uuid::parse_str(corr).ok())
        .unwrap_or_else(Uuid::new_v4);
    command.insert(fields::CORR.to_string(), json!(corr.to_string()));

    Value::Object(command)
}

/// The command topic for an envelope: `<fullType>-command`, with the
/// environment suffix when one is configured.
pub fn topic(command: &Value, environment: Option<&str>) -> String {
    let full_type = command
        .get(fields::TYPE)
        .and_then(Value::as_str)
        .unwrap_or_default();
    match environment {
        Some(environment) => format!("{full_type}-command-{environment}"),
        None => format!("{full_type}-command"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims() -> Claims {
        match json!({"sub": "u1"}) {
            Value::Object(map) => Claims::new(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn patch_command_carries_operations() {
        let ops = vec![json!({"op": "replace", "path": "/status", "value": "shipped"})];
        let command = patch_command("42", "acme-order", &claims(), &ops);
        assert_eq!(command["_command"], "patch");
        assert_eq!(command["_id"], "42");
        assert_eq!(command["_type"], "acme-order");
        assert_eq!(command["_ops"].as_array().map(Vec::len), Some(1));
        assert_eq!(command["_jwt"]["sub"], "u1");
    }

    #[test]
    fn body_id_match_is_case_insensitive() {
        assert!(body_matches_id(Some(&json!({"_id": "ABC"})), "abc"));
        assert!(!body_matches_id(Some(&json!({"_id": "other"})), "abc"));
        assert!(!body_matches_id(Some(&json!(["not", "object"])), "abc"));
        assert!(!body_matches_id(None, "abc"));
    }

    #[test]
    fn complete_stamps_timestamp_corr_and_lowercases_id() {
        let command = complete(json!({"_id": "ABC", "_type": "acme-order"}));
        assert_eq!(command["_id"], "abc");
        assert!(command["_timestamp"].as_i64().expect("timestamp") > 0);
        let corr = command["_corr"].as_str().expect("corr");
        assert!(Uuid::parse_str(corr).is_ok());
    }

    #[test]
    fn complete_keeps_well_formed_corr_and_drops_malformed() {
        let supplied = Uuid::new_v4().to_string();
        let command = complete(json!({"_id": "1", "_corr": supplied}));
        assert_eq!(command["_corr"], json!(supplied));

        let command = complete(json!({"_id": "1", "_corr": "not-a-uuid"}));
        assert_ne!(command["_corr"], json!("not-a-uuid"));
    }

    #[test]
    fn topic_appends_environment() {
        let command = json!({"_type": "acme-order"});
        assert_eq!(topic(&command, None), "acme-order-command");
        assert_eq!(topic(&command, Some("dev")), "acme-order-command-dev");
    }
}
