//! ACL-aware query augmentation. Every read-side filter excludes
//! soft-deleted records; unless the caller is the system identity or
//! has invoked the audited override, it also restricts results to
//! records whose access-control list grants one of the caller's roles.
//! Authorization gaps are never surfaced as errors: unauthorized
//! documents are simply absent from results.

use evgate_store::filter;
use evgate_types::fields::{ACL, ACL_GET};
use evgate_types::prelude::Claims;
use serde_json::{json, Value};

const MATCH: &str = "$match";

/// The caller's effective read roles: the granted roles plus the
/// subject itself, which acts as an implicit self-role.
pub fn read_roles(claims: &Claims) -> Vec<Value> {
    let mut roles: Vec<Value> = claims.roles().into_iter().map(Value::String).collect();
    if let Some(subject) = claims.subject() {
        let subject = Value::String(subject.to_string());
        if !roles.contains(&subject) {
            roles.push(subject);
        }
    }
    roles
}

/// Grants access when no ACL is present or the caller's role set
/// intersects the granted-read roles.
fn acl_filter(claims: &Claims) -> Value {
    let acl_get = format!("{ACL}.{ACL_GET}");
    filter::or(vec![
        filter::exists(ACL, false),
        filter::field_in(&acl_get, read_roles(claims)),
    ])
}

fn bypasses_acl(claims: &Claims, breaking_the_glass: bool) -> bool {
    claims.is_system() || (breaking_the_glass && claims.breaking_the_glass())
}

/// Builds the effective read filter for a caller, optionally wrapping
/// a base filter.
pub fn complete_filter(
    original: Option<Value>,
    claims: &Claims,
    breaking_the_glass: bool,
) -> Value {
    let mut clauses = vec![filter::not_deleted()];
    if !bypasses_acl(claims, breaking_the_glass) {
        clauses.push(acl_filter(claims));
    }
    if let Some(original) = original {
        clauses.push(original);
    }
    filter::and(clauses)
}

/// Applies the caller's read filter to every `$match` stage of an
/// aggregation pipeline, leaving other stage kinds untouched. Returns
/// `None` when the pipeline is malformed (a stage that is not an
/// object), which callers answer as a bad request.
pub fn complete_pipeline(
    stages: &[Value],
    claims: &Claims,
    breaking_the_glass: bool,
) -> Option<Vec<Value>> {
    stages
        .iter()
        .map(|stage| {
            let object = stage.as_object()?;
            match object.get(MATCH) {
                Some(condition) => Some(json!({
                    MATCH: complete_filter(Some(condition.clone()), claims, breaking_the_glass)
                })),
                None => Some(stage.clone()),
            }
        })
        .collect()
}
