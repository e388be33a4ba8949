//! Boolean filter combinators over document fields, in the query
//! syntax of the document store (`$and`/`$or`/`$not`/`$in`/`$exists`),
//! and an evaluator for running them against plain JSON documents.
//! Filters are built fresh per request and never persisted.

use evgate_types::fields::DELETED;
use serde_json::{json, Map, Value};

pub fn and(filters: Vec<Value>) -> Value {
    json!({ "$and": filters })
}

pub fn or(filters: Vec<Value>) -> Value {
    json!({ "$or": filters })
}

pub fn field_eq(field: &str, value: Value) -> Value {
    json!({ (field): { "$eq": value } })
}

pub fn field_in(field: &str, values: Vec<Value>) -> Value {
    json!({ (field): { "$in": values } })
}

pub fn exists(field: &str, should_exist: bool) -> Value {
    json!({ (field): { "$exists": should_exist } })
}

/// Matches documents that are not soft-deleted: the marker field is
/// absent or explicitly false.
pub fn not_deleted() -> Value {
    or(vec![exists(DELETED, false), field_eq(DELETED, json!(false))])
}

/// Evaluates a filter against a document. Operators outside the
/// supported combinator set simply do not match, which keeps the
/// evaluator total; backends with richer engines interpret the same
/// syntax natively.
pub fn matches(doc: &Value, filter: &Value) -> bool {
    match filter {
        Value::Object(entries) => entries.iter().all(|(key, condition)| match key.as_str() {
            "$and" => as_array(condition)
                .map(|filters| filters.iter().all(|f| matches(doc, f)))
                .unwrap_or(false),
            "$or" => as_array(condition)
                .map(|filters| filters.iter().any(|f| matches(doc, f)))
                .unwrap_or(false),
            "$nor" => as_array(condition)
                .map(|filters| !filters.iter().any(|f| matches(doc, f)))
                .unwrap_or(false),
            field => field_matches(lookup(doc, field), condition),
        }),
        _ => false,
    }
}

fn field_matches(value: Option<&Value>, condition: &Value) -> bool {
    match condition {
        Value::Object(ops) if is_operator_object(ops) => {
            ops.iter().all(|(op, operand)| match op.as_str() {
                "$eq" => value_equals(value, operand),
                "$ne" => !value_equals(value, operand),
                "$exists" => operand.as_bool() == Some(value.is_some()),
                "$in" => as_array(operand)
                    .map(|candidates| candidates.iter().any(|c| value_equals(value, c)))
                    .unwrap_or(false),
                "$not" => !field_matches(value, operand),
                _ => false,
            })
        }
        literal => value_equals(value, literal),
    }
}

/// Equality with array-field semantics: an array field matches when it
/// equals the target or contains it as an element.
fn value_equals(value: Option<&Value>, target: &Value) -> bool {
    match value {
        Some(v) if v == target => true,
        Some(Value::Array(elements)) => elements.iter().any(|e| e == target),
        _ => false,
    }
}

fn is_operator_object(ops: &Map<String, Value>) -> bool {
    !ops.is_empty() && ops.keys().all(|k| k.starts_with('$'))
}

fn as_array(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()
}

/// Resolves a dotted field path inside nested objects.
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}
