//! Record Representation
//!
//! A record is a JSON object as delivered by the upstream source. Fields whose name starts with
//! [`INTERNAL_MARKER`] carry cross-collection linkage and must never leave the node.

use serde_json::{Map, Value};

/// Prefix that marks a field as implementation-only.
pub const INTERNAL_MARKER: char = '_';

pub type Record = Map<String, Value>;

pub fn is_internal_field(name: &str) -> bool {
    name.starts_with(INTERNAL_MARKER)
}

/// Returns a copy of `record` without its internal fields.
pub fn strip_internal(record: &Record) -> Record {
    record
        .iter()
        .filter(|(name, _)| !is_internal_field(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Canonical text form of a scalar field, used to compare it against identifiers taken from a
/// request path. Arrays, objects and nulls have no identifier form.
pub fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads a linkage field as a list of identifiers.
///
/// Arrays are flattened element by element; a bare scalar counts as a one-element list.
pub fn linked_identifiers(record: &Record, field: &str) -> Vec<String> {
    match record.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(identifier_text).collect(),
        Some(value) => identifier_text(value).into_iter().collect(),
        None => Vec::new(),
    }
}
