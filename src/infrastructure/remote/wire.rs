//! The domain serializes with camelCase keys (the UI wire shape) while the
//! relational backend speaks snake_case columns. The translation lives
//! here, at the adapter edge, so domain types never carry wire concerns.

use serde_json::Value;

/// Recursively renames object keys camelCase → snake_case.
pub fn to_snake_case(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (camel_to_snake(&key), to_snake_case(inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(to_snake_case).collect()),
        other => other,
    }
}

/// Recursively renames object keys snake_case → camelCase.
pub fn to_camel_case(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (snake_to_camel(&key), to_camel_case(inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(to_camel_case).collect()),
        other => other,
    }
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.push(c.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
