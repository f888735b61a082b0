//! Decoding of the older generation's key/value data-model contents.
//!
//! `dataModelUpdate.contents` is either a plain JSON value or an adjacency
//! list of entries such as `{"key": "name", "valueString": "Ada"}`. Entries
//! are folded into a nested map; `valueMap` entries recurse, and string
//! values that look like serialized JSON containers are parsed.

use serde_json::Map;
use serde_json::Value;

use crate::pointer;

const KEY: &str = "key";
const VALUE_PREFIX: &str = "value";
const VALUE_MAP: &str = "valueMap";
const SELF_KEY: &str = ".";

/// Convert `contents` into the value to store at the update's path.
#[must_use]
pub fn decode_contents(contents: Value) -> Value {
    let Value::Array(entries) = contents else {
        return contents;
    };

    if !entries.is_empty() && !is_entry(&entries[0]) {
        return Value::Array(entries);
    }

    if let [Value::Object(entry)] = entries.as_slice() {
        if entry.get(KEY).and_then(Value::as_str) == Some(SELF_KEY) {
            if let Some(value) = entry_value(entry) {
                return value;
            }
        }
    }

    Value::Object(entries_to_map(&entries))
}

fn is_entry(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.contains_key(KEY))
}

fn entries_to_map(entries: &[Value]) -> Map<String, Value> {
    let mut map = Map::new();
    for entry in entries {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let Some(key) = entry.get(KEY).and_then(Value::as_str) else {
            continue;
        };
        let Some(value) = entry_value(entry) else {
            continue;
        };
        let tokens = pointer::tokens(key).unwrap_or_else(|_| vec![key.to_string()]);
        insert_nested(&mut map, &tokens, value);
    }
    map
}

fn entry_value(entry: &Map<String, Value>) -> Option<Value> {
    let (value_key, value) = entry
        .iter()
        .find(|(name, _)| name.starts_with(VALUE_PREFIX))?;

    Some(match value {
        Value::Array(nested) if value_key == VALUE_MAP => Value::Object(entries_to_map(nested)),
        Value::String(text) => parse_if_json(text),
        other => other.clone(),
    })
}

fn parse_if_json(text: &str) -> Value {
    let trimmed = text.trim();
    let looks_like_json = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    if !looks_like_json {
        return Value::String(text.to_string());
    }

    serde_json::from_str(trimmed).unwrap_or_else(|err| {
        tracing::warn!("Failed to parse potential JSON string value: {err}");
        Value::String(text.to_string())
    })
}

fn insert_nested(map: &mut Map<String, Value>, tokens: &[String], value: Value) {
    let Some((last, parents)) = tokens.split_last() else {
        return;
    };

    let mut current = map;
    for token in parents {
        let slot = current
            .entry(token.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
    current.insert(last.clone(), value);
}
