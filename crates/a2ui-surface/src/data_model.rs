use a2ui_protocol::pointer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

/// Token that appends to an array instead of indexing into it.
const APPEND: &str = "-";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DataModelError {
    #[error("Invalid data path: '{path}'")]
    InvalidPath { path: String },

    #[error("'{token}' is not a writable index of the array (in '{path}')")]
    InvalidIndex { path: String, token: String },

    #[error("The data model root must be an object")]
    NonObjectRoot,
}

/// The nested key/value store a surface's components bind to.
///
/// The root is always an object. Reads are total: a path that does not
/// resolve yields `None` rather than an error.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataModel(Value);

impl Default for DataModel {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl DataModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, DataModelError> {
        match value {
            Value::Object(_) => Ok(Self(value)),
            _ => Err(DataModelError::NonObjectRoot),
        }
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let tokens = pointer::tokens(path).ok()?;
        tokens
            .iter()
            .try_fold(&self.0, |current, token| descend(current, token))
    }

    /// Store `value` at `path`, creating intermediate objects as needed.
    ///
    /// Scalars met along the way are replaced by objects. The root path
    /// replaces the whole model and only accepts an object.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), DataModelError> {
        let tokens = parse(path)?;

        let Some((last, parents)) = tokens.split_last() else {
            if !value.is_object() {
                return Err(DataModelError::NonObjectRoot);
            }
            self.0 = value;
            return Ok(());
        };

        let mut current = &mut self.0;
        for token in parents {
            current = descend_or_create(current, token, path)?;
        }

        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
            }
            Value::Array(items) => {
                let index = array_index(items, last, path)?;
                extend_to(items, index);
                items[index] = value;
            }
            other => {
                let mut map = Map::new();
                map.insert(last.clone(), value);
                *other = Value::Object(map);
            }
        }
        Ok(())
    }

    /// Remove and return the value at `path`. Removing a missing key is a
    /// no-op; removing the root clears the model.
    pub fn remove(&mut self, path: &str) -> Result<Option<Value>, DataModelError> {
        let tokens = parse(path)?;

        let Some((last, parents)) = tokens.split_last() else {
            let previous = std::mem::replace(&mut self.0, Value::Object(Map::new()));
            return Ok(Some(previous));
        };

        let mut current = &mut self.0;
        for token in parents {
            match descend_mut(current, token) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        Ok(match current {
            Value::Object(map) => map.shift_remove(last),
            Value::Array(items) => last
                .parse::<usize>()
                .ok()
                .filter(|index| *index < items.len())
                .map(|index| items.remove(index)),
            _ => None,
        })
    }
}

fn parse(path: &str) -> Result<Vec<String>, DataModelError> {
    pointer::tokens(path).map_err(|_| DataModelError::InvalidPath {
        path: path.to_string(),
    })
}

fn descend<'a>(value: &'a Value, token: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => token
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    }
}

fn descend_mut<'a>(value: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => token
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index)),
        _ => None,
    }
}

fn descend_or_create<'a>(
    value: &'a mut Value,
    token: &str,
    path: &str,
) -> Result<&'a mut Value, DataModelError> {
    if !value.is_object() && !value.is_array() {
        *value = Value::Object(Map::new());
    }

    let slot = match value {
        Value::Array(items) => {
            let index = array_index(items, token, path)?;
            extend_to(items, index);
            &mut items[index]
        }
        Value::Object(map) => map
            .entry(token.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
        _ => {
            return Err(DataModelError::InvalidPath {
                path: path.to_string(),
            })
        }
    };

    if !slot.is_object() && !slot.is_array() {
        *slot = Value::Object(Map::new());
    }
    Ok(slot)
}

/// Index a write may target: an existing element, or one past the end
/// (also spelled `-`) to append.
fn array_index(items: &[Value], token: &str, path: &str) -> Result<usize, DataModelError> {
    if token == APPEND {
        return Ok(items.len());
    }
    token
        .parse::<usize>()
        .ok()
        .filter(|index| *index <= items.len())
        .ok_or_else(|| DataModelError::InvalidIndex {
            path: path.to_string(),
            token: token.to_string(),
        })
}

fn extend_to(items: &mut Vec<Value>, index: usize) {
    if index == items.len() {
        items.push(Value::Null);
    }
}
