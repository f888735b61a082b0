use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::ProtocolError;

pub const ROOT_ID: &str = "root";

pub const ID: &str = "id";
pub const WEIGHT: &str = "weight";
pub const COMPONENT: &str = "component";
pub const COMPONENT_PROPERTIES: &str = "componentProperties";
pub const CHILD: &str = "child";
pub const CHILDREN: &str = "children";
pub const EXPLICIT_LIST: &str = "explicitList";
pub const TEMPLATE: &str = "template";
pub const COMPONENT_ID: &str = "componentId";
pub const DATA_BINDING: &str = "dataBinding";
pub const PATH: &str = "path";

const LITERAL_KEYS: [&str; 4] = [
    "literalString",
    "literalNumber",
    "literalBoolean",
    "literalArray",
];

/// A raw, author-provided component, independent of the wire generation it
/// arrived in.
///
/// Decoding accepts the nested forms `{"component": {"Text": {..}}}` and
/// `{"componentProperties": {"Text": {..}}}` as well as the flattened form
/// `{"component": "Text", ..}` where properties sit beside the id. Encoding
/// always produces the nested `component` form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Component {
    pub id: String,
    pub weight: Option<f64>,
    pub component_type: String,
    pub properties: Map<String, Value>,
}

impl Component {
    #[must_use]
    pub fn new(id: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weight: None,
            component_type: component_type.into(),
            properties: Map::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

impl TryFrom<Map<String, Value>> for Component {
    type Error = ProtocolError;

    fn try_from(mut raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let Some(Value::String(id)) = raw.remove(ID) else {
            return Err(ProtocolError::MissingComponentId);
        };
        let weight = raw.remove(WEIGHT).as_ref().and_then(Value::as_f64);

        let body = match raw.remove(COMPONENT) {
            Some(body) => Some(body),
            None => raw.remove(COMPONENT_PROPERTIES),
        };

        let (component_type, properties) = match body {
            Some(Value::String(component_type)) => (component_type, raw),
            Some(Value::Object(bag)) => single_entry(&id, bag)?,
            _ => return Err(ProtocolError::MissingComponentType { id }),
        };

        Ok(Self {
            id,
            weight,
            component_type,
            properties,
        })
    }
}

fn single_entry(
    id: &str,
    bag: Map<String, Value>,
) -> Result<(String, Map<String, Value>), ProtocolError> {
    if bag.len() != 1 {
        return Err(match bag.len() {
            0 => ProtocolError::MissingComponentType { id: id.to_string() },
            found => ProtocolError::AmbiguousComponentType {
                id: id.to_string(),
                found,
            },
        });
    }

    let mut entries = bag.into_iter();
    let Some((component_type, props)) = entries.next() else {
        return Err(ProtocolError::MissingComponentType { id: id.to_string() });
    };
    let properties = match props {
        Value::Object(properties) => properties,
        _ => Map::new(),
    };
    Ok((component_type, properties))
}

impl From<Component> for Map<String, Value> {
    fn from(component: Component) -> Self {
        let mut body = Map::new();
        body.insert(
            component.component_type,
            Value::Object(component.properties),
        );

        let mut raw = Map::new();
        raw.insert(ID.to_string(), Value::String(component.id));
        if let Some(weight) = component.weight.and_then(serde_json::Number::from_f64) {
            raw.insert(WEIGHT.to_string(), Value::Number(weight));
        }
        raw.insert(COMPONENT.to_string(), Value::Object(body));
        raw
    }
}

/// How a `children`-style property names its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChildList<'a> {
    /// `{"explicitList": [..]}` or a bare array of ids.
    Explicit(Vec<&'a str>),
    /// `{"template": {"componentId": .., "dataBinding": ..}}`.
    Template {
        component_id: &'a str,
        data_binding: &'a str,
    },
}

impl<'a> ChildList<'a> {
    #[must_use]
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::Explicit(string_items(items))),
            Value::Object(map) => {
                if let Some(Value::Array(items)) = map.get(EXPLICIT_LIST) {
                    return Some(Self::Explicit(string_items(items)));
                }
                let template = map.get(TEMPLATE)?.as_object()?;
                let component_id = template.get(COMPONENT_ID)?.as_str()?;
                let data_binding = template
                    .get(DATA_BINDING)
                    .or_else(|| template.get(PATH))?
                    .as_str()?;
                Some(Self::Template {
                    component_id,
                    data_binding,
                })
            }
            _ => None,
        }
    }

    /// Every component id this list refers to, template item included.
    #[must_use]
    pub fn referenced_ids(&self) -> Vec<&'a str> {
        match self {
            Self::Explicit(ids) => ids.clone(),
            Self::Template { component_id, .. } => vec![*component_id],
        }
    }
}

fn string_items(items: &[Value]) -> Vec<&str> {
    items.iter().filter_map(Value::as_str).collect()
}

/// Classification of a raw property value for data binding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundValue<'a> {
    /// `{"literalString": ..}` and friends.
    Literal(&'a Value),
    /// `{"path": ..}`, optionally carrying a literal used when the path is
    /// unresolved.
    Path {
        path: &'a str,
        fallback: Option<&'a Value>,
    },
    /// Anything else, passed through untouched.
    Plain(&'a Value),
}

impl<'a> BoundValue<'a> {
    #[must_use]
    pub fn classify(value: &'a Value) -> Self {
        let Value::Object(map) = value else {
            return Self::Plain(value);
        };
        let literal = LITERAL_KEYS.iter().find_map(|key| map.get(*key));
        match map.get(PATH) {
            Some(Value::String(path)) => Self::Path {
                path,
                fallback: literal,
            },
            _ => literal.map_or(Self::Plain(value), Self::Literal),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: Value) -> Result<Component, serde_json::Error> {
        serde_json::from_value(value)
    }

    mod decoding {
        use super::*;

        #[test]
        fn nested_component_form() {
            let component = decode(json!({
                "id": "title",
                "weight": 2,
                "component": {"Text": {"text": {"literalString": "Hi"}}}
            }))
            .unwrap();

            assert_eq!(component.id, "title");
            assert_eq!(component.weight, Some(2.0));
            assert_eq!(component.component_type, "Text");
            assert_eq!(
                component.property("text"),
                Some(&json!({"literalString": "Hi"}))
            );
        }

        #[test]
        fn component_properties_form() {
            let component = decode(json!({
                "id": "root",
                "componentProperties": {"Column": {"children": ["a"]}}
            }))
            .unwrap();

            assert_eq!(component.component_type, "Column");
            assert_eq!(component.property("children"), Some(&json!(["a"])));
        }

        #[test]
        fn flattened_form() {
            let component = decode(json!({
                "id": "label",
                "component": "Text",
                "text": "${/user/name}"
            }))
            .unwrap();

            assert_eq!(component.component_type, "Text");
            assert_eq!(component.properties.len(), 1);
        }

        #[test]
        fn missing_type_is_rejected() {
            let err = decode(json!({"id": "c1"})).unwrap_err();
            assert!(err.to_string().contains("'c1' does not declare"));
        }

        #[test]
        fn two_types_are_rejected() {
            let err = decode(json!({
                "id": "c1",
                "component": {"Text": {}, "Image": {}}
            }))
            .unwrap_err();
            assert!(err.to_string().contains("declares 2 component types"));
        }

        #[test]
        fn encodes_to_nested_form() {
            let component = Component::new("c1", "Divider");
            assert_eq!(
                serde_json::to_value(&component).unwrap(),
                json!({"id": "c1", "component": {"Divider": {}}})
            );
        }
    }

    mod child_lists {
        use super::*;

        #[test]
        fn explicit_list_and_bare_array() {
            let wrapped = json!({"explicitList": ["a", "b"]});
            let bare = json!(["a", "b"]);
            assert_eq!(
                ChildList::from_value(&wrapped),
                Some(ChildList::Explicit(vec!["a", "b"]))
            );
            assert_eq!(
                ChildList::from_value(&bare),
                ChildList::from_value(&wrapped)
            );
        }

        #[test]
        fn template_binding() {
            let value = json!({"template": {"componentId": "row", "dataBinding": "/items"}});
            let list = ChildList::from_value(&value).unwrap();
            assert_eq!(
                list,
                ChildList::Template {
                    component_id: "row",
                    data_binding: "/items"
                }
            );
            assert_eq!(list.referenced_ids(), vec!["row"]);
        }

        #[test]
        fn unrecognised_shape() {
            assert_eq!(ChildList::from_value(&json!("row")), None);
            assert_eq!(ChildList::from_value(&json!({"other": 1})), None);
        }
    }

    mod bound_values {
        use super::*;

        #[test]
        fn literals() {
            let value = json!({"literalNumber": 4});
            assert_eq!(BoundValue::classify(&value), BoundValue::Literal(&json!(4)));
        }

        #[test]
        fn path_with_fallback() {
            let value = json!({"path": "/name", "literalString": "anon"});
            assert_eq!(
                BoundValue::classify(&value),
                BoundValue::Path {
                    path: "/name",
                    fallback: Some(&json!("anon"))
                }
            );
        }

        #[test]
        fn plain_values() {
            let value = json!({"name": "submit"});
            assert_eq!(BoundValue::classify(&value), BoundValue::Plain(&value));
            let scalar = json!("h1");
            assert_eq!(BoundValue::classify(&scalar), BoundValue::Plain(&scalar));
        }
    }
}
