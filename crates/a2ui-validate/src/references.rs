//! Per-component-type table of the properties that hold component ids.
//!
//! A [`ReferenceMap`] is built once, either from a catalog JSON Schema
//! ([`ReferenceMap::from_schema`]) or from the built-in standard catalog
//! ([`standard_catalog`]), and then treated as an immutable lookup value by
//! both validators and the tree builder.

use std::collections::hash_map::IntoIter;
use std::collections::hash_map::Iter;
use std::ops::Deref;
use std::sync::LazyLock;

use a2ui_protocol::component::COMPONENT;
use a2ui_protocol::component::COMPONENT_PROPERTIES;
use a2ui_protocol::ChildList;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use serde_json::Map;
use serde_json::Value;

const COMPONENT_ID_DEF: &str = "ComponentId";
const CHILD_LIST_DEF: &str = "ChildList";

/// Reference-bearing properties of one component type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentRefs {
    pub single: FxHashSet<String>,
    pub list: FxHashSet<String>,
}

impl ComponentRefs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property holding one component id.
    #[must_use]
    pub fn single(mut self, field: &str) -> Self {
        self.single.insert(field.to_string());
        self
    }

    /// Add a property holding a list of component ids.
    #[must_use]
    pub fn list(mut self, field: &str) -> Self {
        self.list.insert(field.to_string());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.list.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceMap(FxHashMap<String, ComponentRefs>);

impl ReferenceMap {
    #[must_use]
    pub fn new(refs: FxHashMap<String, ComponentRefs>) -> Self {
        ReferenceMap(refs)
    }

    /// Derive the table from a catalog JSON Schema.
    ///
    /// Walks `properties.components.items.properties.componentProperties.properties`.
    /// A property is a single reference when its `$ref` ends in `ComponentId`,
    /// and a list reference when its `$ref` ends in `ChildList` or it is an
    /// array whose items reference `ComponentId`. A schema of any other shape
    /// yields an empty map, which disables reference checking instead of
    /// rejecting the schema.
    #[must_use]
    pub fn from_schema(schema: &Value) -> Self {
        let mut refs = FxHashMap::default();

        let Some(catalog) = catalog_components(schema) else {
            tracing::debug!("Schema has no component catalog; reference checks disabled");
            return ReferenceMap(refs);
        };

        for (component_type, component_schema) in catalog {
            let Some(props) = component_schema
                .get("properties")
                .and_then(Value::as_object)
            else {
                continue;
            };

            let mut component_refs = ComponentRefs::new();
            for (prop_name, prop_schema) in props {
                if is_component_id_ref(prop_schema) {
                    component_refs.single.insert(prop_name.clone());
                } else if is_child_list_ref(prop_schema) {
                    component_refs.list.insert(prop_name.clone());
                }
            }

            if !component_refs.is_empty() {
                refs.insert(component_type.clone(), component_refs);
            }
        }

        tracing::debug!("Extracted reference fields for {} component types", refs.len());
        ReferenceMap(refs)
    }

    #[must_use]
    pub fn is_single(&self, component_type: &str, field: &str) -> bool {
        self.0
            .get(component_type)
            .is_some_and(|refs| refs.single.contains(field))
    }

    #[must_use]
    pub fn is_list(&self, component_type: &str, field: &str) -> bool {
        self.0
            .get(component_type)
            .is_some_and(|refs| refs.list.contains(field))
    }

    /// Merge another `ReferenceMap` into this one, with the other taking precedence
    pub fn merge(&mut self, other: ReferenceMap) -> &mut Self {
        self.0.extend(other.0);
        self
    }
}

impl Deref for ReferenceMap {
    type Target = FxHashMap<String, ComponentRefs>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a ReferenceMap {
    type Item = (&'a String, &'a ComponentRefs);
    type IntoIter = Iter<'a, String, ComponentRefs>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ReferenceMap {
    type Item = (String, ComponentRefs);
    type IntoIter = IntoIter<String, ComponentRefs>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, ComponentRefs)> for ReferenceMap {
    fn from_iter<T: IntoIterator<Item = (String, ComponentRefs)>>(iter: T) -> Self {
        ReferenceMap(iter.into_iter().collect())
    }
}

fn catalog_components(schema: &Value) -> Option<&Map<String, Value>> {
    let item_props = schema
        .get("properties")?
        .get("components")?
        .get("items")?
        .get("properties")?;

    item_props
        .get(COMPONENT_PROPERTIES)
        .or_else(|| item_props.get(COMPONENT))?
        .get("properties")?
        .as_object()
}

fn ref_ends_with(prop_schema: &Value, suffix: &str) -> bool {
    prop_schema
        .get("$ref")
        .and_then(Value::as_str)
        .is_some_and(|reference| reference.ends_with(suffix))
}

fn is_component_id_ref(prop_schema: &Value) -> bool {
    ref_ends_with(prop_schema, COMPONENT_ID_DEF)
}

fn is_child_list_ref(prop_schema: &Value) -> bool {
    if ref_ends_with(prop_schema, CHILD_LIST_DEF) {
        return true;
    }
    prop_schema.get("type").and_then(Value::as_str) == Some("array")
        && prop_schema.get("items").is_some_and(is_component_id_ref)
}

static STANDARD_CATALOG: LazyLock<ReferenceMap> = LazyLock::new(|| {
    [
        ("Row", ComponentRefs::new().list("children")),
        ("Column", ComponentRefs::new().list("children")),
        ("List", ComponentRefs::new().list("children")),
        ("Card", ComponentRefs::new().single("child")),
        ("Button", ComponentRefs::new().single("child")),
        (
            "Modal",
            ComponentRefs::new()
                .single("entryPointChild")
                .single("contentChild"),
        ),
    ]
    .into_iter()
    .map(|(name, refs)| (name.to_string(), refs))
    .collect()
});

/// Returns the reference table of the built-in standard component catalog
#[must_use]
pub fn standard_catalog() -> ReferenceMap {
    STANDARD_CATALOG.clone()
}

/// One outgoing component reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reference<'a> {
    pub target: &'a str,
    pub field: &'a str,
}

/// Collect the component ids a raw component refers to, in property order.
///
/// Understands the nested `componentProperties`/`component` bag as well as
/// the flattened form where `component` is the type name. List fields may be
/// bare arrays, `explicitList` wrappers or templates; a template refers to
/// its item component.
#[must_use]
pub fn component_references<'a>(
    component: &'a Value,
    references: &ReferenceMap,
) -> Vec<Reference<'a>> {
    let mut found = Vec::new();
    let Some(raw) = component.as_object() else {
        return found;
    };

    let bag = raw
        .get(COMPONENT_PROPERTIES)
        .or_else(|| raw.get(COMPONENT));

    match bag {
        Some(Value::Object(bag)) => {
            for (component_type, props) in bag {
                if let Some(props) = props.as_object() {
                    collect(component_type, props, references, &mut found);
                }
            }
        }
        Some(Value::String(component_type)) => {
            collect(component_type, raw, references, &mut found);
        }
        _ => {}
    }

    found
}

fn collect<'a>(
    component_type: &str,
    props: &'a Map<String, Value>,
    references: &ReferenceMap,
    found: &mut Vec<Reference<'a>>,
) {
    let Some(refs) = references.get(component_type) else {
        return;
    };

    for (field, value) in props {
        if refs.single.contains(field) {
            if let Some(target) = value.as_str() {
                found.push(Reference { target, field });
            }
        } else if refs.list.contains(field) {
            if let Some(list) = ChildList::from_value(value) {
                found.extend(
                    list.referenced_ids()
                        .into_iter()
                        .map(|target| Reference { target, field }),
                );
            }
        }
    }
}
