use std::fmt;
use std::sync::OnceLock;

use serde_json::json;
use serde_json::Value;

/// A surface described as the message stream an agent would send for it.
#[derive(Clone)]
pub struct PayloadFixture {
    pub label: String,
    pub components: Value,
    pub data: Value,
}

impl fmt::Display for PayloadFixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl PayloadFixture {
    /// The `surfaceUpdate` message carrying this fixture's components.
    #[must_use]
    pub fn surface_update(&self) -> Value {
        json!({"surfaceUpdate": {"surfaceId": "bench", "components": self.components}})
    }

    /// The full stream: components, root and data.
    #[must_use]
    pub fn messages(&self) -> Vec<Value> {
        vec![
            self.surface_update(),
            json!({"beginRendering": {"surfaceId": "bench", "root": "root"}}),
            json!({"updateDataModel": {"surfaceId": "bench", "path": "/", "value": self.data}}),
        ]
    }
}

pub fn payload_fixtures() -> &'static [PayloadFixture] {
    static FIXTURES: OnceLock<Vec<PayloadFixture>> = OnceLock::new();
    FIXTURES.get_or_init(load_payload_fixtures).as_slice()
}

fn load_payload_fixtures() -> Vec<PayloadFixture> {
    vec![
        wide(10),
        wide(500),
        deep(40),
        templated(20),
        templated(1000),
    ]
}

/// A column of `n` bound text fields.
fn wide(n: usize) -> PayloadFixture {
    let ids: Vec<String> = (0..n).map(|i| format!("field{i}")).collect();
    let mut components = vec![json!({
        "id": "root",
        "component": {"Column": {"children": {"explicitList": ids}}}
    })];
    components.extend(ids.iter().map(|id| {
        json!({"id": id, "component": {"Text": {"text": {"path": format!("/fields/{id}")}}}})
    }));

    let fields: serde_json::Map<String, Value> = ids
        .iter()
        .map(|id| (id.clone(), Value::String(format!("value of {id}"))))
        .collect();

    PayloadFixture {
        label: format!("wide_{n}"),
        components: Value::Array(components),
        data: json!({"fields": fields}),
    }
}

/// Cards nested `n` deep, each wrapping the next.
fn deep(n: usize) -> PayloadFixture {
    let mut components: Vec<Value> = (0..n)
        .map(|i| {
            let id = if i == 0 { "root".to_string() } else { format!("card{i}") };
            json!({"id": id, "component": {"Card": {"child": format!("card{}", i + 1)}}})
        })
        .collect();
    components.push(json!({
        "id": format!("card{n}"),
        "component": {"Text": {"text": {"literalString": "bottom"}}}
    }));

    PayloadFixture {
        label: format!("deep_{n}"),
        components: Value::Array(components),
        data: json!({}),
    }
}

/// A list template expanded over `n` data items.
fn templated(n: usize) -> PayloadFixture {
    let items: Vec<Value> = (0..n)
        .map(|i| json!({"name": format!("item {i}"), "done": i % 2 == 0}))
        .collect();

    PayloadFixture {
        label: format!("templated_{n}"),
        components: json!([
            {"id": "root", "component": {"List": {"children": {"template": {"componentId": "row", "dataBinding": "/items"}}}}},
            {"id": "row", "component": {"Row": {"children": ["name", "done"]}}},
            {"id": "name", "component": {"Text": {"text": {"path": "name"}}}},
            {"id": "done", "component": {"CheckBox": {"value": {"path": "done"}}}}
        ]),
        data: json!({"items": items}),
    }
}
