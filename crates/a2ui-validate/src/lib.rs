//! Structural validation of agent-authored A2UI payloads.
//!
//! A payload is one message or an array of messages. [`Validator::validate`]
//! reports the first violation it finds, checking in this order:
//!
//! 1. JSON Schema conformance of the whole payload (when a schema is known)
//! 2. per message, component integrity ([`check_integrity`])
//! 3. per message, reference topology ([`check_topology`])
//! 4. per message, nesting depth and path syntax ([`RecursionGuard`])

mod errors;
mod integrity;
mod recursion;
mod references;
mod schema;
mod topology;

pub use errors::ValidationCategory;
pub use errors::ValidationError;
pub use integrity::check_integrity;
pub use recursion::check_recursion;
pub use recursion::RecursionGuard;
pub use recursion::RecursionLimits;
pub use recursion::MAX_FUNCTION_CALL_DEPTH;
pub use recursion::MAX_GLOBAL_DEPTH;
pub use references::component_references;
pub use references::standard_catalog;
pub use references::ComponentRefs;
pub use references::Reference;
pub use references::ReferenceMap;
pub use schema::SchemaCheck;
pub use topology::check_topology;
use serde_json::Value;

const COMPONENTS: &str = "components";

#[derive(Clone, Debug)]
pub struct Validator {
    schema: Option<SchemaCheck>,
    references: ReferenceMap,
    guard: RecursionGuard,
}

impl Validator {
    /// Compile `schema` and derive its reference table.
    pub fn new(schema: &Value) -> Result<Self, ValidationError> {
        Ok(Self {
            schema: Some(SchemaCheck::compile(schema)?),
            references: ReferenceMap::from_schema(schema),
            guard: RecursionGuard::default(),
        })
    }

    /// A validator that skips schema conformance and checks structure only.
    #[must_use]
    pub fn structural(references: ReferenceMap) -> Self {
        Self {
            schema: None,
            references,
            guard: RecursionGuard::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: RecursionLimits) -> Self {
        self.guard = RecursionGuard::new(limits);
        self
    }

    #[must_use]
    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    #[must_use]
    pub fn limits(&self) -> RecursionLimits {
        self.guard.limits()
    }

    pub fn validate(&self, payload: &Value) -> Result<(), ValidationError> {
        if let Some(schema) = &self.schema {
            schema.check(payload)?;
        }

        let messages = match payload {
            Value::Array(messages) => messages.as_slice(),
            single => std::slice::from_ref(single),
        };

        for message in messages.iter().filter(|message| message.is_object()) {
            self.validate_message(message)?;
        }

        Ok(())
    }

    fn validate_message(&self, message: &Value) -> Result<(), ValidationError> {
        if let Some(components) = message_components(message) {
            check_integrity(components, &self.references)?;
            check_topology(components, &self.references)?;
        }
        self.guard.check(message)
    }
}

/// Validate `payload` against `schema` with the default limits.
pub fn validate(payload: &Value, schema: &Value) -> Result<(), ValidationError> {
    Validator::new(schema)?.validate(payload)
}

/// The component list of a message, either at the top level or inside a
/// single-key envelope such as `{"surfaceUpdate": {"components": [..]}}`.
fn message_components(message: &Value) -> Option<&[Value]> {
    let map = message.as_object()?;
    if let Some(Value::Array(components)) = map.get(COMPONENTS) {
        return Some(components);
    }
    if map.len() != 1 {
        return None;
    }
    map.values()
        .next()?
        .get(COMPONENTS)?
        .as_array()
        .map(Vec::as_slice)
}

#[cfg(test)]
mod testing {
    use serde_json::Value;

    pub(crate) fn catalog_schema() -> Value {
        serde_json::from_str(include_str!("../tests/fixtures/catalog.json"))
            .expect("fixture schema is valid JSON")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::catalog_schema;

    #[test]
    fn finds_components_inside_envelope() {
        let message = json!({"surfaceUpdate": {"surfaceId": "s", "components": [{"id": "root"}]}});
        assert_eq!(message_components(&message).map(<[Value]>::len), Some(1));
        assert!(message_components(&json!({"deleteSurface": {}})).is_none());
    }

    #[test]
    fn structural_validator_skips_schema() {
        let validator = Validator::structural(standard_catalog());
        let payload = json!({"components": [
            {"id": "root", "component": "Column", "children": ["x"]},
            {"id": "x", "component": "Text", "text": "hi"}
        ]});
        assert_eq!(validator.validate(&payload), Ok(()));
    }

    #[test]
    fn schema_runs_before_structure() {
        let validator = Validator::new(&catalog_schema()).unwrap();
        let payload = json!({"components": [{"id": "c1", "componentProperties": "Text"}]});
        assert_eq!(
            validator.validate(&payload).unwrap_err().category(),
            ValidationCategory::Schema
        );
    }

    #[test]
    fn custom_limits_apply() {
        let validator = Validator::structural(ReferenceMap::default()).with_limits(RecursionLimits {
            max_global_depth: 2,
            max_function_call_depth: 1,
        });
        assert_eq!(validator.limits().max_global_depth, 2);
        assert_eq!(
            validator.validate(&json!({"a": {"b": {"c": 1}}})),
            Err(ValidationError::GlobalRecursionLimitExceeded { limit: 2 })
        );
    }
}
