use a2ui_protocol::component::ID;
use a2ui_protocol::ROOT_ID;
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::references::component_references;
use crate::ReferenceMap;
use crate::ValidationError;

/// Check id uniqueness, root presence and reference closure, in that order.
///
/// Components without a string `id` take no part in the check.
pub fn check_integrity(
    components: &[Value],
    references: &ReferenceMap,
) -> Result<(), ValidationError> {
    let mut ids = FxHashSet::default();

    for id in components.iter().filter_map(component_id) {
        if !ids.insert(id) {
            return Err(ValidationError::DuplicateId { id: id.to_string() });
        }
    }

    if !ids.contains(ROOT_ID) {
        return Err(ValidationError::MissingRoot);
    }

    for component in components {
        for reference in component_references(component, references) {
            if !ids.contains(reference.target) {
                return Err(ValidationError::DanglingReference {
                    component: component_id(component).unwrap_or_default().to_string(),
                    missing: reference.target.to_string(),
                    field: reference.field.to_string(),
                });
            }
        }
    }

    Ok(())
}

pub(crate) fn component_id(component: &Value) -> Option<&str> {
    component.get(ID).and_then(Value::as_str)
}
