use serde::Serialize;
use thiserror::Error;

/// Broad grouping of [`ValidationError`] variants, in pipeline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationCategory {
    Schema,
    Integrity,
    Topology,
    Recursion,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    #[error("Schema violation at '{instance_path}': {message}")]
    SchemaViolation {
        instance_path: String,
        message: String,
    },

    /// The catalog schema itself could not be compiled.
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("Duplicate component ID found: '{id}'")]
    DuplicateId { id: String },

    #[error("Missing 'root' component: One component must have 'id' set to 'root'.")]
    MissingRoot,

    #[error("Component '{component}' references missing ID '{missing}' in field '{field}'")]
    DanglingReference {
        component: String,
        missing: String,
        field: String,
    },

    #[error("Self-reference detected: Component '{component}' references itself in field '{field}'")]
    SelfReference { component: String, field: String },

    #[error("Circular reference detected involving component '{component}'")]
    CircularReference { component: String },

    #[error("Orphaned components detected (not reachable from 'root'): [{}]", quoted(.orphans))]
    OrphanComponent { orphans: Vec<String> },

    #[error("Global recursion limit exceeded: Depth > {limit}")]
    GlobalRecursionLimitExceeded { limit: usize },

    #[error("Recursion limit exceeded: functionCall depth > {limit}")]
    FunctionCallDepthExceeded { limit: usize },

    #[error("Invalid JSON Pointer syntax: '{path}'")]
    InvalidPathSyntax { path: String },
}

fn quoted(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("'{id}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    #[must_use]
    pub fn category(&self) -> ValidationCategory {
        match self {
            ValidationError::SchemaViolation { .. } | ValidationError::InvalidSchema { .. } => {
                ValidationCategory::Schema
            }
            ValidationError::DuplicateId { .. }
            | ValidationError::MissingRoot
            | ValidationError::DanglingReference { .. } => ValidationCategory::Integrity,
            ValidationError::SelfReference { .. }
            | ValidationError::CircularReference { .. }
            | ValidationError::OrphanComponent { .. } => ValidationCategory::Topology,
            ValidationError::GlobalRecursionLimitExceeded { .. }
            | ValidationError::FunctionCallDepthExceeded { .. }
            | ValidationError::InvalidPathSyntax { .. } => ValidationCategory::Recursion,
        }
    }

    /// Get a diagnostic code string for this error type
    #[must_use]
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            ValidationError::SchemaViolation { .. } => "S100",
            ValidationError::InvalidSchema { .. } => "S101",
            ValidationError::DuplicateId { .. } => "I100",
            ValidationError::MissingRoot => "I101",
            ValidationError::DanglingReference { .. } => "I102",
            ValidationError::SelfReference { .. } => "T100",
            ValidationError::CircularReference { .. } => "T101",
            ValidationError::OrphanComponent { .. } => "T102",
            ValidationError::GlobalRecursionLimitExceeded { .. } => "R100",
            ValidationError::FunctionCallDepthExceeded { .. } => "R101",
            ValidationError::InvalidPathSyntax { .. } => "R102",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orphan_message_lists_quoted_ids() {
        let err = ValidationError::OrphanComponent {
            orphans: vec!["a".to_string(), "b".to_string()],
        };
        insta::assert_snapshot!(
            err.to_string(),
            @"Orphaned components detected (not reachable from 'root'): ['a', 'b']"
        );
    }

    #[test]
    fn codes_follow_categories() {
        let err = ValidationError::CircularReference {
            component: "root".to_string(),
        };
        assert_eq!(err.category(), ValidationCategory::Topology);
        assert!(err.diagnostic_code().starts_with('T'));

        assert_eq!(ValidationError::MissingRoot.category(), ValidationCategory::Integrity);
        assert_eq!(ValidationError::MissingRoot.diagnostic_code(), "I101");
    }
}
