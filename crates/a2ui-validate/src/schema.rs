use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::ValidationError;

/// A compiled catalog JSON Schema.
#[derive(Clone)]
pub struct SchemaCheck {
    validator: Arc<jsonschema::Validator>,
}

impl SchemaCheck {
    pub fn compile(schema: &Value) -> Result<Self, ValidationError> {
        let validator =
            jsonschema::validator_for(schema).map_err(|err| ValidationError::InvalidSchema {
                message: err.to_string(),
            })?;
        Ok(Self {
            validator: Arc::new(validator),
        })
    }

    /// Report the first conformance failure, if any.
    pub fn check(&self, payload: &Value) -> Result<(), ValidationError> {
        match self.validator.iter_errors(payload).next() {
            Some(err) => Err(ValidationError::SchemaViolation {
                instance_path: err.instance_path.to_string(),
                message: err.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SchemaCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCheck").finish_non_exhaustive()
    }
}
