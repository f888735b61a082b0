use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload is not a recognised message envelope.
    #[error("Malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Message must have exactly one top-level key, found {found}")]
    Envelope { found: usize },

    #[error("Component is missing an 'id'")]
    MissingComponentId,

    #[error("Component '{id}' does not declare a component type")]
    MissingComponentType { id: String },

    #[error("Component '{id}' declares {found} component types, expected exactly one")]
    AmbiguousComponentType { id: String, found: usize },

    #[error("Invalid JSON Pointer: '{path}'")]
    InvalidPointer { path: String },
}
