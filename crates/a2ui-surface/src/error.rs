use a2ui_protocol::ProtocolError;
use a2ui_validate::ValidationError;
use thiserror::Error;

use crate::DataModelError;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Message rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("Data model update failed: {0}")]
    DataModel(#[from] DataModelError),

    #[error("Unknown surface '{surface_id}'")]
    UnknownSurface { surface_id: String },

    /// A message in a batch failed; messages before it stay applied.
    #[error("Message {index} failed: {source}")]
    Batch {
        index: usize,
        source: Box<ProcessError>,
    },
}

impl ProcessError {
    /// The validation error behind this failure, if validation rejected it.
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Batch { source, .. } => source.validation(),
            _ => None,
        }
    }
}
