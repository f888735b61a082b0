//! A2UI runtime: structural validation of agent-generated UI payloads and
//! live surfaces rebuilt from the validated message stream.
//!
//! The pieces live in their own crates and are re-exported here. [`open`]
//! wires them together from a project's configuration files.

mod logging;

pub use a2ui_conf::ConfigError;
pub use a2ui_conf::Settings;
pub use a2ui_conf::TrustMode;
pub use a2ui_protocol::pointer;
pub use a2ui_protocol::Component;
pub use a2ui_protocol::Message;
pub use a2ui_protocol::ProtocolError;
pub use a2ui_protocol::SurfaceOp;
pub use a2ui_surface::ComponentNode;
pub use a2ui_surface::DataModel;
pub use a2ui_surface::DataModelError;
pub use a2ui_surface::MessageProcessor;
pub use a2ui_surface::ProcessError;
pub use a2ui_surface::ResolvedValue;
pub use a2ui_surface::SharedProcessor;
pub use a2ui_surface::Surface;
pub use a2ui_surface::SurfaceStore;
pub use a2ui_surface::TreeBuilder;
pub use a2ui_validate::standard_catalog;
pub use a2ui_validate::validate;
pub use a2ui_validate::ReferenceMap;
pub use a2ui_validate::ValidationCategory;
pub use a2ui_validate::ValidationError;
pub use a2ui_validate::Validator;
pub use logging::init_tracing;

use camino::Utf8Path;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Load settings for `project_root` and build a processor from them.
///
/// With `trust = "validate"` the processor rejects messages that fail
/// validation against `schema` (or only the structural checks when no schema
/// is given).
pub fn open(project_root: &Utf8Path, schema: Option<&Value>) -> Result<MessageProcessor, Error> {
    let settings = Settings::new(project_root)?;
    tracing::debug!(
        root = %project_root,
        trust = ?settings.trust(),
        "Loaded settings"
    );
    Ok(MessageProcessor::from_settings(&settings, schema)?)
}
