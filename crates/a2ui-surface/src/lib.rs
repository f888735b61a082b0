//! Live A2UI surfaces.
//!
//! A [`MessageProcessor`] owns a [`SurfaceStore`], applies protocol messages
//! to it and rebuilds each touched surface's [`ComponentNode`] tree with the
//! [`TreeBuilder`], resolving data bindings against the surface's
//! [`DataModel`].

mod data_model;
mod error;
mod processor;
mod surface;
mod tree;

pub use a2ui_conf::TrustMode;
pub use data_model::DataModel;
pub use data_model::DataModelError;
pub use error::ProcessError;
pub use processor::MessageProcessor;
pub use processor::SharedProcessor;
pub use surface::Surface;
pub use surface::SurfaceStore;
pub use tree::ComponentNode;
pub use tree::ResolvedValue;
pub use tree::TreeBuilder;
pub use tree::DEFAULT_NODE_LIMIT;
