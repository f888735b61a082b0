//! Wire types for the A2UI server-to-client protocol.
//!
//! - [`Message`]: the message envelope, covering both protocol generations
//! - [`SurfaceOp`]: the normalised effect a message has on one surface
//! - [`Component`]: a raw component, whatever shape it arrived in
//! - [`pointer`]: JSON Pointer grammar and path resolution

pub mod component;
pub mod contents;
mod error;
pub mod message;
pub mod pointer;

pub use component::BoundValue;
pub use component::ChildList;
pub use component::Component;
pub use component::ROOT_ID;
pub use contents::decode_contents;
pub use error::ProtocolError;
pub use message::Message;
pub use message::SurfaceOp;
pub use message::DEFAULT_SURFACE_ID;
