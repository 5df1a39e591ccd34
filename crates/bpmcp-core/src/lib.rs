//! Graph model for the blueprint action server.
//!
//! Pure data and invariants: assets, graphs, nodes, typed pins and links, plus
//! the structure serializer. No I/O happens here; the backend crate stores and
//! edits these types and the server exposes them over HTTP.

pub mod asset;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod serialize;
pub mod types;

// Re-export commonly used types
pub use asset::{AssetPath, CreationResult};
pub use error::{CoreError, NameKind};
pub use graph::{
    AssetReferences, AssetStatus, Component, Graph, GraphAsset, GraphKind, Variable,
    DEFAULT_EVENT_GRAPH,
};
pub use id::NodeId;
pub use node::{Node, NodeKind, Pin, PinRef, Position, TriggerEvent};
pub use types::{PinContainer, PinDirection, PinType};
