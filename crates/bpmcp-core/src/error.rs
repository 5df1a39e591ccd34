//! Core error types for bpmcp-core.
//!
//! Uses `thiserror` for structured, matchable variants covering every way a
//! graph-model operation can be refused. Messages are client-facing: the
//! server forwards them verbatim in the `{"error": ...}` envelope.

use std::fmt;

use thiserror::Error;

use crate::id::NodeId;

/// Which member namespace a duplicate name collided in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Variable,
    Component,
    Graph,
    Pin,
    Node,
    Event,
}

impl NameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameKind::Variable => "variable",
            NameKind::Component => "component",
            NameKind::Graph => "graph",
            NameKind::Pin => "pin",
            NameKind::Node => "node",
            NameKind::Event => "event",
        }
    }
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the graph model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A name is already taken in its namespace.
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: NameKind, name: String },

    /// A name that must be non-empty was empty.
    #[error("{kind} name is empty")]
    EmptyName { kind: NameKind },

    /// No graph with this name exists in the asset.
    #[error("graph '{name}' not found")]
    GraphNotFound { name: String },

    /// No node with this id exists in the graph.
    #[error("node '{id}' not found")]
    NodeNotFound { id: NodeId },

    /// The node exists but has no pin with this name.
    #[error("pin '{pin}' not found on node '{node}'")]
    PinNotFound { node: NodeId, pin: String },

    /// No variable with this name exists in the asset.
    #[error("variable '{name}' not found")]
    VariableNotFound { name: String },

    /// A node id token could not be parsed.
    #[error("invalid node id '{token}'")]
    InvalidNodeId { token: String },

    /// An asset path is not a valid long package name.
    #[error("invalid asset path '{path}': {reason}")]
    InvalidAssetPath { path: String, reason: String },

    /// A pin type descriptor is malformed.
    #[error("invalid pin type: {reason}")]
    InvalidPinType { reason: String },

    /// A link request violates the link rules.
    #[error("link rejected: {reason}")]
    LinkRejected { reason: String },

    /// A literal default cannot be stored on this pin.
    #[error("cannot set default on pin '{pin}': {reason}")]
    LiteralRejected { pin: String, reason: String },

    /// A structural invariant of the graph is broken.
    #[error("graph inconsistency: {reason}")]
    GraphInconsistency { reason: String },
}

impl CoreError {
    /// Returns `true` for the not-found family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::GraphNotFound { .. }
                | CoreError::NodeNotFound { .. }
                | CoreError::PinNotFound { .. }
                | CoreError::VariableNotFound { .. }
        )
    }
}
