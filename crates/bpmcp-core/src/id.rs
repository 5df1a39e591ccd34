//! Stable identity tokens for graph entities.
//!
//! A [`NodeId`] is generated once when a node is created and stays stable for
//! the lifetime of the asset session. It is the only way a client can address a
//! node across requests. On the wire it is the hyphenated GUID text; nothing
//! about it encodes an address or an index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Opaque, stable node handle (UUID v4 newtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Allocates a fresh, process-unique node id.
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }

    /// Parses a client-supplied id token.
    ///
    /// Accepts the hyphenated, simple and braced GUID spellings in either
    /// case, so tokens copied from other tools still resolve.
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(token.trim())
            .map(NodeId)
            .map_err(|_| CoreError::InvalidNodeId {
                token: token.to_string(),
            })
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for NodeId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeId::parse(s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
