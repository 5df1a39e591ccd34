//! The [`GraphBackend`] trait: the capability object the server edits through.
//!
//! Two halves:
//! - **Reads** (`load_asset`, `list_assets`, `references`) may be called from
//!   any thread concurrently.
//! - **Mutations** are only ever called from the owner context. Implementations
//!   may rely on that for ordering but must still be `Sync`, because the
//!   handle is shared between the owner and the request workers.
//!
//! Every method takes `&self`; implementations use interior mutability.

use bpmcp_core::{AssetReferences, CreationResult, GraphAsset, NodeId, PinRef, PinType, Position, TriggerEvent};

use crate::error::BackendError;

/// Storage and editing capability for graph assets.
pub trait GraphBackend: Send + Sync {
    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    /// Loads a snapshot of the asset at `path` (package or object form),
    /// with its references filled in.
    fn load_asset(&self, path: &str) -> Result<GraphAsset, BackendError>;

    /// Object paths of every asset under any of `roots` (all assets when
    /// `roots` is empty), sorted.
    fn list_assets(&self, roots: &[String]) -> Result<Vec<String>, BackendError>;

    /// Outgoing and incoming package references of the asset at `path`.
    fn references(&self, path: &str) -> Result<AssetReferences, BackendError>;

    // -------------------------------------------------------------------
    // Mutations (owner context only)
    // -------------------------------------------------------------------

    /// Creates a new, empty asset. Failures are reported in the result.
    fn create_asset(&self, package_path: &str, parent_class: Option<&str>) -> CreationResult;

    /// Adds a member variable.
    fn add_variable(&self, path: &str, name: &str, var_type: PinType) -> Result<(), BackendError>;

    /// Adds a function graph with its entry node.
    fn add_function_graph(&self, path: &str, name: &str) -> Result<(), BackendError>;

    /// Adds a call node for `function_path` (`Owner:Function`).
    fn add_call_function_node(
        &self,
        path: &str,
        graph: &str,
        function_path: &str,
        position: Position,
    ) -> Result<NodeId, BackendError>;

    /// Adds an engine event node, or a custom event for unknown names.
    fn add_event_node(
        &self,
        path: &str,
        graph: &str,
        event_name: &str,
        position: Position,
    ) -> Result<NodeId, BackendError>;

    /// Adds an enhanced-input action event bound to one trigger phase.
    fn add_input_action_event(
        &self,
        path: &str,
        graph: &str,
        input_action: &str,
        trigger: TriggerEvent,
        position: Position,
    ) -> Result<NodeId, BackendError>;

    /// Adds a component template of `class`.
    fn add_component(&self, path: &str, class: &str, name: &str) -> Result<(), BackendError>;

    /// Stores a literal default on an input pin.
    fn set_pin_literal(
        &self,
        path: &str,
        graph: &str,
        node: NodeId,
        pin: &str,
        value: &str,
    ) -> Result<(), BackendError>;

    /// Links two pins in `graph`.
    fn connect_pins(&self, path: &str, graph: &str, from: &PinRef, to: &PinRef) -> Result<(), BackendError>;

    /// Validates the asset and marks it up to date or in error.
    fn compile(&self, path: &str) -> Result<(), BackendError>;

    /// Persists the asset.
    fn save(&self, path: &str) -> Result<(), BackendError>;
}
