//! Backend error types for bpmcp-backend.
//!
//! [`BackendError`] covers every way the asset library can refuse a request:
//! lookups that miss, catalog entries that do not exist, model-level
//! violations forwarded from [`CoreError`], and persistence failures.

use bpmcp_core::CoreError;
use thiserror::Error;

/// Errors produced by backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No asset is loaded at this path.
    #[error("Blueprint '{path}' not found.")]
    AssetNotFound { path: String },

    /// The supplied path is not a valid long package name.
    #[error("Invalid asset path '{path}': {reason}")]
    InvalidAssetPath { path: String, reason: String },

    /// An asset already exists at the target path.
    #[error("Asset '{path}' already exists.")]
    AssetExists { path: String },

    /// The parent class is unknown.
    #[error("Parent class '{class}' not found.")]
    ClassNotFound { class: String },

    /// The component class is unknown.
    #[error("Component class '{class}' not found.")]
    ComponentClassNotFound { class: String },

    /// A component class exists but is not a component.
    #[error("Class '{class}' is not an ActorComponent.")]
    NotAComponent { class: String },

    /// The call target does not resolve to a known function.
    #[error("Function not found.")]
    FunctionNotFound { function: String },

    /// The input action asset is unknown.
    #[error("InputAction not found.")]
    InputActionNotFound { input_action: String },

    /// A graph-model rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Compilation found problems; the asset is left in the error state.
    #[error("Compile failed: {}", .problems.join("; "))]
    CompileFailed { problems: Vec<String> },

    /// Persisting the asset failed.
    #[error("Save failed: {reason}")]
    SaveFailed { reason: String },

    /// SQLite error from rusqlite.
    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(String),
}

impl BackendError {
    /// Returns `true` for lookups that missed, including model-level misses.
    pub fn is_not_found(&self) -> bool {
        match self {
            BackendError::AssetNotFound { .. }
            | BackendError::ClassNotFound { .. }
            | BackendError::ComponentClassNotFound { .. }
            | BackendError::FunctionNotFound { .. }
            | BackendError::InputActionNotFound { .. } => true,
            BackendError::Core(e) => e.is_not_found(),
            _ => false,
        }
    }
}
