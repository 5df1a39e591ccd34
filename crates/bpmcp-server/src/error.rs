//! Error types with HTTP status code mapping.
//!
//! [`ActionError`] is the single error type a dispatched action can produce.
//! It implements `axum::response::IntoResponse`: every variant except
//! [`ActionError::Internal`] becomes a 400 with an `{"error": message}` body,
//! internal failures become a 500. [`ServerError`] and [`ConfigError`] cover
//! server lifecycle and startup configuration.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use bpmcp_backend::BackendError;
use bpmcp_core::CoreError;

/// Coarse classification of an action failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request did not follow the action contract.
    Protocol,
    /// The action is not permitted right now.
    Permission,
    /// The backend refused the operation.
    Domain,
    /// The owner context could not run the work.
    Unavailable,
    /// A defect; reported as 500.
    Internal,
}

/// Errors produced while dispatching an action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("Missing '{0}'")]
    MissingParameter(String),

    #[error("Invalid '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Write operations are disabled.")]
    WritesDisabled,

    #[error("Owner context is unavailable.")]
    OwnerUnavailable,

    /// The backend rejected the operation.
    #[error(transparent)]
    Domain(#[from] BackendError),

    /// The backend reported a failure as a message only (creation results).
    #[error("{0}")]
    Rejected(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ActionError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ActionError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::UnknownAction(_) => "UnknownAction",
            ActionError::MissingParameter(_) => "MissingParameter",
            ActionError::InvalidParameter { .. } => "InvalidParameter",
            ActionError::WritesDisabled => "WritesDisabled",
            ActionError::OwnerUnavailable => "OwnerUnavailable",
            ActionError::Rejected(_) => "Rejected",
            ActionError::Internal(_) => "Internal",
            ActionError::Domain(e) => domain_kind(e),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            ActionError::UnknownAction(_)
            | ActionError::MissingParameter(_)
            | ActionError::InvalidParameter { .. } => ErrorClass::Protocol,
            ActionError::WritesDisabled => ErrorClass::Permission,
            ActionError::OwnerUnavailable => ErrorClass::Unavailable,
            ActionError::Domain(_) | ActionError::Rejected(_) => ErrorClass::Domain,
            ActionError::Internal(_) => ErrorClass::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.class() {
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

fn domain_kind(err: &BackendError) -> &'static str {
    if err.is_not_found() {
        return "NotFound";
    }
    match err {
        BackendError::InvalidAssetPath { .. } => "InvalidAssetPath",
        BackendError::AssetExists { .. } => "AssetExists",
        BackendError::NotAComponent { .. } => "NotAComponent",
        BackendError::CompileFailed { .. } => "CompileFailed",
        BackendError::SaveFailed { .. } => "SaveFailed",
        BackendError::Core(core) => match core {
            CoreError::DuplicateName { .. } => "DuplicateName",
            CoreError::EmptyName { .. } => "EmptyName",
            CoreError::LinkRejected { .. } => "LinkRejected",
            CoreError::LiteralRejected { .. } => "LiteralRejected",
            CoreError::InvalidAssetPath { .. } => "InvalidAssetPath",
            CoreError::InvalidPinType { .. } => "InvalidPinType",
            CoreError::InvalidNodeId { .. } => "InvalidNodeId",
            _ => "GraphError",
        },
        _ => "BackendError",
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Invalid startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Server already running.")]
    AlreadyRunning,

    #[error("Failed to bind 127.0.0.1:{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start owner context: {0}")]
    OwnerStart(std::io::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
