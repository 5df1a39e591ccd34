//! Request and response types for the action protocol.
//!
//! Each action's `params` object deserializes into a request type from
//! [`queries`] or [`mutations`]; handlers return one of the response types
//! serialized as the top-level payload.

pub mod mutations;
pub mod queries;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::dispatch::Params;
use crate::error::ActionError;

/// Decodes action parameters into a request type.
pub fn parse<T: DeserializeOwned>(params: &Params) -> Result<T, ActionError> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| ActionError::invalid("params", e.to_string()))
}

/// Encodes a response payload.
pub fn reply<T: Serialize>(payload: &T) -> Result<Value, ActionError> {
    serde_json::to_value(payload).map_err(|e| ActionError::Internal(e.to_string()))
}
