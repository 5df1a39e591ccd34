//! The `/mcp` endpoint.
//!
//! Decodes the `{action, params}` envelope, runs the dispatcher on a blocking
//! worker and maps the outcome to exactly one HTTP response and one log line.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::dispatch::Params;
use crate::error::ActionError;
use crate::state::AppState;

/// `POST /mcp`
pub async fn handle_mcp(State(state): State<AppState>, body: Bytes) -> Response {
    let sink = state.sink.clone();
    sink.log(format!("Request received ({} bytes).", body.len()));

    let request: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            sink.log("Malformed JSON request.");
            return (StatusCode::BAD_REQUEST, "Malformed JSON").into_response();
        }
    };

    let Some(action) = request.get("action").and_then(Value::as_str) else {
        sink.log("Missing 'action' field.");
        return (StatusCode::BAD_REQUEST, "Missing 'action'").into_response();
    };
    let action = action.to_string();
    let params = match request.get("params") {
        Some(Value::Object(map)) => map.clone(),
        _ => Params::new(),
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    let name = action.clone();
    let outcome = tokio::task::spawn_blocking(move || dispatcher.dispatch(&name, &params))
        .await
        .unwrap_or_else(|join_err| {
            let reason = if join_err.is_panic() {
                "action panicked".to_string()
            } else {
                join_err.to_string()
            };
            Err(ActionError::Internal(reason))
        });

    match outcome {
        Ok(payload) => {
            sink.log(format!("Action '{}' succeeded.", action));
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            sink.log(format!("Action '{}' failed: {}", action, err));
            err.into_response()
        }
    }
}
