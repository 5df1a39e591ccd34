//! Action handlers and the HTTP gateway.
//!
//! [`queries`] and [`mutations`] hold the per-action handlers listed in the
//! dispatch table. They decode parameters, call the backend and shape the
//! payload; no editing logic lives here. [`gateway`] is the axum handler for
//! the single `/mcp` endpoint.

pub mod gateway;
pub mod mutations;
pub mod queries;
