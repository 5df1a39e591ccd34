//! HTTP/JSON action server for editing blueprint graphs.
//!
//! A client posts `{"action": ..., "params": {...}}` to `/mcp`. The
//! dispatcher validates the call against the action table and runs it:
//! reads directly against the backend, mutations on the single owner context
//! through the rendezvous in [`owner`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod handlers;
pub mod owner;
pub mod router;
pub mod schema;
pub mod server;
pub mod state;
