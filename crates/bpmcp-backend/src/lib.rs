//! Graph backend capability and its reference implementation.
//!
//! The server edits assets only through the [`GraphBackend`] trait. This
//! crate also ships [`MemoryBackend`], which keeps assets in memory, resolves
//! classes, functions and events against a built-in [`Catalog`], and saves
//! assets to SQLite through [`SqliteStore`].
//!
//! # Modules
//!
//! - [`error`]: BackendError enum with all failure modes
//! - [`traits`]: GraphBackend trait definition
//! - [`catalog`]: built-in classes, functions, events and input actions
//! - [`compile`]: compile-time checks over an asset
//! - [`references`]: package reference graph
//! - [`memory`]: MemoryBackend implementation
//! - [`hash`]: blake3 content hashing of assets
//! - [`schema`]: SQL schema and migration setup
//! - [`sqlite`]: SqliteStore implementation

pub mod catalog;
pub mod compile;
pub mod error;
pub mod hash;
pub mod memory;
pub mod references;
pub mod schema;
pub mod sqlite;
pub mod traits;

// Re-export key types for ergonomic use.
pub use catalog::Catalog;
pub use error::BackendError;
pub use memory::MemoryBackend;
pub use sqlite::{SaveOutcome, SqliteStore};
pub use traits::GraphBackend;
