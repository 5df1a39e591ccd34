//! Shared state handed to the axum handlers.
//!
//! [`AppState`] carries the dispatcher and the log sink. The dispatcher holds
//! the backend, the owner handle and the shared write-enable flag, so cloning
//! the state is cheap and every clone sees the same flag.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use bpmcp_backend::{GraphBackend, MemoryBackend};

use crate::dispatch::{ActionContext, Dispatcher};
use crate::error::ServerError;
use crate::events::LogSink;
use crate::owner::{OwnerContext, OwnerHandle};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub sink: LogSink,
    /// Owner thread started by this state, kept alive as long as any clone.
    owner: Option<Arc<OwnerContext>>,
}

impl AppState {
    /// Builds state around an existing owner.
    pub fn new(
        backend: Arc<dyn GraphBackend>,
        owner: OwnerHandle,
        sink: LogSink,
        allow_writes: Arc<AtomicBool>,
    ) -> Self {
        let ctx = ActionContext {
            backend,
            sink: sink.clone(),
        };
        AppState {
            dispatcher: Arc::new(Dispatcher::new(ctx, owner, allow_writes)),
            sink,
            owner: None,
        }
    }

    /// Builds state with its own owner thread.
    pub fn with_backend(backend: Arc<dyn GraphBackend>, allow_writes: bool) -> Result<Self, ServerError> {
        let owner = OwnerContext::spawn().map_err(ServerError::OwnerStart)?;
        let mut state = AppState::new(
            backend,
            owner.handle(),
            LogSink::default(),
            Arc::new(AtomicBool::new(allow_writes)),
        );
        state.owner = Some(Arc::new(owner));
        Ok(state)
    }

    /// Writable state over an empty in-memory backend (for testing).
    pub fn in_memory() -> Result<Self, ServerError> {
        let backend = Arc::new(MemoryBackend::in_memory()?);
        AppState::with_backend(backend, true)
    }
}
