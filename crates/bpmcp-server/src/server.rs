//! Server lifecycle.
//!
//! [`McpServer`] owns the pieces that outlive a single listener (backend,
//! owner handle, log sink, write flag) and can be started on a port, stopped
//! and started again. The listener always binds to loopback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;

use bpmcp_backend::GraphBackend;

use crate::error::ServerError;
use crate::events::LogSink;
use crate::owner::OwnerHandle;
use crate::router::build_router;
use crate::state::AppState;

struct RunningServer {
    port: u16,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct McpServer {
    backend: Arc<dyn GraphBackend>,
    owner: OwnerHandle,
    sink: LogSink,
    allow_writes: Arc<AtomicBool>,
    running: Mutex<Option<RunningServer>>,
}

impl McpServer {
    pub fn new(backend: Arc<dyn GraphBackend>, owner: OwnerHandle, allow_writes: bool) -> Self {
        McpServer {
            backend,
            owner,
            sink: LogSink::default(),
            allow_writes: Arc::new(AtomicBool::new(allow_writes)),
            running: Mutex::new(None),
        }
    }

    /// Binds `127.0.0.1:port` and starts serving. Port 0 picks a free port.
    /// Returns the bound port.
    pub async fn start(&self, port: u16) -> Result<u16, ServerError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            self.sink.log("Server already running.");
            return Err(ServerError::AlreadyRunning);
        }

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|source| ServerError::Bind { port, source })?;
        let bound = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { port, source })?
            .port();

        let state = AppState::new(
            Arc::clone(&self.backend),
            self.owner.clone(),
            self.sink.clone(),
            Arc::clone(&self.allow_writes),
        );
        let app = build_router(state);
        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!("server terminated: {}", e);
            }
        });

        self.sink.log(format!("Server started on 127.0.0.1:{}", bound));
        *running = Some(RunningServer {
            port: bound,
            shutdown,
            task,
        });
        Ok(bound)
    }

    /// Stops accepting connections and waits for in-flight requests.
    /// Returns false when the server was not running.
    pub async fn stop(&self) -> bool {
        let Some(server) = self.running.lock().await.take() else {
            return false;
        };
        let _ = server.shutdown.send(());
        if let Err(e) = server.task.await {
            tracing::warn!("server task ended abnormally: {}", e);
        }
        self.sink.log("Server stopped.");
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn port(&self) -> Option<u16> {
        self.running.lock().await.as_ref().map(|s| s.port)
    }

    /// Takes effect for the next dispatched request, running or not.
    pub fn set_allow_writes(&self, allow: bool) {
        self.allow_writes.store(allow, Ordering::SeqCst);
    }

    pub fn allow_writes(&self) -> bool {
        self.allow_writes.load(Ordering::SeqCst)
    }

    pub fn subscribe_logs(&self) -> broadcast::Receiver<String> {
        self.sink.subscribe()
    }
}
