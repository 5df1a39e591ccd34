//! Concurrency tests for the action server.
//!
//! Verifies that mutations from concurrent requests are serialized through
//! the owner context, that a panicking mutation becomes a 500 without taking
//! the owner down, and that the server lifecycle and log fan-out behave over a
//! real loopback socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

use bpmcp_backend::{BackendError, GraphBackend, MemoryBackend};
use bpmcp_core::{AssetReferences, CreationResult, GraphAsset, NodeId, PinRef, PinType, Position, TriggerEvent};
use bpmcp_server::error::ServerError;
use bpmcp_server::owner::OwnerContext;
use bpmcp_server::router::build_router;
use bpmcp_server::server::McpServer;
use bpmcp_server::state::AppState;

// ---------------------------------------------------------------------------
// Instrumented backend
// ---------------------------------------------------------------------------

/// Delegates to a `MemoryBackend` while recording how many `add_variable`
/// calls overlap. A variable named `panic` makes the call panic.
struct InstrumentedBackend {
    inner: MemoryBackend,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl InstrumentedBackend {
    fn new() -> Self {
        InstrumentedBackend {
            inner: MemoryBackend::in_memory().unwrap(),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }
}

impl GraphBackend for InstrumentedBackend {
    fn load_asset(&self, path: &str) -> Result<GraphAsset, BackendError> {
        self.inner.load_asset(path)
    }

    fn list_assets(&self, roots: &[String]) -> Result<Vec<String>, BackendError> {
        self.inner.list_assets(roots)
    }

    fn references(&self, path: &str) -> Result<AssetReferences, BackendError> {
        self.inner.references(path)
    }

    fn create_asset(&self, package_path: &str, parent_class: Option<&str>) -> CreationResult {
        self.inner.create_asset(package_path, parent_class)
    }

    fn add_variable(&self, path: &str, name: &str, var_type: PinType) -> Result<(), BackendError> {
        if name == "panic" {
            panic!("instrumented backend asked to panic");
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2));
        let result = self.inner.add_variable(path, name, var_type);
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn add_function_graph(&self, path: &str, name: &str) -> Result<(), BackendError> {
        self.inner.add_function_graph(path, name)
    }

    fn add_call_function_node(
        &self,
        path: &str,
        graph: &str,
        function_path: &str,
        position: Position,
    ) -> Result<NodeId, BackendError> {
        self.inner
            .add_call_function_node(path, graph, function_path, position)
    }

    fn add_event_node(
        &self,
        path: &str,
        graph: &str,
        event_name: &str,
        position: Position,
    ) -> Result<NodeId, BackendError> {
        self.inner.add_event_node(path, graph, event_name, position)
    }

    fn add_input_action_event(
        &self,
        path: &str,
        graph: &str,
        input_action: &str,
        trigger: TriggerEvent,
        position: Position,
    ) -> Result<NodeId, BackendError> {
        self.inner
            .add_input_action_event(path, graph, input_action, trigger, position)
    }

    fn add_component(&self, path: &str, class: &str, name: &str) -> Result<(), BackendError> {
        self.inner.add_component(path, class, name)
    }

    fn set_pin_literal(
        &self,
        path: &str,
        graph: &str,
        node: NodeId,
        pin: &str,
        value: &str,
    ) -> Result<(), BackendError> {
        self.inner.set_pin_literal(path, graph, node, pin, value)
    }

    fn connect_pins(&self, path: &str, graph: &str, from: &PinRef, to: &PinRef) -> Result<(), BackendError> {
        self.inner.connect_pins(path, graph, from, to)
    }

    fn compile(&self, path: &str) -> Result<(), BackendError> {
        self.inner.compile(path)
    }

    fn save(&self, path: &str) -> Result<(), BackendError> {
        self.inner.save(path)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn call(app: &Router, action: &str, params: Value) -> (StatusCode, Value) {
    let body = json!({ "action": action, "params": params });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(json!(null)))
}

/// Sends one HTTP/1.1 request over a real socket and returns the raw reply.
async fn post_over_tcp(port: u16, body: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let request = format!(
        "POST /mcp HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).await.unwrap();
    reply
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mutations_never_overlap() {
    let backend = Arc::new(InstrumentedBackend::new());
    let state = AppState::with_backend(backend.clone(), true).unwrap();
    let dispatcher = Arc::clone(&state.dispatcher);
    let app = build_router(state);

    let (status, _) = call(&app, "create_blueprint", json!({ "package_path": "/Game/BP_Busy" })).await;
    assert_eq!(status, StatusCode::OK);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let writer = app.clone();
        tasks.push(tokio::spawn(async move {
            call(
                &writer,
                "add_variable",
                json!({ "asset_path": "/Game/BP_Busy", "name": format!("Var{}", i), "type": "int" }),
            )
            .await
        }));
        // Interleave reads with the writes.
        let reader = app.clone();
        tasks.push(tokio::spawn(async move {
            call(&reader, "get_blueprint_structure", json!({ "asset_path": "/Game/BP_Busy" })).await
        }));
    }
    for task in tasks {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK, "{:?}", body);
    }

    assert_eq!(backend.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.owner().jobs_run(), 17);

    let (_, structure) = call(&app, "get_blueprint_structure", json!({ "asset_path": "/Game/BP_Busy" })).await;
    assert_eq!(structure["variables"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn panicking_mutation_is_500_and_owner_survives() {
    let backend = Arc::new(InstrumentedBackend::new());
    let app = build_router(AppState::with_backend(backend, true).unwrap());

    let (status, _) = call(&app, "create_blueprint", json!({ "package_path": "/Game/BP_Fragile" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "add_variable",
        json!({ "asset_path": "/Game/BP_Fragile", "name": "panic", "type": "int" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, _) = call(
        &app,
        "add_variable",
        json!({ "asset_path": "/Game/BP_Fragile", "name": "Fine", "type": "int" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn each_request_produces_log_lines() {
    let state = AppState::in_memory().unwrap();
    let mut logs = state.sink.subscribe();
    let app = build_router(state);

    call(&app, "list_blueprints", json!({})).await;
    call(&app, "nope", json!({})).await;
    let size = |action: &str| {
        serde_json::to_vec(&json!({ "action": action, "params": {} }))
            .unwrap()
            .len()
    };

    let mut lines = Vec::new();
    while let Ok(line) = logs.try_recv() {
        lines.push(line);
    }
    assert_eq!(
        lines,
        vec![
            format!("Request received ({} bytes).", size("list_blueprints")),
            "Listed 0 blueprints.".to_string(),
            "Action 'list_blueprints' succeeded.".to_string(),
            format!("Request received ({} bytes).", size("nope")),
            "Action 'nope' failed: Unknown action 'nope'".to_string(),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn server_lifecycle_over_loopback() {
    let owner = OwnerContext::spawn().unwrap();
    let backend: Arc<dyn GraphBackend> = Arc::new(MemoryBackend::in_memory().unwrap());
    let server = McpServer::new(backend, owner.handle(), false);
    let mut logs = server.subscribe_logs();

    assert!(!server.stop().await);
    let port = server.start(0).await.unwrap();
    assert_ne!(port, 0);
    assert!(server.is_running().await);
    assert_eq!(server.port().await, Some(port));
    assert!(matches!(server.start(0).await, Err(ServerError::AlreadyRunning)));

    let reply = post_over_tcp(port, r#"{"action":"create_blueprint","params":{"package_path":"/Game/BP_Net"}}"#).await;
    assert!(reply.starts_with("HTTP/1.1 400"), "{}", reply);
    assert!(reply.contains("Write operations are disabled."));

    server.set_allow_writes(true);
    assert!(server.allow_writes());
    let reply = post_over_tcp(port, r#"{"action":"create_blueprint","params":{"package_path":"/Game/BP_Net"}}"#).await;
    assert!(reply.starts_with("HTTP/1.1 200"), "{}", reply);
    assert!(reply.contains("/Game/BP_Net.BP_Net"));

    assert!(server.stop().await);
    assert!(!server.is_running().await);
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());

    let mut lines = Vec::new();
    while let Ok(line) = logs.try_recv() {
        lines.push(line);
    }
    assert_eq!(lines.first(), Some(&format!("Server started on 127.0.0.1:{}", port)));
    assert!(lines.contains(&"Server already running.".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("Server stopped."));

    // Restarting after a stop is allowed and keeps the created asset.
    let port = server.start(0).await.unwrap();
    let reply = post_over_tcp(port, r#"{"action":"list_blueprints"}"#).await;
    assert!(reply.contains("/Game/BP_Net.BP_Net"), "{}", reply);
    server.stop().await;

    tokio::task::spawn_blocking(move || owner.shutdown()).await.unwrap();
}

#[tokio::test]
async fn owner_shutdown_surfaces_as_unavailable() {
    let owner = OwnerContext::spawn().unwrap();
    let backend: Arc<dyn GraphBackend> = Arc::new(MemoryBackend::in_memory().unwrap());
    let state = AppState::new(
        backend,
        owner.handle(),
        Default::default(),
        Arc::new(std::sync::atomic::AtomicBool::new(true)),
    );
    let app = build_router(state);
    tokio::task::spawn_blocking(move || owner.shutdown()).await.unwrap();

    let (status, body) = call(&app, "create_blueprint", json!({ "package_path": "/Game/BP_Late" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Owner context is unavailable.");

    let (status, _) = call(&app, "list_blueprints", json!({})).await;
    assert_eq!(status, StatusCode::OK);
}
