//! End-to-end tests for the `/mcp` action endpoint.
//!
//! Tests exercise the full stack: HTTP request -> axum router -> gateway ->
//! dispatcher -> owner rendezvous -> MemoryBackend -> HTTP response.
//!
//! Each test creates a fresh AppState over an in-memory backend and sends
//! requests with `tower::ServiceExt::oneshot`, without starting a network
//! server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use bpmcp_backend::MemoryBackend;
use bpmcp_core::NodeId;
use bpmcp_server::router::{build_router, MAX_BODY_BYTES};
use bpmcp_server::state::AppState;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

const ASSET: &str = "/Game/Blueprints/BP_Door";

/// Creates a fresh router with writes enabled.
fn test_app() -> Router {
    let state = AppState::in_memory().expect("failed to create in-memory AppState");
    build_router(state)
}

/// Sends raw bytes to `/mcp` and returns (status, content type, body bytes).
async fn post_raw(app: &Router, body: Vec<u8>) -> (StatusCode, String, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, body_bytes.to_vec())
}

/// Calls one action and returns (status, json).
async fn call(app: &Router, action: &str, params: Value) -> (StatusCode, Value) {
    let body = json!({ "action": action, "params": params });
    let (status, _, bytes) = post_raw(app, serde_json::to_vec(&body).unwrap()).await;
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(json!(null));
    (status, json)
}

/// Calls an action that must succeed and returns its payload.
async fn call_ok(app: &Router, action: &str, params: Value) -> Value {
    let (status, body) = call(app, action, params).await;
    assert_eq!(status, StatusCode::OK, "{} failed: {:?}", action, body);
    body
}

async fn create_door(app: &Router) {
    let body = call_ok(app, "create_blueprint", json!({ "package_path": ASSET })).await;
    assert_eq!(body["asset_path"], "/Game/Blueprints/BP_Door.BP_Door");
}

async fn add_node(app: &Router, action: &str, params: Value) -> String {
    let body = call_ok(app, action, params).await;
    body["node_guid"].as_str().unwrap().to_string()
}

fn find_node<'a>(structure: &'a Value, graph: &str, id: &str) -> &'a Value {
    structure["graphs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["name"] == graph)
        .and_then(|g| g["nodes"].as_array().unwrap().iter().find(|n| n["id"] == id))
        .unwrap_or_else(|| panic!("node {} not in graph {}", id, graph))
}

fn find_pin<'a>(node: &'a Value, pin: &str) -> &'a Value {
    node["pins"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == pin)
        .unwrap_or_else(|| panic!("pin {} missing", pin))
}

// ---------------------------------------------------------------------------
// Envelope handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_json_is_plain_text_400() {
    let app = test_app();
    let (status, content_type, body) = post_raw(&app, b"{".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("text/plain"), "{}", content_type);
    assert_eq!(body, b"Malformed JSON");
}

#[tokio::test]
async fn missing_action_is_400() {
    let app = test_app();
    let (status, _, body) = post_raw(&app, br#"{"params": {}}"#.to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"Missing 'action'");

    let (status, _, _) = post_raw(&app, br#"{"action": 7}"#.to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_action_is_400_with_error_body() {
    let app = test_app();
    let (status, body) = call(&app, "teleport", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown action 'teleport'");
}

#[tokio::test]
async fn missing_parameter_names_field() {
    let app = test_app();
    let (status, body) = call(&app, "get_blueprint_structure", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'asset_path'");
}

#[tokio::test]
async fn absent_params_is_empty_object() {
    let app = test_app();
    let (status, _, bytes) = post_raw(&app, br#"{"action": "list_blueprints"}"#.to_vec()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "blueprints": [] }));
}

#[tokio::test]
async fn oversized_body_is_413() {
    let app = test_app();
    let padding = "x".repeat(MAX_BODY_BYTES + 1);
    let body = serde_json::to_vec(&json!({ "action": "list_blueprints", "pad": padding })).unwrap();
    let (status, _, _) = post_raw(&app, body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

// ---------------------------------------------------------------------------
// Write gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn writes_disabled_blocks_every_mutation() {
    let backend = Arc::new(MemoryBackend::in_memory().unwrap());
    let state = AppState::with_backend(backend.clone(), false).unwrap();
    let dispatcher = Arc::clone(&state.dispatcher);
    let app = build_router(state);

    let (status, body) = call(&app, "create_blueprint", json!({ "package_path": ASSET })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Write operations are disabled.");

    let (status, _) = call(
        &app,
        "add_variable",
        json!({ "asset_path": ASSET, "name": "Health", "type": "float" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(dispatcher.owner().jobs_run(), 0);
    assert_eq!(backend.asset_count(), 0);

    // Reads are unaffected.
    call_ok(&app, "list_blueprints", json!({})).await;

    dispatcher.set_allow_writes(true);
    create_door(&app).await;
    assert_eq!(dispatcher.owner().jobs_run(), 1);
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_and_list_blueprints() {
    let app = test_app();
    create_door(&app).await;
    call_ok(
        &app,
        "create_blueprint",
        json!({ "package_path": "/Game/Pawns/BP_Hero", "parent_class": "Pawn" }),
    )
    .await;
    call_ok(&app, "create_blueprint", json!({ "package_path": "/GameData/BP_Data" })).await;

    let all = call_ok(&app, "list_blueprints", json!({})).await;
    assert_eq!(all["blueprints"].as_array().unwrap().len(), 3);

    let under_game = call_ok(&app, "list_blueprints", json!({ "paths": ["/Game"] })).await;
    assert_eq!(
        under_game["blueprints"],
        json!(["/Game/Blueprints/BP_Door.BP_Door", "/Game/Pawns/BP_Hero.BP_Hero"])
    );
}

#[tokio::test]
async fn create_blueprint_failures() {
    let app = test_app();
    let (status, body) = call(&app, "create_blueprint", json!({ "package_path": "Game/BP" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("/Game/MyFolder/BP_Name"));

    let (status, body) = call(
        &app,
        "create_blueprint",
        json!({ "package_path": ASSET, "parent_class": "NoSuchClass" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Parent class 'NoSuchClass' not found.");

    create_door(&app).await;
    let (status, _) = call(&app, "create_blueprint", json!({ "package_path": ASSET })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_variable_rejected() {
    let app = test_app();
    create_door(&app).await;
    let params = json!({ "asset_path": ASSET, "name": "Health", "type": { "category": "float" } });

    call_ok(&app, "add_variable", params.clone()).await;
    let (status, body) = call(&app, "add_variable", params).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Health"), "{:?}", body);

    let structure = call_ok(&app, "get_blueprint_structure", json!({ "asset_path": ASSET })).await;
    assert_eq!(
        structure["variables"],
        json!([{ "name": "Health", "type": "float", "is_array": false, "is_set": false, "is_map": false }])
    );
}

#[tokio::test]
async fn conflicting_container_flags_rejected() {
    let app = test_app();
    create_door(&app).await;
    let (status, body) = call(
        &app,
        "add_variable",
        json!({ "asset_path": ASSET, "name": "Bag", "type": { "category": "int", "is_set": true, "is_map": true } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid 'type'"));
}

#[tokio::test]
async fn malformed_type_names_type_field() {
    let app = test_app();
    create_door(&app).await;
    let (status, body) = call(
        &app,
        "add_variable",
        json!({ "asset_path": ASSET, "name": "Count", "type": { "category": 5 } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid 'type'"), "{}", error);
    assert!(!error.contains("untagged"));
}

#[tokio::test]
async fn null_container_flag_is_absent() {
    let app = test_app();
    create_door(&app).await;
    call_ok(
        &app,
        "add_variable",
        json!({ "asset_path": ASSET, "name": "Count", "type": { "category": "int", "is_array": null } }),
    )
    .await;
    let structure = call_ok(&app, "get_blueprint_structure", json!({ "asset_path": ASSET })).await;
    let count = structure["variables"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["name"] == "Count")
        .unwrap();
    assert_eq!(count["type"], "int");
    assert_eq!(count["is_array"], false);
}

#[tokio::test]
async fn linked_pins_round_trip() {
    let app = test_app();
    create_door(&app).await;

    let begin = add_node(
        &app,
        "add_event_node",
        json!({ "asset_path": ASSET, "graph": "EventGraph", "event_name": "ReceiveBeginPlay" }),
    )
    .await;
    let print = add_node(
        &app,
        "add_call_function_node",
        json!({
            "asset_path": ASSET,
            "graph": "EventGraph",
            "function_path": "KismetSystemLibrary:PrintString",
            "x": 300,
            "y": 0
        }),
    )
    .await;

    call_ok(
        &app,
        "connect_pins",
        json!({
            "asset_path": ASSET, "graph": "EventGraph",
            "from_node": begin, "from_pin": "then",
            "to_node": print, "to_pin": "execute"
        }),
    )
    .await;

    let structure = call_ok(&app, "get_blueprint_structure", json!({ "asset_path": ASSET })).await;
    let then = find_pin(find_node(&structure, "EventGraph", &begin), "then");
    let execute = find_pin(find_node(&structure, "EventGraph", &print), "execute");
    assert_eq!(then["linked_to"], json!([{ "node_id": print, "pin_name": "execute" }]));
    assert_eq!(execute["linked_to"], json!([{ "node_id": begin, "pin_name": "then" }]));
    assert_eq!(then["direction"], "out");
    assert_eq!(execute["direction"], "in");

    let print_node = find_node(&structure, "EventGraph", &print);
    assert_eq!(print_node["class"], "K2Node_CallFunction");
    assert_eq!(print_node["position"], json!({ "x": 300, "y": 0 }));
}

#[tokio::test]
async fn connect_to_missing_node_is_not_found() {
    let app = test_app();
    create_door(&app).await;
    let begin = add_node(
        &app,
        "add_event_node",
        json!({ "asset_path": ASSET, "graph": "EventGraph", "event_name": "ReceiveBeginPlay" }),
    )
    .await;

    let ghost = NodeId::new().to_string();
    let (status, body) = call(
        &app,
        "connect_pins",
        json!({
            "asset_path": ASSET, "graph": "EventGraph",
            "from_node": begin, "from_pin": "then",
            "to_node": ghost, "to_pin": "execute"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains(&ghost), "{:?}", body);

    let (status, body) = call(
        &app,
        "connect_pins",
        json!({
            "asset_path": ASSET, "graph": "EventGraph",
            "from_node": begin, "from_pin": "then",
            "to_node": "0xDEADBEEF", "to_pin": "execute"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid 'to_node'"));
}

#[tokio::test]
async fn set_pin_default_updates_literal() {
    let app = test_app();
    create_door(&app).await;
    let print = add_node(
        &app,
        "add_call_function_node",
        json!({ "asset_path": ASSET, "graph": "EventGraph", "function_path": "KismetSystemLibrary:PrintString" }),
    )
    .await;

    call_ok(
        &app,
        "set_pin_default",
        json!({ "asset_path": ASSET, "graph": "EventGraph", "node_guid": print, "pin_name": "InString", "value": "Opened" }),
    )
    .await;

    let (status, _) = call(
        &app,
        "set_pin_default",
        json!({ "asset_path": ASSET, "graph": "EventGraph", "node_guid": print, "pin_name": "Nope", "value": "x" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn function_graph_component_and_input_event() {
    let app = test_app();
    create_door(&app).await;

    call_ok(&app, "add_function_graph", json!({ "asset_path": ASSET, "name": "OpenDoor" })).await;
    let (status, _) = call(&app, "add_function_graph", json!({ "asset_path": ASSET, "name": "EventGraph" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    add_node(
        &app,
        "add_call_function_node",
        json!({ "asset_path": ASSET, "graph": "OpenDoor", "function_path": "Actor:SetActorHiddenInGame" }),
    )
    .await;

    call_ok(
        &app,
        "add_component",
        json!({ "asset_path": ASSET, "component_class": "StaticMeshComponent", "name": "DoorMesh" }),
    )
    .await;
    let (status, _) = call(
        &app,
        "add_component",
        json!({ "asset_path": ASSET, "component_class": "Actor", "name": "NotAComponent" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let jump = add_node(
        &app,
        "add_input_action_event",
        json!({
            "asset_path": ASSET, "graph": "EventGraph",
            "input_action": "/Game/Input/IA_Jump", "trigger_event": "Started"
        }),
    )
    .await;
    let (status, body) = call(
        &app,
        "add_input_action_event",
        json!({
            "asset_path": ASSET, "graph": "EventGraph",
            "input_action": "/Game/Input/IA_Jump", "trigger_event": "Sometimes"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid 'trigger_event'"));

    let structure = call_ok(&app, "get_blueprint_structure", json!({ "asset_path": ASSET })).await;
    let names: Vec<&str> = structure["graphs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["EventGraph", "OpenDoor"]);
    let jump_node = find_node(&structure, "EventGraph", &jump);
    assert_eq!(jump_node["class"], "K2Node_EnhancedInputAction");
    find_pin(jump_node, "Started");

    call_ok(&app, "compile_blueprint", json!({ "asset_path": ASSET })).await;
    call_ok(&app, "save_blueprint", json!({ "asset_path": ASSET })).await;
}

#[tokio::test]
async fn references_between_blueprints() {
    let app = test_app();
    create_door(&app).await;
    call_ok(&app, "add_function_graph", json!({ "asset_path": ASSET, "name": "Open" })).await;
    call_ok(&app, "create_blueprint", json!({ "package_path": "/Game/BP_Switch" })).await;
    add_node(
        &app,
        "add_call_function_node",
        json!({
            "asset_path": "/Game/BP_Switch", "graph": "EventGraph",
            "function_path": "/Game/Blueprints/BP_Door.BP_Door:Open"
        }),
    )
    .await;

    let switch_refs = call_ok(&app, "get_references", json!({ "asset_path": "/Game/BP_Switch" })).await;
    assert!(switch_refs["outgoing"]
        .as_array()
        .unwrap()
        .contains(&json!("/Game/Blueprints/BP_Door")));

    let door_refs = call_ok(&app, "get_references", json!({ "asset_path": ASSET })).await;
    assert_eq!(door_refs["incoming"], json!(["/Game/BP_Switch"]));

    let (status, _) = call(&app, "get_references", json!({ "asset_path": "/Game/Missing" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compile_reports_duplicate_events() {
    let app = test_app();
    create_door(&app).await;
    for _ in 0..2 {
        add_node(
            &app,
            "add_event_node",
            json!({ "asset_path": ASSET, "graph": "EventGraph", "event_name": "ReceiveTick" }),
        )
        .await;
    }
    let (status, body) = call(&app, "compile_blueprint", json!({ "asset_path": ASSET })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Compile failed"));
}

#[tokio::test]
async fn unknown_asset_is_not_found() {
    let app = test_app();
    let (status, body) = call(
        &app,
        "get_blueprint_structure",
        json!({ "asset_path": "/Game/Nowhere/BP_None" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}
