//! Mutating action handlers.
//!
//! The dispatcher only calls these on the owner context, after the write
//! gate. Each one logs a detail line on success.

use serde_json::Value;

use bpmcp_core::TriggerEvent;

use crate::dispatch::{ActionContext, Params};
use crate::error::ActionError;
use crate::schema::mutations::{
    node_id, AddCallFunctionNodeRequest, AddComponentRequest, AddEventNodeRequest,
    AddFunctionGraphRequest, AddInputActionEventRequest, AddVariableRequest, ConnectPinsRequest,
    CreateBlueprintRequest, CreatedResponse, NodeCreatedResponse, SetPinDefaultRequest,
    StatusResponse,
};
use crate::schema::queries::AssetRequest;
use crate::schema::{parse, reply};

fn ok() -> Result<Value, ActionError> {
    reply(&StatusResponse::ok())
}

/// `create_blueprint`
pub fn create_blueprint(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: CreateBlueprintRequest = parse(params)?;
    let result = ctx
        .backend
        .create_asset(&req.package_path, req.parent_class.as_deref());
    if !result.success {
        return Err(ActionError::Rejected(result.error));
    }
    ctx.sink
        .log(format!("Created Blueprint '{}'.", result.asset_path));
    reply(&CreatedResponse {
        asset_path: result.asset_path,
    })
}

/// `add_variable`
pub fn add_variable(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AddVariableRequest = parse(params)?;
    let var_type = req.pin_type()?;
    ctx.backend
        .add_variable(&req.asset_path, &req.name, var_type)?;
    ctx.sink
        .log(format!("Added variable '{}' to '{}'.", req.name, req.asset_path));
    ok()
}

/// `add_function_graph`
pub fn add_function_graph(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AddFunctionGraphRequest = parse(params)?;
    ctx.backend.add_function_graph(&req.asset_path, &req.name)?;
    ctx.sink.log(format!(
        "Added function graph '{}' to '{}'.",
        req.name, req.asset_path
    ));
    ok()
}

/// `add_call_function_node`
pub fn add_call_function_node(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AddCallFunctionNodeRequest = parse(params)?;
    let id = ctx.backend.add_call_function_node(
        &req.asset_path,
        &req.graph,
        &req.function_path,
        req.position(),
    )?;
    ctx.sink.log(format!(
        "Added call node '{}' to graph '{}'.",
        req.function_path, req.graph
    ));
    reply(&NodeCreatedResponse {
        node_guid: id.to_string(),
    })
}

/// `add_event_node`
pub fn add_event_node(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AddEventNodeRequest = parse(params)?;
    let id = ctx
        .backend
        .add_event_node(&req.asset_path, &req.graph, &req.event_name, req.position())?;
    ctx.sink.log(format!(
        "Added event '{}' to graph '{}'.",
        req.event_name, req.graph
    ));
    reply(&NodeCreatedResponse {
        node_guid: id.to_string(),
    })
}

/// `add_input_action_event`
pub fn add_input_action_event(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AddInputActionEventRequest = parse(params)?;
    let trigger: TriggerEvent = req.trigger_event.parse().map_err(|_| {
        let allowed: Vec<&str> = TriggerEvent::ALL.iter().map(|t| t.as_str()).collect();
        ActionError::invalid("trigger_event", format!("expected one of {}", allowed.join(", ")))
    })?;
    let id = ctx.backend.add_input_action_event(
        &req.asset_path,
        &req.graph,
        &req.input_action,
        trigger,
        req.position(),
    )?;
    ctx.sink.log(format!(
        "Added input action '{}' to graph '{}'.",
        req.input_action, req.graph
    ));
    reply(&NodeCreatedResponse {
        node_guid: id.to_string(),
    })
}

/// `add_component`
pub fn add_component(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AddComponentRequest = parse(params)?;
    ctx.backend
        .add_component(&req.asset_path, &req.component_class, &req.name)?;
    ctx.sink
        .log(format!("Added component '{}' to '{}'.", req.name, req.asset_path));
    ok()
}

/// `set_pin_default`
pub fn set_pin_default(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: SetPinDefaultRequest = parse(params)?;
    let node = node_id("node_guid", &req.node_guid)?;
    ctx.backend
        .set_pin_literal(&req.asset_path, &req.graph, node, &req.pin_name, &req.value)?;
    ctx.sink
        .log(format!("Set pin default {} on node {}", req.pin_name, node));
    ok()
}

/// `connect_pins`
pub fn connect_pins(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: ConnectPinsRequest = parse(params)?;
    let (from, to) = req.endpoints()?;
    ctx.backend
        .connect_pins(&req.asset_path, &req.graph, &from, &to)?;
    ctx.sink.log(format!(
        "Connected pins {}:{} -> {}:{}",
        from.node, from.pin, to.node, to.pin
    ));
    ok()
}

/// `compile_blueprint`
pub fn compile_blueprint(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AssetRequest = parse(params)?;
    ctx.backend.compile(&req.asset_path)?;
    ctx.sink.log(format!("Compiled Blueprint '{}'.", req.asset_path));
    ok()
}

/// `save_blueprint`
pub fn save_blueprint(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AssetRequest = parse(params)?;
    ctx.backend.save(&req.asset_path)?;
    ctx.sink.log(format!("Saved Blueprint '{}'.", req.asset_path));
    ok()
}
