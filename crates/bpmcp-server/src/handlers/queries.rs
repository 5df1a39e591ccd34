//! Read-only action handlers. These run on the calling thread.

use serde_json::Value;

use bpmcp_core::serialize::{serialize, ReferencesView};

use crate::dispatch::{ActionContext, Params};
use crate::error::ActionError;
use crate::schema::queries::{AssetRequest, ListBlueprintsRequest, ListBlueprintsResponse};
use crate::schema::{parse, reply};

/// `list_blueprints`
pub fn list_blueprints(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: ListBlueprintsRequest = parse(params)?;
    let roots = req.paths.unwrap_or_default();
    let blueprints = ctx.backend.list_assets(&roots)?;
    ctx.sink.log(format!("Listed {} blueprints.", blueprints.len()));
    reply(&ListBlueprintsResponse { blueprints })
}

/// `get_blueprint_structure`
pub fn get_blueprint_structure(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AssetRequest = parse(params)?;
    let asset = ctx.backend.load_asset(&req.asset_path)?;
    let structure = serialize(&asset).map_err(|e| ActionError::Internal(e.to_string()))?;
    ctx.sink
        .log(format!("Exported structure for '{}'.", asset.path.object_path()));
    Ok(structure)
}

/// `get_references`
pub fn get_references(ctx: &ActionContext, params: &Params) -> Result<Value, ActionError> {
    let req: AssetRequest = parse(params)?;
    let refs = ctx.backend.references(&req.asset_path)?;
    ctx.sink
        .log(format!("Fetched references for '{}'.", req.asset_path));
    reply(&ReferencesView::from(&refs))
}
