//! Read-only action types.

use serde::{Deserialize, Serialize};

/// `list_blueprints` parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBlueprintsRequest {
    /// Roots to search under; all assets when absent or empty.
    #[serde(default)]
    pub paths: Option<Vec<String>>,
}

/// Parameters of every action addressing a single asset.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRequest {
    pub asset_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListBlueprintsResponse {
    pub blueprints: Vec<String>,
}
