//! Mutating action types.
//!
//! Node-creating actions take optional `x`/`y` coordinates; nodes without
//! them are placed at the origin. Variable types are accepted either as a
//! descriptor object or as the describe string (`object:/Script/Engine.Actor[]`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bpmcp_core::{NodeId, PinRef, PinType, Position};

use crate::error::ActionError;

/// `create_blueprint` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlueprintRequest {
    pub package_path: String,
    #[serde(default)]
    pub parent_class: Option<String>,
}

/// A type descriptor as sent by clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeParam {
    Text(String),
    Descriptor(TypeDescriptor),
}

/// Container flags that are absent or null count as false.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDescriptor {
    pub category: String,
    #[serde(default, alias = "subcategory")]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub is_array: Option<bool>,
    #[serde(default)]
    pub is_set: Option<bool>,
    #[serde(default)]
    pub is_map: Option<bool>,
}

impl TypeParam {
    /// Decodes the raw `type` parameter, reporting failures against `type`.
    pub fn from_value(value: &Value) -> Result<Self, ActionError> {
        TypeParam::deserialize(value)
            .map_err(|_| ActionError::invalid("type", "expected a type object or type string"))
    }

    pub fn to_pin_type(&self) -> Result<PinType, ActionError> {
        let parsed = match self {
            TypeParam::Text(text) => PinType::parse(text),
            TypeParam::Descriptor(d) => PinType::from_parts(
                &d.category,
                d.sub_category.as_deref(),
                d.is_array.unwrap_or(false),
                d.is_set.unwrap_or(false),
                d.is_map.unwrap_or(false),
            ),
        };
        parsed.map_err(|e| ActionError::invalid("type", e.to_string()))
    }
}

/// `add_variable` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddVariableRequest {
    pub asset_path: String,
    pub name: String,
    /// Decoded separately through [`TypeParam::from_value`].
    #[serde(rename = "type")]
    pub var_type: Value,
}

impl AddVariableRequest {
    pub fn pin_type(&self) -> Result<PinType, ActionError> {
        TypeParam::from_value(&self.var_type)?.to_pin_type()
    }
}

/// `add_function_graph` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddFunctionGraphRequest {
    pub asset_path: String,
    pub name: String,
}

fn position(x: Option<f64>, y: Option<f64>) -> Position {
    Position::from_f64(x.unwrap_or(0.0), y.unwrap_or(0.0))
}

/// `add_call_function_node` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCallFunctionNodeRequest {
    pub asset_path: String,
    pub graph: String,
    pub function_path: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl AddCallFunctionNodeRequest {
    pub fn position(&self) -> Position {
        position(self.x, self.y)
    }
}

/// `add_event_node` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddEventNodeRequest {
    pub asset_path: String,
    pub graph: String,
    pub event_name: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl AddEventNodeRequest {
    pub fn position(&self) -> Position {
        position(self.x, self.y)
    }
}

/// `add_input_action_event` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddInputActionEventRequest {
    pub asset_path: String,
    pub graph: String,
    pub input_action: String,
    pub trigger_event: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl AddInputActionEventRequest {
    pub fn position(&self) -> Position {
        position(self.x, self.y)
    }
}

/// `add_component` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddComponentRequest {
    pub asset_path: String,
    pub component_class: String,
    pub name: String,
}

/// Parses a node handle, naming the offending field on failure.
pub fn node_id(field: &str, token: &str) -> Result<NodeId, ActionError> {
    NodeId::parse(token).map_err(|e| ActionError::invalid(field, e.to_string()))
}

/// `set_pin_default` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPinDefaultRequest {
    pub asset_path: String,
    pub graph: String,
    pub node_guid: String,
    pub pin_name: String,
    pub value: String,
}

/// `connect_pins` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectPinsRequest {
    pub asset_path: String,
    pub graph: String,
    pub from_node: String,
    pub from_pin: String,
    pub to_node: String,
    pub to_pin: String,
}

impl ConnectPinsRequest {
    pub fn endpoints(&self) -> Result<(PinRef, PinRef), ActionError> {
        let from = PinRef::new(node_id("from_node", &self.from_node)?, self.from_pin.clone());
        let to = PinRef::new(node_id("to_node", &self.to_node)?, self.to_pin.clone());
        Ok((from, to))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        StatusResponse { status: "ok" }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeCreatedResponse {
    pub node_guid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    pub asset_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn type_param(value: Value) -> TypeParam {
        TypeParam::from_value(&value).unwrap()
    }

    #[test]
    fn type_object_and_string_agree() {
        let a = type_param(json!({"category": "object", "sub_category": "/Script/Engine.Actor", "is_array": true}))
            .to_pin_type()
            .unwrap();
        let b = type_param(json!("object:/Script/Engine.Actor[]"))
            .to_pin_type()
            .unwrap();
        assert_eq!(a, b);
        assert!(a.is_array());
    }

    #[test]
    fn conflicting_container_flags() {
        let err = type_param(json!({"category": "int", "is_array": true, "is_set": true}))
            .to_pin_type()
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { ref name, .. } if name == "type"));
    }

    #[test]
    fn malformed_type_names_type_field() {
        for bad in [json!({"category": 5}), json!(12), json!({"sub_category": "x"})] {
            let err = TypeParam::from_value(&bad).unwrap_err();
            assert!(matches!(err, ActionError::InvalidParameter { ref name, .. } if name == "type"));
            assert!(!err.to_string().contains("untagged"));
        }
    }

    #[test]
    fn null_container_flags_are_false() {
        let t = type_param(json!({"category": "int", "is_array": null, "is_set": null}))
            .to_pin_type()
            .unwrap();
        assert!(!t.is_array());
        assert_eq!(t, PinType::parse("int").unwrap());
    }

    #[test]
    fn bad_guid_names_field() {
        let req = ConnectPinsRequest {
            asset_path: "/Game/BP".into(),
            graph: "EventGraph".into(),
            from_node: NodeId::new().to_string(),
            from_pin: "then".into(),
            to_node: "not-a-guid".into(),
            to_pin: "execute".into(),
        };
        let err = req.endpoints().unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { ref name, .. } if name == "to_node"));
    }

    #[test]
    fn missing_coordinates_default_to_origin() {
        let req: AddEventNodeRequest = serde_json::from_value(json!({
            "asset_path": "/Game/BP", "graph": "EventGraph", "event_name": "ReceiveBeginPlay", "x": 12.9
        }))
        .unwrap();
        assert_eq!(req.position(), Position::new(12, 0));
    }
}
