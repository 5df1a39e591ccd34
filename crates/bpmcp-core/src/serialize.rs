//! Wire views of a graph asset.
//!
//! [`serialize`] turns a [`GraphAsset`] into the structure JSON returned by
//! `get_blueprint_structure`. The view structs below fix the field names and
//! order; the function itself is pure and never fails on a well-formed asset.
//!
//! Links are only emitted when the peer pin carries the reciprocal record, so a
//! half-written link never reaches a client.

use serde::Serialize;
use serde_json::Value;

use crate::graph::{AssetReferences, Graph, GraphAsset, Variable};
use crate::node::{Node, Pin, PinRef};
use crate::types::PinType;

/// Canonical text form of a pin type.
pub fn describe_type(pin_type: &PinType) -> String {
    pin_type.describe()
}

/// A member variable as it appears on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct VariableView {
    pub name: String,
    #[serde(rename = "type")]
    pub type_desc: String,
    pub is_array: bool,
    pub is_set: bool,
    pub is_map: bool,
}

/// One link endpoint on the far side of a pin.
#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    pub node_id: String,
    pub pin_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PinView {
    pub name: String,
    pub direction: &'static str,
    #[serde(rename = "type")]
    pub type_desc: String,
    pub linked_to: Vec<LinkView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionView {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: String,
    pub class: &'static str,
    pub title: String,
    pub position: PositionView,
    pub pins: Vec<PinView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub name: String,
    pub nodes: Vec<NodeView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferencesView {
    pub outgoing: Vec<String>,
    pub incoming: Vec<String>,
}

impl From<&AssetReferences> for ReferencesView {
    fn from(refs: &AssetReferences) -> Self {
        ReferencesView {
            outgoing: refs.outgoing.iter().cloned().collect(),
            incoming: refs.incoming.iter().cloned().collect(),
        }
    }
}

/// The full structure document.
#[derive(Debug, Clone, Serialize)]
pub struct StructureView {
    pub asset_name: String,
    pub asset_path: String,
    pub variables: Vec<VariableView>,
    pub graphs: Vec<GraphView>,
    pub references: ReferencesView,
}

impl StructureView {
    pub fn from_asset(asset: &GraphAsset) -> Self {
        StructureView {
            asset_name: asset.name().to_string(),
            asset_path: asset.path.object_path(),
            variables: asset.variables().map(variable_view).collect(),
            graphs: asset
                .graphs_in_wire_order()
                .into_iter()
                .map(graph_view)
                .collect(),
            references: ReferencesView::from(&asset.references),
        }
    }
}

fn variable_view(var: &Variable) -> VariableView {
    VariableView {
        name: var.name.clone(),
        type_desc: describe_type(&var.var_type),
        is_array: var.var_type.is_array(),
        is_set: var.var_type.is_set(),
        is_map: var.var_type.is_map(),
    }
}

fn graph_view(graph: &Graph) -> GraphView {
    GraphView {
        name: graph.name.clone(),
        nodes: graph.nodes().map(|n| node_view(graph, n)).collect(),
    }
}

fn node_view(graph: &Graph, node: &Node) -> NodeView {
    NodeView {
        id: node.id.to_string(),
        class: node.kind.class_name(),
        title: node.title.clone(),
        position: PositionView {
            x: node.position.x,
            y: node.position.y,
        },
        pins: node.pins.iter().map(|p| pin_view(graph, node, p)).collect(),
    }
}

fn pin_view(graph: &Graph, node: &Node, pin: &Pin) -> PinView {
    let at = PinRef::new(node.id, pin.name.clone());
    PinView {
        name: pin.name.clone(),
        direction: pin.direction.as_str(),
        type_desc: describe_type(&pin.pin_type),
        linked_to: pin
            .links
            .iter()
            .filter(|peer| graph.has_reciprocal(&at, peer))
            .map(|peer| LinkView {
                node_id: peer.node.to_string(),
                pin_name: peer.pin.clone(),
            })
            .collect(),
    }
}

/// Serializes an asset into the structure JSON document.
pub fn serialize(asset: &GraphAsset) -> Result<Value, serde_json::Error> {
    serde_json::to_value(StructureView::from_asset(asset))
}
