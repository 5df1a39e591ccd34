//! Graphs and graph assets.
//!
//! A [`GraphAsset`] is the unit clients load and mutate by path. It owns its
//! member variables, components and an ordered list of [`Graph`]s. Each graph
//! is an arena of [`Node`]s keyed by [`NodeId`], kept in insertion order so
//! serialization is deterministic.
//!
//! Links live on pins (see [`crate::node`]). [`Graph::connect`] is the only
//! mutation that creates them and always writes both records, so the
//! reciprocal-record invariant holds for every graph built through this API.
//! [`Graph::verify_links`] checks it for graphs that came from elsewhere.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::asset::AssetPath;
use crate::error::{CoreError, NameKind};
use crate::id::NodeId;
use crate::node::{Node, NodeKind, Pin, PinRef, Position};
use crate::types::{PinDirection, PinType};

/// Name of the event graph every new asset starts with.
pub const DEFAULT_EVENT_GRAPH: &str = "EventGraph";

/// Which list of the asset a graph belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphKind {
    /// Top-level event graph (ubergraph page).
    EventGraph,
    Function,
    DelegateSignature,
}

impl GraphKind {
    /// Order in which graphs appear in serialized output.
    fn wire_rank(&self) -> u8 {
        match self {
            GraphKind::EventGraph => 0,
            GraphKind::Function => 1,
            GraphKind::DelegateSignature => 2,
        }
    }

    /// Order in which graphs are searched by name.
    fn lookup_rank(&self) -> u8 {
        match self {
            GraphKind::Function => 0,
            GraphKind::EventGraph => 1,
            GraphKind::DelegateSignature => 2,
        }
    }
}

/// One named collection of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    pub kind: GraphKind,
    nodes: IndexMap<NodeId, Node>,
}

impl Graph {
    pub fn new(name: impl Into<String>, kind: GraphKind) -> Self {
        Graph {
            name: name.into(),
            kind,
            nodes: IndexMap::new(),
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Looks up a node, failing with `NodeNotFound`.
    pub fn require_node(&self, id: NodeId) -> Result<&Node, CoreError> {
        self.nodes.get(&id).ok_or(CoreError::NodeNotFound { id })
    }

    fn require_node_mut(&mut self, id: NodeId) -> Result<&mut Node, CoreError> {
        self.nodes.get_mut(&id).ok_or(CoreError::NodeNotFound { id })
    }

    /// Adds a freshly built node.
    ///
    /// The node must not carry links yet; links are created with
    /// [`Graph::connect`] so both endpoints are recorded.
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, CoreError> {
        if self.nodes.contains_key(&node.id) {
            return Err(CoreError::DuplicateName {
                kind: NameKind::Node,
                name: node.id.to_string(),
            });
        }
        if node.pins.iter().any(Pin::is_linked) {
            return Err(CoreError::GraphInconsistency {
                reason: format!("node '{}' arrived with pre-existing links", node.id),
            });
        }
        let id = node.id;
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Links two pins. Returns `false` if they were already linked.
    ///
    /// The pins may be given in either order; the model checks that they sit
    /// on different nodes, have opposite directions and compatible types.
    pub fn connect(&mut self, a: &PinRef, b: &PinRef) -> Result<bool, CoreError> {
        let already_linked = {
            let pin_a = self.require_node(a.node)?.require_pin(&a.pin)?;
            let pin_b = self.require_node(b.node)?.require_pin(&b.pin)?;

            if a.node == b.node {
                return Err(CoreError::LinkRejected {
                    reason: format!("pins '{}' and '{}' are on the same node", a.pin, b.pin),
                });
            }
            if pin_a.direction == pin_b.direction {
                return Err(CoreError::LinkRejected {
                    reason: format!(
                        "pins '{}' and '{}' are both {} pins",
                        a.pin,
                        b.pin,
                        pin_a.direction.as_str()
                    ),
                });
            }
            let (out_pin, in_pin) = match pin_a.direction {
                PinDirection::Out => (pin_a, pin_b),
                PinDirection::In => (pin_b, pin_a),
            };
            if !out_pin.pin_type.is_compatible_with(&in_pin.pin_type) {
                return Err(CoreError::LinkRejected {
                    reason: format!(
                        "'{}' ({}) is not compatible with '{}' ({})",
                        out_pin.name,
                        out_pin.pin_type.describe(),
                        in_pin.name,
                        in_pin.pin_type.describe()
                    ),
                });
            }
            pin_a.is_linked_to(b)
        };
        if already_linked {
            return Ok(false);
        }

        self.push_link(a, b)?;
        self.push_link(b, a)?;
        Ok(true)
    }

    fn push_link(&mut self, at: &PinRef, peer: &PinRef) -> Result<(), CoreError> {
        let node = self.require_node_mut(at.node)?;
        let node_id = node.id;
        let pin = node.pin_mut(&at.pin).ok_or_else(|| CoreError::PinNotFound {
            node: node_id,
            pin: at.pin.clone(),
        })?;
        if !pin.is_linked_to(peer) {
            pin.links.push(peer.clone());
        }
        Ok(())
    }

    /// Stores a literal default on `pin` of `node`.
    pub fn set_pin_literal(&mut self, node: NodeId, pin: &str, value: &str) -> Result<(), CoreError> {
        self.require_node_mut(node)?.set_pin_literal(pin, value)
    }

    /// Whether the link record `at -> peer` has its reciprocal `peer -> at`.
    pub fn has_reciprocal(&self, at: &PinRef, peer: &PinRef) -> bool {
        self.node(peer.node)
            .and_then(|n| n.pin(&peer.pin))
            .is_some_and(|p| p.is_linked_to(at))
    }

    /// Checks that every link record has a reciprocal record.
    pub fn verify_links(&self) -> Result<(), CoreError> {
        for node in self.nodes.values() {
            for pin in &node.pins {
                let at = PinRef::new(node.id, pin.name.clone());
                for peer in &pin.links {
                    if !self.has_reciprocal(&at, peer) {
                        return Err(CoreError::GraphInconsistency {
                            reason: format!(
                                "link {}.{} -> {}.{} in graph '{}' has no reciprocal record",
                                node.id, pin.name, peer.node, peer.pin, self.name
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// A member variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub var_type: PinType,
}

impl Variable {
    pub fn new(name: impl Into<String>, var_type: PinType) -> Self {
        Variable {
            name: name.into(),
            var_type,
        }
    }
}

/// A component template owned by the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub class: String,
}

/// Package-level dependency edges of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetReferences {
    pub outgoing: BTreeSet<String>,
    pub incoming: BTreeSet<String>,
}

/// Compile state of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssetStatus {
    #[default]
    Dirty,
    UpToDate,
    Error,
}

/// A graph asset: graphs plus the variable set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphAsset {
    pub path: AssetPath,
    pub parent_class: String,
    variables: IndexMap<String, Variable>,
    components: Vec<Component>,
    graphs: Vec<Graph>,
    /// Filled in by the backend when the asset is loaded.
    #[serde(skip)]
    pub references: AssetReferences,
    #[serde(default)]
    pub status: AssetStatus,
}

impl GraphAsset {
    /// Creates an empty asset with the default event graph.
    pub fn new(path: AssetPath, parent_class: impl Into<String>) -> Self {
        GraphAsset {
            path,
            parent_class: parent_class.into(),
            variables: IndexMap::new(),
            components: Vec::new(),
            graphs: vec![Graph::new(DEFAULT_EVENT_GRAPH, GraphKind::EventGraph)],
            references: AssetReferences::default(),
            status: AssetStatus::Dirty,
        }
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    fn check_member_name(&self, kind: NameKind, name: &str) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::EmptyName { kind });
        }
        if self.variables.contains_key(name) || self.components.iter().any(|c| c.name == name) {
            return Err(CoreError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Adds a member variable; names are unique across variables and components.
    pub fn add_variable(&mut self, variable: Variable) -> Result<(), CoreError> {
        self.check_member_name(NameKind::Variable, &variable.name)?;
        self.variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    /// Adds a component template; shares the member namespace with variables.
    pub fn add_component(&mut self, name: &str, class: &str) -> Result<(), CoreError> {
        self.check_member_name(NameKind::Component, name)?;
        self.components.push(Component {
            name: name.to_string(),
            class: class.to_string(),
        });
        Ok(())
    }

    /// All graphs in storage order.
    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    /// Graphs ordered for output: event graphs, functions, delegate signatures.
    pub fn graphs_in_wire_order(&self) -> Vec<&Graph> {
        let mut ordered: Vec<&Graph> = self.graphs.iter().collect();
        ordered.sort_by_key(|g| g.kind.wire_rank());
        ordered
    }

    /// Finds a graph by exact name, searching function graphs first, then
    /// event graphs, then delegate signature graphs.
    pub fn find_graph(&self, name: &str) -> Option<&Graph> {
        self.lookup_index(name).map(|i| &self.graphs[i])
    }

    pub fn find_graph_mut(&mut self, name: &str) -> Option<&mut Graph> {
        self.lookup_index(name).map(move |i| &mut self.graphs[i])
    }

    fn lookup_index(&self, name: &str) -> Option<usize> {
        self.graphs
            .iter()
            .enumerate()
            .filter(|(_, g)| g.name == name)
            .min_by_key(|(_, g)| g.kind.lookup_rank())
            .map(|(i, _)| i)
    }

    /// Looks up a graph, failing with `GraphNotFound`.
    pub fn require_graph(&self, name: &str) -> Result<&Graph, CoreError> {
        self.find_graph(name).ok_or_else(|| CoreError::GraphNotFound {
            name: name.to_string(),
        })
    }

    pub fn require_graph_mut(&mut self, name: &str) -> Result<&mut Graph, CoreError> {
        self.find_graph_mut(name).ok_or_else(|| CoreError::GraphNotFound {
            name: name.to_string(),
        })
    }

    /// Adds a graph; graph names are unique across all kinds.
    pub fn add_graph(&mut self, graph: Graph) -> Result<(), CoreError> {
        if graph.name.trim().is_empty() {
            return Err(CoreError::EmptyName {
                kind: NameKind::Graph,
            });
        }
        if self.graphs.iter().any(|g| g.name == graph.name) {
            return Err(CoreError::DuplicateName {
                kind: NameKind::Graph,
                name: graph.name,
            });
        }
        self.graphs.push(graph);
        Ok(())
    }

    /// Adds a function graph with its entry node. Returns the entry node id.
    pub fn add_function_graph(&mut self, name: &str) -> Result<NodeId, CoreError> {
        let mut graph = Graph::new(name, GraphKind::Function);
        let entry = Node::new(
            NodeKind::FunctionEntry {
                function: name.to_string(),
            },
            name,
            Position::default(),
            vec![Pin::output("then", PinType::exec())],
        )?;
        let entry_id = graph.add_node(entry)?;
        self.add_graph(graph)?;
        Ok(entry_id)
    }

    /// Finds the graph containing `node`.
    pub fn graph_of_node(&self, node: NodeId) -> Option<&Graph> {
        self.graphs.iter().find(|g| g.node(node).is_some())
    }

    /// Checks link symmetry across every graph.
    pub fn verify_links(&self) -> Result<(), CoreError> {
        self.graphs.iter().try_for_each(Graph::verify_links)
    }
}
