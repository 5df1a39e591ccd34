//! Package reference graph.
//!
//! Each asset depends on the packages of its parent class, call targets,
//! component classes, bound input actions and object-typed variables. The
//! [`ReferenceGraph`] holds those edges as a petgraph digraph so both
//! directions (dependencies and referencers) come from one structure.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use bpmcp_core::types::category;
use bpmcp_core::{AssetReferences, GraphAsset, NodeKind};

/// Package part of a class, object or function path.
///
/// `/Script/Engine.Actor` -> `/Script/Engine`,
/// `/Game/BP_Door.BP_Door:Open` -> `/Game/BP_Door`.
pub fn package_of(path: &str) -> &str {
    let path = path.split_once(':').map_or(path, |(owner, _)| owner);
    path.split_once('.').map_or(path, |(package, _)| package)
}

/// Packages `asset` depends on, excluding its own.
pub fn dependencies(asset: &GraphAsset) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    deps.insert(package_of(&asset.parent_class).to_string());

    for component in asset.components() {
        deps.insert(package_of(&component.class).to_string());
    }
    for var in asset.variables() {
        let ty = &var.var_type;
        if ty.category == category::OBJECT || ty.category == category::CLASS {
            if let Some(sub) = &ty.sub_category {
                deps.insert(package_of(sub).to_string());
            }
        }
    }
    for graph in asset.graphs() {
        for node in graph.nodes() {
            match &node.kind {
                NodeKind::CallFunction { function } => {
                    deps.insert(package_of(function).to_string());
                }
                NodeKind::InputActionEvent { input_action, .. } => {
                    deps.insert(package_of(input_action).to_string());
                }
                NodeKind::Event { .. } | NodeKind::FunctionEntry { .. } => {}
            }
        }
    }

    deps.remove(asset.path.package());
    deps.retain(|d| !d.is_empty());
    deps
}

/// Directed package graph: an edge `a -> b` means `a` depends on `b`.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl ReferenceGraph {
    /// Builds the graph from `(package, dependencies)` pairs.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, BTreeSet<String>)>,
    {
        let mut refs = ReferenceGraph::default();
        for (package, deps) in entries {
            let from = refs.intern(&package);
            for dep in deps {
                let to = refs.intern(&dep);
                refs.graph.update_edge(from, to, ());
            }
        }
        refs
    }

    fn intern(&mut self, package: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(package) {
            return *idx;
        }
        let idx = self.graph.add_node(package.to_string());
        self.index.insert(package.to_string(), idx);
        idx
    }

    fn neighbors(&self, package: &str, dir: Direction) -> BTreeSet<String> {
        match self.index.get(package) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, dir)
                .map(|n| self.graph[n].clone())
                .collect(),
            None => BTreeSet::new(),
        }
    }

    /// Packages `package` depends on.
    pub fn outgoing(&self, package: &str) -> BTreeSet<String> {
        self.neighbors(package, Direction::Outgoing)
    }

    /// Packages that depend on `package`.
    pub fn incoming(&self, package: &str) -> BTreeSet<String> {
        self.neighbors(package, Direction::Incoming)
    }

    pub fn references(&self, package: &str) -> AssetReferences {
        AssetReferences {
            outgoing: self.outgoing(package),
            incoming: self.incoming(package),
        }
    }
}
