//! Asset compilation checks.
//!
//! [`check_asset`] walks every graph and collects human-readable problems.
//! An empty list means the asset compiles. The caller decides how call
//! targets resolve, since blueprint functions live in other assets.

use std::collections::HashMap;

use bpmcp_core::{Graph, GraphAsset, GraphKind, NodeKind, PinDirection, PinRef};

/// Returns every problem found in `asset`.
pub fn check_asset<F>(asset: &GraphAsset, resolves_function: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let mut problems = Vec::new();
    let mut events: HashMap<String, usize> = HashMap::new();

    for graph in asset.graphs() {
        check_links(graph, &mut problems);

        let mut entries = 0usize;
        for node in graph.nodes() {
            match &node.kind {
                NodeKind::CallFunction { function } => {
                    if !resolves_function(function) {
                        problems.push(format!(
                            "Node '{}' in graph '{}' calls unknown function '{}'",
                            node.title, graph.name, function
                        ));
                    }
                }
                NodeKind::Event { event, .. } => {
                    *events.entry(event.clone()).or_default() += 1;
                }
                NodeKind::InputActionEvent {
                    input_action,
                    trigger,
                } => {
                    *events
                        .entry(format!("{input_action} ({trigger})"))
                        .or_default() += 1;
                }
                NodeKind::FunctionEntry { .. } => entries += 1,
            }
        }

        if graph.kind == GraphKind::Function && entries != 1 {
            problems.push(format!(
                "Function graph '{}' has {} entry nodes; expected exactly one",
                graph.name, entries
            ));
        }
    }

    let mut duplicated: Vec<_> = events.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicated.sort();
    for (event, count) in duplicated {
        problems.push(format!("Event '{event}' is implemented {count} times"));
    }

    problems
}

fn check_links(graph: &Graph, problems: &mut Vec<String>) {
    for node in graph.nodes() {
        for pin in &node.pins {
            let at = PinRef::new(node.id, pin.name.clone());
            for peer in &pin.links {
                let Some(other) = graph.node(peer.node).and_then(|n| n.pin(&peer.pin)) else {
                    problems.push(format!(
                        "Pin '{}' on '{}' links to a missing pin '{}'",
                        pin.name, node.title, peer.pin
                    ));
                    continue;
                };
                if !graph.has_reciprocal(&at, peer) {
                    problems.push(format!(
                        "Link from '{}'.'{}' to '{}' is one-sided",
                        node.title, pin.name, peer.pin
                    ));
                }
                // Report each link once, from its output side.
                if pin.direction == PinDirection::Out
                    && (other.direction != PinDirection::In
                        || !pin.pin_type.is_compatible_with(&other.pin_type))
                {
                    problems.push(format!(
                        "Link from '{}'.'{}' ({}) to '{}' ({}) has incompatible types",
                        node.title,
                        pin.name,
                        pin.pin_type.describe(),
                        other.name,
                        other.pin_type.describe()
                    ));
                }
            }
        }
    }
}
