use bpmcp_core::graph::{Graph, GraphKind};
use bpmcp_core::node::{Node, NodeKind, Pin, PinRef, Position};
use bpmcp_core::serialize::serialize;
use bpmcp_core::types::{category, PinType};
use bpmcp_core::{AssetPath, GraphAsset, NodeId};
use proptest::prelude::*;

const PINS: [&str; 4] = ["ExecIn", "ExecOut", "ValueIn", "ValueOut"];

fn mixed_node(i: usize) -> Node {
    Node::new(
        NodeKind::CallFunction {
            function: format!("/Script/Test.Lib:Fn{i}"),
        },
        format!("Fn{i}"),
        Position::new(i as i32 * 200, 0),
        vec![
            Pin::input("ExecIn", PinType::exec()),
            Pin::output("ExecOut", PinType::exec()),
            Pin::input("ValueIn", PinType::new(category::FLOAT)),
            Pin::output("ValueOut", PinType::new(category::FLOAT)),
        ],
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_connect_keeps_links_reciprocal(
        node_count in 2..8usize,
        attempts in proptest::collection::vec((0..8usize, 0..4usize, 0..8usize, 0..4usize), 0..40)
    ) {
        let mut graph = Graph::new("EventGraph", GraphKind::EventGraph);
        let ids: Vec<NodeId> = (0..node_count)
            .map(|i| graph.add_node(mixed_node(i)).unwrap())
            .collect();

        for (a, pa, b, pb) in attempts {
            if a < ids.len() && b < ids.len() {
                // Rejected links must leave the graph untouched.
                let _ = graph.connect(
                    &PinRef::new(ids[a], PINS[pa]),
                    &PinRef::new(ids[b], PINS[pb]),
                );
            }
            prop_assert!(graph.verify_links().is_ok());
        }

        for node in graph.nodes() {
            for pin in &node.pins {
                for peer in &pin.links {
                    let other = graph.node(peer.node).unwrap().pin(&peer.pin).unwrap();
                    prop_assert_ne!(other.direction, pin.direction);
                    prop_assert_ne!(peer.node, node.id);
                    prop_assert!(other.pin_type.is_compatible_with(&pin.pin_type));
                }
            }
        }
    }
}

#[test]
fn serialized_links_match_model_links() {
    let mut asset = GraphAsset::new(AssetPath::parse("/Game/BP_Chain").unwrap(), "/Script/Engine.Actor");
    let graph = asset.require_graph_mut("EventGraph").unwrap();
    let ids: Vec<NodeId> = (0..3).map(|i| graph.add_node(mixed_node(i)).unwrap()).collect();
    for pair in ids.windows(2) {
        graph
            .connect(&PinRef::new(pair[0], "ExecOut"), &PinRef::new(pair[1], "ExecIn"))
            .unwrap();
        graph
            .connect(&PinRef::new(pair[1], "ValueIn"), &PinRef::new(pair[0], "ValueOut"))
            .unwrap();
    }

    let json = serialize(&asset).unwrap();
    let nodes = json["graphs"][0]["nodes"].as_array().unwrap();
    let link_count: usize = nodes
        .iter()
        .flat_map(|n| n["pins"].as_array().unwrap())
        .map(|p| p["linked_to"].as_array().unwrap().len())
        .sum();
    // Two links per neighbouring pair, each recorded on both ends.
    assert_eq!(link_count, 2 * 2 * 2);
}
