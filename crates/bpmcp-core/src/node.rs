//! Nodes and pins.
//!
//! A [`Node`] owns an ordered list of [`Pin`]s. Pins are addressed by name
//! within their node; links are stored redundantly on both endpoint pins as
//! [`PinRef`]s. The node's behavior is a closed [`NodeKind`] variant with a
//! per-variant payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{CoreError, NameKind};
use crate::id::NodeId;
use crate::types::{PinDirection, PinType};

/// Reference to a pin on another node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    pub node: NodeId,
    pub pin: String,
}

impl PinRef {
    pub fn new(node: NodeId, pin: impl Into<String>) -> Self {
        PinRef {
            node,
            pin: pin.into(),
        }
    }
}

/// A typed input or output slot on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    pub direction: PinDirection,
    pub pin_type: PinType,
    /// Literal default; only meaningful on an unconnected input pin.
    #[serde(default)]
    pub default_value: String,
    /// Peers this pin is linked to, in link order.
    #[serde(default)]
    pub links: SmallVec<[PinRef; 2]>,
}

impl Pin {
    pub fn input(name: impl Into<String>, pin_type: PinType) -> Self {
        Pin {
            name: name.into(),
            direction: PinDirection::In,
            pin_type,
            default_value: String::new(),
            links: SmallVec::new(),
        }
    }

    pub fn output(name: impl Into<String>, pin_type: PinType) -> Self {
        Pin {
            name: name.into(),
            direction: PinDirection::Out,
            pin_type,
            default_value: String::new(),
            links: SmallVec::new(),
        }
    }

    /// Sets the initial literal (builder style, used when allocating pins).
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn is_linked(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn is_linked_to(&self, peer: &PinRef) -> bool {
        self.links.iter().any(|l| l == peer)
    }
}

/// Enhanced-input trigger phases an input action event can fire on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerEvent {
    Triggered,
    Started,
    Ongoing,
    Canceled,
    Completed,
}

impl TriggerEvent {
    pub const ALL: [TriggerEvent; 5] = [
        TriggerEvent::Triggered,
        TriggerEvent::Started,
        TriggerEvent::Ongoing,
        TriggerEvent::Canceled,
        TriggerEvent::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEvent::Triggered => "Triggered",
            TriggerEvent::Started => "Started",
            TriggerEvent::Ongoing => "Ongoing",
            TriggerEvent::Canceled => "Canceled",
            TriggerEvent::Completed => "Completed",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerEvent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriggerEvent::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// What a node does, with per-variant identity payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Calls a function, `Owner:Function`.
    CallFunction { function: String },
    /// Entry point for an engine or custom event.
    Event { event: String, custom: bool },
    /// Fires when an input action reaches a trigger phase.
    InputActionEvent {
        input_action: String,
        trigger: TriggerEvent,
    },
    /// Entry node of a function graph.
    FunctionEntry { function: String },
}

impl NodeKind {
    /// Editor node class name reported on the wire.
    pub fn class_name(&self) -> &'static str {
        match self {
            NodeKind::CallFunction { .. } => "K2Node_CallFunction",
            NodeKind::Event { .. } => "K2Node_Event",
            NodeKind::InputActionEvent { .. } => "K2Node_EnhancedInputAction",
            NodeKind::FunctionEntry { .. } => "K2Node_FunctionEntry",
        }
    }
}

/// Node placement in graph space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Converts client coordinates, truncating toward zero and saturating.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Position {
            x: x as i32,
            y: y as i32,
        }
    }
}

/// A unit of behavior in a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub title: String,
    pub position: Position,
    pub pins: Vec<Pin>,
}

impl Node {
    /// Creates a node with a fresh id.
    ///
    /// Fails with `DuplicateName` if two pins share a name.
    pub fn new(
        kind: NodeKind,
        title: impl Into<String>,
        position: Position,
        pins: Vec<Pin>,
    ) -> Result<Self, CoreError> {
        Node::with_id(NodeId::new(), kind, title, position, pins)
    }

    /// Creates a node with a caller-chosen id.
    pub fn with_id(
        id: NodeId,
        kind: NodeKind,
        title: impl Into<String>,
        position: Position,
        pins: Vec<Pin>,
    ) -> Result<Self, CoreError> {
        for (i, pin) in pins.iter().enumerate() {
            if pin.name.is_empty() {
                return Err(CoreError::EmptyName {
                    kind: NameKind::Pin,
                });
            }
            if pins[..i].iter().any(|p| p.name == pin.name) {
                return Err(CoreError::DuplicateName {
                    kind: NameKind::Pin,
                    name: pin.name.clone(),
                });
            }
        }
        Ok(Node {
            id,
            kind,
            title: title.into(),
            position,
            pins,
        })
    }

    pub fn pin(&self, name: &str) -> Option<&Pin> {
        self.pins.iter().find(|p| p.name == name)
    }

    pub fn pin_mut(&mut self, name: &str) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.name == name)
    }

    /// Looks up a pin, failing with `PinNotFound`.
    pub fn require_pin(&self, name: &str) -> Result<&Pin, CoreError> {
        self.pin(name).ok_or_else(|| CoreError::PinNotFound {
            node: self.id,
            pin: name.to_string(),
        })
    }

    /// Stores a literal default on an input pin.
    ///
    /// Only unconnected, non-exec input pins accept literals; anything else
    /// would be a write with no observable effect.
    pub fn set_pin_literal(&mut self, pin_name: &str, value: &str) -> Result<(), CoreError> {
        let node = self.id;
        let pin = self.pin_mut(pin_name).ok_or_else(|| CoreError::PinNotFound {
            node,
            pin: pin_name.to_string(),
        })?;
        let reject = |reason: &str| CoreError::LiteralRejected {
            pin: pin_name.to_string(),
            reason: reason.to_string(),
        };
        if pin.direction != PinDirection::In {
            return Err(reject("output pins carry no default"));
        }
        if pin.pin_type.is_exec() {
            return Err(reject("exec pins carry no default"));
        }
        if pin.is_linked() {
            return Err(reject("pin is linked; break the link first"));
        }
        pin.default_value = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::category;

    fn sample_node() -> Node {
        Node::new(
            NodeKind::CallFunction {
                function: "/Script/Engine.KismetSystemLibrary:PrintString".to_string(),
            },
            "Print String",
            Position::new(10, 20),
            vec![
                Pin::input("execute", PinType::exec()),
                Pin::output("then", PinType::exec()),
                Pin::input("InString", PinType::new(category::STRING)).with_default("Hello"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn duplicate_pin_names_rejected() {
        let err = Node::new(
            NodeKind::Event {
                event: "ReceiveBeginPlay".to_string(),
                custom: false,
            },
            "Event BeginPlay",
            Position::default(),
            vec![
                Pin::output("then", PinType::exec()),
                Pin::output("then", PinType::exec()),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::DuplicateName {
                kind: NameKind::Pin,
                name: "then".to_string()
            }
        );
    }

    #[test]
    fn literal_on_unlinked_input() {
        let mut node = sample_node();
        node.set_pin_literal("InString", "Hi").unwrap();
        assert_eq!(node.pin("InString").unwrap().default_value, "Hi");
    }

    #[test]
    fn literal_rejected_on_output_exec_and_linked() {
        let mut node = sample_node();
        assert!(matches!(
            node.set_pin_literal("then", "x"),
            Err(CoreError::LiteralRejected { .. })
        ));
        assert!(matches!(
            node.set_pin_literal("execute", "x"),
            Err(CoreError::LiteralRejected { .. })
        ));

        let peer = PinRef::new(NodeId::new(), "ReturnValue");
        node.pin_mut("InString").unwrap().links.push(peer);
        assert!(matches!(
            node.set_pin_literal("InString", "x"),
            Err(CoreError::LiteralRejected { .. })
        ));
        assert_eq!(node.pin("InString").unwrap().default_value, "Hello");
    }

    #[test]
    fn literal_on_missing_pin() {
        let mut node = sample_node();
        let err = node.set_pin_literal("Nope", "x").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn trigger_event_parses_case_insensitively() {
        assert_eq!("completed".parse::<TriggerEvent>(), Ok(TriggerEvent::Completed));
        assert!("Pressed".parse::<TriggerEvent>().is_err());
    }

    #[test]
    fn position_from_f64_truncates() {
        assert_eq!(Position::from_f64(12.9, -3.7), Position::new(12, -3));
    }
}
