//! Built-in class, function, event and input-action catalog.
//!
//! The reference backend has no engine behind it, so everything a node can
//! refer to is listed here. The catalog also knows how to lay out the pins of
//! each node kind it describes.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use bpmcp_core::types::category;
use bpmcp_core::{AssetPath, Pin, PinType, TriggerEvent};

use crate::error::BackendError;

pub const OBJECT_CLASS: &str = "/Script/CoreUObject.Object";
pub const ACTOR_CLASS: &str = "/Script/Engine.Actor";
pub const ACTOR_COMPONENT_CLASS: &str = "/Script/Engine.ActorComponent";
const INPUT_ACTION_CLASS: &str = "/Script/EnhancedInput.InputAction";

/// A native class known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub path: String,
    pub parent: Option<String>,
}

impl ClassInfo {
    /// Short class name, e.g. `Actor` for `/Script/Engine.Actor`.
    pub fn short_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

/// One input parameter of a callable function or event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub pin_type: PinType,
    pub default: String,
}

impl ParamSpec {
    fn new(name: &str, pin_type: PinType, default: &str) -> Self {
        ParamSpec {
            name: name.to_string(),
            pin_type,
            default: default.to_string(),
        }
    }
}

/// A callable function: `owner:name` plus its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub owner: String,
    pub name: String,
    pub title: String,
    pub params: Vec<ParamSpec>,
    pub return_type: Option<PinType>,
    /// Pure functions have no exec pins.
    pub pure: bool,
    /// Member functions take a `self` target pin.
    pub member: bool,
}

impl FunctionSignature {
    /// The `Owner:Function` path of this function.
    pub fn path(&self) -> String {
        format!("{}:{}", self.owner, self.name)
    }

    /// Pins of a call node for this function.
    pub fn pins(&self) -> Vec<Pin> {
        let mut pins = Vec::with_capacity(self.params.len() + 4);
        if !self.pure {
            pins.push(Pin::input("execute", PinType::exec()));
            pins.push(Pin::output("then", PinType::exec()));
        }
        if self.member {
            pins.push(Pin::input("self", PinType::object(self.owner.clone())));
        }
        for param in &self.params {
            pins.push(Pin::input(param.name.clone(), param.pin_type.clone()).with_default(&param.default));
        }
        if let Some(ret) = &self.return_type {
            pins.push(Pin::output("ReturnValue", ret.clone()));
        }
        pins
    }
}

/// An engine event that can be implemented in an event graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSignature {
    pub name: String,
    pub title: String,
    /// Output parameters carried by the event.
    pub params: Vec<ParamSpec>,
}

/// Pins shared by every event node, followed by the event's parameters.
pub fn event_pins(params: &[ParamSpec]) -> Vec<Pin> {
    let mut pins = vec![
        Pin::output("OutputDelegate", PinType::new(category::DELEGATE)),
        Pin::output("then", PinType::exec()),
    ];
    pins.extend(
        params
            .iter()
            .map(|p| Pin::output(p.name.clone(), p.pin_type.clone())),
    );
    pins
}

/// Pins of an enhanced-input action event for one trigger phase.
pub fn input_action_pins(value_type: &PinType, trigger: TriggerEvent) -> Vec<Pin> {
    vec![
        Pin::output(trigger.as_str(), PinType::exec()),
        Pin::output("ActionValue", value_type.clone()),
        Pin::output("ElapsedSeconds", PinType::new(category::FLOAT)),
        Pin::output("TriggeredSeconds", PinType::new(category::FLOAT)),
        Pin::output("InputAction", PinType::object(INPUT_ACTION_CLASS)),
    ]
}

/// Everything nodes and assets can refer to without another asset.
#[derive(Debug, Clone)]
pub struct Catalog {
    classes: IndexMap<String, ClassInfo>,
    functions: IndexMap<String, FunctionSignature>,
    events: IndexMap<String, EventSignature>,
    /// Input action package name -> action value type.
    input_actions: BTreeMap<String, PinType>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}

impl Catalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        Catalog {
            classes: IndexMap::new(),
            functions: IndexMap::new(),
            events: IndexMap::new(),
            input_actions: BTreeMap::new(),
        }
    }

    /// The default engine-like catalog.
    pub fn builtin() -> Self {
        let mut c = Catalog::empty();

        for (path, parent) in [
            (OBJECT_CLASS, None),
            (ACTOR_CLASS, Some(OBJECT_CLASS)),
            ("/Script/Engine.Pawn", Some(ACTOR_CLASS)),
            ("/Script/Engine.Character", Some("/Script/Engine.Pawn")),
            (ACTOR_COMPONENT_CLASS, Some(OBJECT_CLASS)),
            ("/Script/Engine.SceneComponent", Some(ACTOR_COMPONENT_CLASS)),
            ("/Script/Engine.PrimitiveComponent", Some("/Script/Engine.SceneComponent")),
            ("/Script/Engine.StaticMeshComponent", Some("/Script/Engine.PrimitiveComponent")),
            ("/Script/Engine.KismetSystemLibrary", Some(OBJECT_CLASS)),
            ("/Script/Engine.KismetMathLibrary", Some(OBJECT_CLASS)),
        ] {
            c.add_class(path, parent);
        }

        let float = || PinType::new(category::FLOAT);
        let boolean = || PinType::new(category::BOOL);

        c.add_function(FunctionSignature {
            owner: "/Script/Engine.KismetSystemLibrary".into(),
            name: "PrintString".into(),
            title: "Print String".into(),
            params: vec![
                ParamSpec::new("InString", PinType::new(category::STRING), "Hello"),
                ParamSpec::new("bPrintToScreen", boolean(), "true"),
                ParamSpec::new("bPrintToLog", boolean(), "true"),
                ParamSpec::new("Duration", float(), "2.0"),
            ],
            return_type: None,
            pure: false,
            member: false,
        });
        c.add_function(FunctionSignature {
            owner: "/Script/Engine.KismetSystemLibrary".into(),
            name: "Delay".into(),
            title: "Delay".into(),
            params: vec![ParamSpec::new("Duration", float(), "0.2")],
            return_type: None,
            pure: false,
            member: false,
        });
        c.add_function(FunctionSignature {
            owner: "/Script/Engine.KismetMathLibrary".into(),
            name: "Add_FloatFloat".into(),
            title: "Add (Float)".into(),
            params: vec![
                ParamSpec::new("A", float(), "0.0"),
                ParamSpec::new("B", float(), "0.0"),
            ],
            return_type: Some(float()),
            pure: true,
            member: false,
        });
        c.add_function(FunctionSignature {
            owner: ACTOR_CLASS.into(),
            name: "K2_GetActorLocation".into(),
            title: "Get Actor Location".into(),
            params: vec![],
            return_type: Some(PinType::with_sub(category::STRUCT, "/Script/CoreUObject.Vector")),
            pure: true,
            member: true,
        });
        c.add_function(FunctionSignature {
            owner: ACTOR_CLASS.into(),
            name: "K2_DestroyActor".into(),
            title: "Destroy Actor".into(),
            params: vec![],
            return_type: None,
            pure: false,
            member: true,
        });
        c.add_function(FunctionSignature {
            owner: ACTOR_CLASS.into(),
            name: "SetActorHiddenInGame".into(),
            title: "Set Actor Hidden In Game".into(),
            params: vec![ParamSpec::new("bNewHidden", boolean(), "false")],
            return_type: None,
            pure: false,
            member: true,
        });

        c.add_event("ReceiveBeginPlay", "Event BeginPlay", vec![]);
        c.add_event(
            "ReceiveTick",
            "Event Tick",
            vec![ParamSpec::new("DeltaSeconds", float(), "")],
        );
        c.add_event(
            "ReceiveEndPlay",
            "Event End Play",
            vec![ParamSpec::new(
                "EndPlayReason",
                PinType::with_sub(category::BYTE, "/Script/Engine.EEndPlayReason"),
                "",
            )],
        );
        c.add_event(
            "ReceiveActorBeginOverlap",
            "Event ActorBeginOverlap",
            vec![ParamSpec::new("OtherActor", PinType::object(ACTOR_CLASS), "")],
        );

        let axis2d = || PinType::with_sub(category::STRUCT, "/Script/CoreUObject.Vector2D");
        for (path, value_type) in [
            ("/Game/Input/IA_Jump", boolean()),
            ("/Game/Input/IA_Move", axis2d()),
            ("/Game/Input/IA_Look", axis2d()),
            ("/Game/Input/IA_Interact", boolean()),
        ] {
            c.input_actions.insert(path.to_string(), value_type);
        }

        c
    }

    fn add_class(&mut self, path: &str, parent: Option<&str>) {
        self.classes.insert(
            path.to_string(),
            ClassInfo {
                path: path.to_string(),
                parent: parent.map(str::to_string),
            },
        );
    }

    fn add_function(&mut self, sig: FunctionSignature) {
        self.functions.insert(sig.path(), sig);
    }

    fn add_event(&mut self, name: &str, title: &str, params: Vec<ParamSpec>) {
        self.events.insert(
            name.to_string(),
            EventSignature {
                name: name.to_string(),
                title: title.to_string(),
                params,
            },
        );
    }

    /// Resolves a class by full path (`/Script/Engine.Pawn`) or short name (`Pawn`).
    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        let name = name.trim();
        self.classes.get(name).or_else(|| {
            self.classes
                .values()
                .find(|c| c.short_name().eq_ignore_ascii_case(name))
        })
    }

    /// Whether `class` is `ancestor` or derives from it.
    pub fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        let mut current = self.class(class);
        while let Some(info) = current {
            if info.path == ancestor {
                return true;
            }
            current = info.parent.as_deref().and_then(|p| self.classes.get(p));
        }
        false
    }

    /// Resolves `Owner:Function`, where Owner may be a short class name.
    pub fn function(&self, path: &str) -> Option<&FunctionSignature> {
        let (owner, name) = path.trim().rsplit_once(':')?;
        let owner = self.class(owner)?;
        self.functions.get(&format!("{}:{}", owner.path, name))
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.values()
    }

    pub fn event(&self, name: &str) -> Option<&EventSignature> {
        self.events.get(name.trim())
    }

    /// Value type of an input action, by package or object path.
    pub fn input_action(&self, path: &str) -> Option<(AssetPath, &PinType)> {
        let parsed = AssetPath::parse(path).ok()?;
        let value_type = self.input_actions.get(parsed.package())?;
        Some((parsed, value_type))
    }

    /// Registers an input action asset so event nodes can bind to it.
    pub fn register_input_action(&mut self, path: &str, value_type: PinType) -> Result<(), BackendError> {
        let parsed = AssetPath::parse(path)?;
        self.input_actions.insert(parsed.package().to_string(), value_type);
        Ok(())
    }
}
