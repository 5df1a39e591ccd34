//! Action registry and dispatch.
//!
//! [`ACTIONS`] is the immutable table mapping an action name to its parameter
//! contract, whether it mutates, and its handler. [`Dispatcher::dispatch`]
//! looks the action up, validates parameters against the contract, applies
//! the write gate and then runs the handler: mutations on the owner context
//! through the rendezvous, reads on the calling thread.
//!
//! `dispatch` blocks while a mutation waits for the owner. Call it from a
//! blocking worker, never from an async task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};

use bpmcp_backend::GraphBackend;

use crate::error::ActionError;
use crate::events::LogSink;
use crate::handlers::{mutations, queries};
use crate::owner::OwnerHandle;

/// Action parameters as received on the wire.
pub type Params = Map<String, Value>;

/// Handler signature shared by every action.
pub type Handler = fn(&ActionContext, &Params) -> Result<Value, ActionError>;

/// What a handler can reach.
#[derive(Clone)]
pub struct ActionContext {
    pub backend: Arc<dyn GraphBackend>,
    pub sink: LogSink,
}

/// Declared JSON kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    StringList,
    /// A type descriptor: either an object or its describe string.
    TypeDescriptor,
}

impl ParamKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            ParamKind::TypeDescriptor => value.is_object() || value.is_string(),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ParamKind::String => "expected a string",
            ParamKind::Number => "expected a number",
            ParamKind::StringList => "expected a list of strings",
            ParamKind::TypeDescriptor => "expected a type object or type string",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

const fn req(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
    }
}

const fn opt(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
    }
}

/// One row of the action table.
pub struct ActionSpec {
    pub name: &'static str,
    pub params: &'static [ParamSpec],
    pub mutates: bool,
    pub handler: Handler,
}

use ParamKind::{Number, String as Str, StringList, TypeDescriptor};

const ASSET: ParamSpec = req("asset_path", Str);
const GRAPH: ParamSpec = req("graph", Str);
const X: ParamSpec = opt("x", Number);
const Y: ParamSpec = opt("y", Number);

/// Every action the server understands.
pub static ACTIONS: &[ActionSpec] = &[
    ActionSpec {
        name: "list_blueprints",
        params: &[opt("paths", StringList)],
        mutates: false,
        handler: queries::list_blueprints,
    },
    ActionSpec {
        name: "get_blueprint_structure",
        params: &[ASSET],
        mutates: false,
        handler: queries::get_blueprint_structure,
    },
    ActionSpec {
        name: "get_references",
        params: &[ASSET],
        mutates: false,
        handler: queries::get_references,
    },
    ActionSpec {
        name: "create_blueprint",
        params: &[req("package_path", Str), opt("parent_class", Str)],
        mutates: true,
        handler: mutations::create_blueprint,
    },
    ActionSpec {
        name: "add_variable",
        params: &[ASSET, req("name", Str), req("type", TypeDescriptor)],
        mutates: true,
        handler: mutations::add_variable,
    },
    ActionSpec {
        name: "add_function_graph",
        params: &[ASSET, req("name", Str)],
        mutates: true,
        handler: mutations::add_function_graph,
    },
    ActionSpec {
        name: "add_call_function_node",
        params: &[ASSET, GRAPH, req("function_path", Str), X, Y],
        mutates: true,
        handler: mutations::add_call_function_node,
    },
    ActionSpec {
        name: "add_event_node",
        params: &[ASSET, GRAPH, req("event_name", Str), X, Y],
        mutates: true,
        handler: mutations::add_event_node,
    },
    ActionSpec {
        name: "add_input_action_event",
        params: &[
            ASSET,
            GRAPH,
            req("input_action", Str),
            req("trigger_event", Str),
            X,
            Y,
        ],
        mutates: true,
        handler: mutations::add_input_action_event,
    },
    ActionSpec {
        name: "add_component",
        params: &[ASSET, req("component_class", Str), req("name", Str)],
        mutates: true,
        handler: mutations::add_component,
    },
    ActionSpec {
        name: "set_pin_default",
        params: &[
            ASSET,
            GRAPH,
            req("node_guid", Str),
            req("pin_name", Str),
            req("value", Str),
        ],
        mutates: true,
        handler: mutations::set_pin_default,
    },
    ActionSpec {
        name: "connect_pins",
        params: &[
            ASSET,
            GRAPH,
            req("from_node", Str),
            req("from_pin", Str),
            req("to_node", Str),
            req("to_pin", Str),
        ],
        mutates: true,
        handler: mutations::connect_pins,
    },
    ActionSpec {
        name: "compile_blueprint",
        params: &[ASSET],
        mutates: true,
        handler: mutations::compile_blueprint,
    },
    ActionSpec {
        name: "save_blueprint",
        params: &[ASSET],
        mutates: true,
        handler: mutations::save_blueprint,
    },
];

/// Checks `params` against the contract of `spec`. A `null` value counts as
/// absent.
pub fn validate(spec: &ActionSpec, params: &Params) -> Result<(), ActionError> {
    for p in spec.params {
        match params.get(p.name).filter(|v| !v.is_null()) {
            None if p.required => return Err(ActionError::MissingParameter(p.name.to_string())),
            None => {}
            Some(value) if !p.kind.accepts(value) => {
                return Err(ActionError::invalid(p.name, p.kind.describe()));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Routes actions to handlers.
pub struct Dispatcher {
    ctx: ActionContext,
    owner: OwnerHandle,
    allow_writes: Arc<AtomicBool>,
}

impl Dispatcher {
    pub fn new(ctx: ActionContext, owner: OwnerHandle, allow_writes: Arc<AtomicBool>) -> Self {
        Dispatcher {
            ctx,
            owner,
            allow_writes,
        }
    }

    pub fn lookup(name: &str) -> Option<&'static ActionSpec> {
        ACTIONS.iter().find(|a| a.name == name)
    }

    pub fn actions() -> impl Iterator<Item = &'static ActionSpec> {
        ACTIONS.iter()
    }

    pub fn set_allow_writes(&self, allow: bool) {
        self.allow_writes.store(allow, Ordering::SeqCst);
    }

    pub fn writes_enabled(&self) -> bool {
        self.allow_writes.load(Ordering::SeqCst)
    }

    pub fn owner(&self) -> &OwnerHandle {
        &self.owner
    }

    pub fn sink(&self) -> &LogSink {
        &self.ctx.sink
    }

    /// Runs one action to completion.
    pub fn dispatch(&self, action: &str, params: &Params) -> Result<Value, ActionError> {
        let spec = Self::lookup(action).ok_or_else(|| ActionError::UnknownAction(action.to_string()))?;
        validate(spec, params)?;

        if !spec.mutates {
            return (spec.handler)(&self.ctx, params);
        }
        if !self.writes_enabled() {
            return Err(ActionError::WritesDisabled);
        }

        let ctx = self.ctx.clone();
        let params = params.clone();
        let handler = spec.handler;
        self.owner.run_on_owner(move || handler(&ctx, &params))?
    }
}
