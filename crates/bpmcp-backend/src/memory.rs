//! In-memory implementation of [`GraphBackend`].
//!
//! [`MemoryBackend`] keeps every loaded asset in a `DashMap` keyed by package
//! name. Reads clone a snapshot out of the map, so concurrent readers never
//! observe a half-applied mutation. Mutations hold the entry's write guard for
//! the duration of one model operation and mark the asset dirty on success.
//! Saved assets go to a [`SqliteStore`] and are loaded back on startup.

use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard};

use dashmap::DashMap;
use tracing::{debug, info, warn};

use bpmcp_core::{
    AssetPath, AssetReferences, AssetStatus, CoreError, CreationResult, GraphAsset, GraphKind,
    NameKind, Node, NodeId, NodeKind, PinRef, PinType, Position, TriggerEvent, Variable,
};

use crate::catalog::{
    event_pins, input_action_pins, Catalog, FunctionSignature, ACTOR_CLASS, ACTOR_COMPONENT_CLASS,
};
use crate::compile::check_asset;
use crate::error::BackendError;
use crate::references::{dependencies, ReferenceGraph};
use crate::sqlite::{SaveOutcome, SqliteStore};
use crate::traits::GraphBackend;

/// Reference backend: assets in memory, saves in SQLite.
pub struct MemoryBackend {
    assets: DashMap<String, GraphAsset>,
    catalog: RwLock<Catalog>,
    store: Mutex<SqliteStore>,
}

impl MemoryBackend {
    /// Creates a backend over `store`, loading every asset saved in it.
    pub fn new(catalog: Catalog, store: SqliteStore) -> Result<Self, BackendError> {
        let assets = DashMap::new();
        for asset in store.load_all()? {
            assets.insert(asset.path.package().to_string(), asset);
        }
        info!("Loaded {} saved asset(s)", assets.len());
        Ok(MemoryBackend {
            assets,
            catalog: RwLock::new(catalog),
            store: Mutex::new(store),
        })
    }

    /// Backend with the built-in catalog and a throwaway in-memory store.
    pub fn in_memory() -> Result<Self, BackendError> {
        MemoryBackend::new(Catalog::builtin(), SqliteStore::in_memory()?)
    }

    /// Backend with the built-in catalog persisting to the SQLite file at `db_path`.
    pub fn open(db_path: &str) -> Result<Self, BackendError> {
        MemoryBackend::new(Catalog::builtin(), SqliteStore::new(db_path)?)
    }

    /// Makes an input action asset available to `add_input_action_event`.
    pub fn register_input_action(&self, path: &str, value_type: PinType) -> Result<(), BackendError> {
        self.catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_input_action(path, value_type)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Content hash of the saved copy of `path`, if it was ever saved.
    pub fn stored_hash(&self, path: &str) -> Result<Option<String>, BackendError> {
        let path = parse_path(path)?;
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stored_hash(path.package())
    }

    fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self, path: &AssetPath) -> Result<GraphAsset, BackendError> {
        self.assets
            .get(path.package())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BackendError::AssetNotFound {
                path: path.object_path(),
            })
    }

    fn require_exists(&self, path: &str) -> Result<AssetPath, BackendError> {
        let path = parse_path(path)?;
        if !self.assets.contains_key(path.package()) {
            return Err(BackendError::AssetNotFound {
                path: path.object_path(),
            });
        }
        Ok(path)
    }

    /// Applies one mutation to the asset at `path` and marks it dirty.
    ///
    /// `f` must not touch `self.assets`; the entry's shard is write-locked.
    fn with_asset_mut<T, F>(&self, path: &str, f: F) -> Result<T, BackendError>
    where
        F: FnOnce(&mut GraphAsset) -> Result<T, BackendError>,
    {
        let path = parse_path(path)?;
        let mut entry = self
            .assets
            .get_mut(path.package())
            .ok_or_else(|| BackendError::AssetNotFound {
                path: path.object_path(),
            })?;
        let out = f(entry.value_mut())?;
        entry.status = AssetStatus::Dirty;
        Ok(out)
    }

    /// Resolves a parent class: a catalog class or another asset.
    fn resolve_parent(&self, name: &str) -> Result<String, BackendError> {
        if let Some(class) = self.catalog().class(name) {
            return Ok(class.path.clone());
        }
        if let Ok(path) = AssetPath::parse(name) {
            if self.assets.contains_key(path.package()) {
                return Ok(path.object_path());
            }
        }
        Err(BackendError::ClassNotFound {
            class: name.to_string(),
        })
    }

    /// Resolves `Owner:Function` against the catalog, then against the
    /// function graphs of other assets.
    fn resolve_function(&self, function_path: &str) -> Result<FunctionSignature, BackendError> {
        if let Some(sig) = self.catalog().function(function_path) {
            return Ok(sig.clone());
        }
        let not_found = || BackendError::FunctionNotFound {
            function: function_path.to_string(),
        };
        let (owner, name) = function_path.trim().rsplit_once(':').ok_or_else(not_found)?;
        let owner = AssetPath::parse(owner).map_err(|_| not_found())?;
        let asset = self.assets.get(owner.package()).ok_or_else(not_found)?;
        let callable = asset
            .find_graph(name)
            .is_some_and(|g| g.kind == GraphKind::Function);
        if !callable {
            return Err(not_found());
        }
        Ok(FunctionSignature {
            owner: owner.object_path(),
            name: name.to_string(),
            title: name.to_string(),
            params: Vec::new(),
            return_type: None,
            pure: false,
            member: true,
        })
    }

    fn reference_graph(&self) -> ReferenceGraph {
        ReferenceGraph::build(
            self.assets
                .iter()
                .map(|entry| (entry.key().clone(), dependencies(entry.value()))),
        )
    }

    fn try_create(&self, package_path: &str, parent_class: Option<&str>) -> Result<AssetPath, BackendError> {
        let path = parse_path(package_path)?;
        if self.assets.contains_key(path.package()) {
            return Err(BackendError::AssetExists {
                path: path.object_path(),
            });
        }
        let parent = match parent_class.map(str::trim).filter(|p| !p.is_empty()) {
            Some(name) => self.resolve_parent(name)?,
            None => ACTOR_CLASS.to_string(),
        };
        let asset = GraphAsset::new(path.clone(), parent);
        self.assets.insert(path.package().to_string(), asset);
        Ok(path)
    }

    fn add_node(&self, path: &str, graph: &str, node: Node) -> Result<NodeId, BackendError> {
        self.with_asset_mut(path, |asset| Ok(asset.require_graph_mut(graph)?.add_node(node)?))
    }
}

/// Parses an asset path, reporting failures as `InvalidAssetPath`.
fn parse_path(raw: &str) -> Result<AssetPath, BackendError> {
    AssetPath::parse(raw).map_err(|e| match e {
        CoreError::InvalidAssetPath { path, reason } => BackendError::InvalidAssetPath { path, reason },
        other => BackendError::Core(other),
    })
}

impl GraphBackend for MemoryBackend {
    fn load_asset(&self, path: &str) -> Result<GraphAsset, BackendError> {
        let path = parse_path(path)?;
        let mut asset = self.snapshot(&path)?;
        asset.references = self.reference_graph().references(path.package());
        Ok(asset)
    }

    fn list_assets(&self, roots: &[String]) -> Result<Vec<String>, BackendError> {
        let mut paths: Vec<String> = self
            .assets
            .iter()
            .filter(|entry| roots.is_empty() || roots.iter().any(|r| entry.path.is_under(r)))
            .map(|entry| entry.path.object_path())
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn references(&self, path: &str) -> Result<AssetReferences, BackendError> {
        let path = self.require_exists(path)?;
        Ok(self.reference_graph().references(path.package()))
    }

    fn create_asset(&self, package_path: &str, parent_class: Option<&str>) -> CreationResult {
        match self.try_create(package_path, parent_class) {
            Ok(path) => {
                info!("Created asset {}", path);
                CreationResult::created(&path)
            }
            Err(e) => {
                debug!("Asset creation at '{}' failed: {}", package_path, e);
                CreationResult::failed(e.to_string())
            }
        }
    }

    fn add_variable(&self, path: &str, name: &str, var_type: PinType) -> Result<(), BackendError> {
        self.with_asset_mut(path, |asset| {
            Ok(asset.add_variable(Variable::new(name.trim(), var_type))?)
        })
    }

    fn add_function_graph(&self, path: &str, name: &str) -> Result<(), BackendError> {
        self.with_asset_mut(path, |asset| {
            asset.add_function_graph(name.trim())?;
            Ok(())
        })
    }

    fn add_call_function_node(
        &self,
        path: &str,
        graph: &str,
        function_path: &str,
        position: Position,
    ) -> Result<NodeId, BackendError> {
        self.require_exists(path)?;
        let sig = self.resolve_function(function_path)?;
        let node = Node::new(
            NodeKind::CallFunction {
                function: sig.path(),
            },
            sig.title.clone(),
            position,
            sig.pins(),
        )?;
        self.add_node(path, graph, node)
    }

    fn add_event_node(
        &self,
        path: &str,
        graph: &str,
        event_name: &str,
        position: Position,
    ) -> Result<NodeId, BackendError> {
        let event_name = event_name.trim();
        if event_name.is_empty() {
            return Err(CoreError::EmptyName {
                kind: NameKind::Event,
            }
            .into());
        }
        let node = match self.catalog().event(event_name) {
            Some(sig) => Node::new(
                NodeKind::Event {
                    event: sig.name.clone(),
                    custom: false,
                },
                sig.title.clone(),
                position,
                event_pins(&sig.params),
            )?,
            None => Node::new(
                NodeKind::Event {
                    event: event_name.to_string(),
                    custom: true,
                },
                event_name,
                position,
                event_pins(&[]),
            )?,
        };
        self.add_node(path, graph, node)
    }

    fn add_input_action_event(
        &self,
        path: &str,
        graph: &str,
        input_action: &str,
        trigger: TriggerEvent,
        position: Position,
    ) -> Result<NodeId, BackendError> {
        self.require_exists(path)?;
        let node = {
            let catalog = self.catalog();
            let (action, value_type) =
                catalog
                    .input_action(input_action)
                    .ok_or_else(|| BackendError::InputActionNotFound {
                        input_action: input_action.to_string(),
                    })?;
            Node::new(
                NodeKind::InputActionEvent {
                    input_action: action.object_path(),
                    trigger,
                },
                format!("EnhancedInputAction {}", action.name()),
                position,
                input_action_pins(value_type, trigger),
            )?
        };
        self.add_node(path, graph, node)
    }

    fn add_component(&self, path: &str, class: &str, name: &str) -> Result<(), BackendError> {
        self.require_exists(path)?;
        let class_path = {
            let catalog = self.catalog();
            let info = catalog
                .class(class)
                .ok_or_else(|| BackendError::ComponentClassNotFound {
                    class: class.to_string(),
                })?;
            if !catalog.is_subclass_of(&info.path, ACTOR_COMPONENT_CLASS) {
                return Err(BackendError::NotAComponent {
                    class: info.path.clone(),
                });
            }
            info.path.clone()
        };
        self.with_asset_mut(path, |asset| Ok(asset.add_component(name.trim(), &class_path)?))
    }

    fn set_pin_literal(
        &self,
        path: &str,
        graph: &str,
        node: NodeId,
        pin: &str,
        value: &str,
    ) -> Result<(), BackendError> {
        self.with_asset_mut(path, |asset| {
            Ok(asset.require_graph_mut(graph)?.set_pin_literal(node, pin, value)?)
        })
    }

    fn connect_pins(&self, path: &str, graph: &str, from: &PinRef, to: &PinRef) -> Result<(), BackendError> {
        self.with_asset_mut(path, |asset| {
            asset.require_graph_mut(graph)?.connect(from, to)?;
            Ok(())
        })
    }

    fn compile(&self, path: &str) -> Result<(), BackendError> {
        let parsed = parse_path(path)?;
        let snapshot = self.snapshot(&parsed)?;
        let problems = check_asset(&snapshot, |f| self.resolve_function(f).is_ok());

        if let Some(mut entry) = self.assets.get_mut(parsed.package()) {
            entry.status = if problems.is_empty() {
                AssetStatus::UpToDate
            } else {
                AssetStatus::Error
            };
        }
        if problems.is_empty() {
            info!("Compiled {}", parsed);
            Ok(())
        } else {
            warn!("Compile of {} found {} problem(s)", parsed, problems.len());
            Err(BackendError::CompileFailed { problems })
        }
    }

    fn save(&self, path: &str) -> Result<(), BackendError> {
        let parsed = parse_path(path)?;
        let snapshot = self.snapshot(&parsed)?;
        let outcome = self
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .save_asset(&snapshot)
            .map_err(|e| BackendError::SaveFailed {
                reason: e.to_string(),
            })?;
        match outcome {
            SaveOutcome::Written => info!("Saved {}", parsed),
            SaveOutcome::Unchanged => debug!("{} unchanged since last save", parsed),
        }
        Ok(())
    }
}
