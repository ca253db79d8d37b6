//! Scene: registry, defaults, attachment, dirty scheduling, destruction
//!
//! Everything here is single-threaded and synchronous. Event callbacks
//! receive only the fired value, never the scene, so no callback can re-enter
//! a mutation while one is in flight; cooperative scheduling happens only
//! through the dirty set drained by [`Scene::tick`].

use crate::core::config::SceneConfig;
use crate::events::{EventValue, Subscription};
use crate::foundation::logging::{self, LogLevel};
use crate::foundation::time::FrameClock;
use crate::nodes::{CompiledState, NodeKind};
use crate::render::RenderContext;
use crate::scene::node::{Node, NodeRef, PendingRecord, SceneId};
use crate::scene::SceneError;
use serde_json::json;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// How `set_child` resolves the node to attach.
#[derive(Debug, Clone)]
pub enum ChildSel {
    /// Use the scene's registered default for the role.
    Default,
    /// Resolve an id through the scene registry.
    Id(String),
    /// Attach a node the caller already holds a handle to.
    Node(NodeRef),
}

impl From<&NodeRef> for ChildSel {
    fn from(node: &NodeRef) -> Self {
        Self::Node(node.clone())
    }
}

impl From<&str> for ChildSel {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

/// The root of a scene graph: node registry, defaults table, and frame clock.
///
/// A `Scene` is itself a distinguished node: [`Scene::root`] returns the
/// handle whose bus carries the `tick` event and the `log`/`warn`/`error`
/// channel events.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    root: String,
    registry: HashMap<String, Node>,
    /// Role name -> id of the default instance used for fallback attachment.
    defaults: HashMap<String, String>,
    /// Child id -> (parent id, role) back-edges. These are the structural
    /// form of the per-attachment destroy/dirty listeners: removing an edge
    /// unsubscribes the parent.
    parents: HashMap<String, Vec<(String, String)>>,
    /// Nodes awaiting a rebuild on the next tick.
    dirty: BTreeSet<String>,
    clock: FrameClock,
    config: SceneConfig,
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    /// Create an empty scene containing only its root node.
    pub fn new(config: SceneConfig) -> Self {
        let id = SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed));
        let root = format!("{}-root", config.id_prefix);
        let mut registry = HashMap::new();
        registry.insert(root.clone(), Node::new_root(root.clone(), id));
        Self {
            id,
            root,
            registry,
            defaults: HashMap::new(),
            parents: HashMap::new(),
            dirty: BTreeSet::new(),
            clock: FrameClock::new(),
            config,
            next_id: 0,
        }
    }

    /// This scene's process-unique id.
    pub fn scene_id(&self) -> SceneId {
        self.id
    }

    /// Handle to the root node.
    pub fn root(&self) -> NodeRef {
        NodeRef::new(self.id, self.root.clone())
    }

    /// The frame clock driven by [`Scene::tick`].
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Number of registered nodes, the root and destroyed-but-unswept nodes
    /// included.
    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    // --- registration ---

    /// Register a node with an engine-generated id.
    pub fn add(&mut self, kind: NodeKind) -> NodeRef {
        let id = self.generate_id();
        self.insert(id, kind)
    }

    /// Register a node under a caller-supplied id.
    ///
    /// Fails with `DuplicateId` when the id is already taken; the registry is
    /// the sole authority for id uniqueness.
    pub fn add_with_id(&mut self, id: &str, kind: NodeKind) -> Option<NodeRef> {
        if self.registry.contains_key(id) {
            let error = SceneError::DuplicateId { id: id.to_owned() };
            self.report(&error, "scene", &self.root.clone());
            return None;
        }
        Some(self.insert(id.to_owned(), kind))
    }

    /// Borrow a node for inspection.
    pub fn node(&self, node: &NodeRef) -> Option<&Node> {
        if node.scene() != self.id {
            return None;
        }
        self.registry.get(node.id())
    }

    /// Mutate a node through `f`, then apply the recorded effects: pending
    /// log records go out the channel and a property change schedules a
    /// rebuild and propagates dirtiness to attached parents.
    ///
    /// Destroyed nodes are inert: the closure does not run and a warning is
    /// logged instead.
    pub fn update(&mut self, node: &NodeRef, f: impl FnOnce(&mut Node)) -> bool {
        let Some(target) = self.lookup_mut(node) else {
            return false;
        };
        if target.core.destroyed {
            let type_tag = target.core.type_tag;
            let id = target.core.id.clone();
            self.emit(
                LogLevel::Warn,
                None,
                logging::format_record(
                    LogLevel::Warn,
                    type_tag,
                    &id,
                    "mutation of destroyed node ignored",
                ),
            );
            return false;
        }
        f(target);
        let changed = std::mem::take(&mut target.core.changed);
        let pending = std::mem::take(&mut target.core.pending);
        let type_tag = target.core.type_tag;
        let id = target.core.id.clone();

        for record in pending {
            self.emit_pending(&record, type_tag, &id);
        }
        if changed {
            self.mark_dirty(node.id());
        }
        true
    }

    // --- events ---

    /// Subscribe to `name` on a node's bus. Replays the retained value, if
    /// one exists, before returning.
    pub fn on(
        &mut self,
        node: &NodeRef,
        name: &str,
        callback: impl FnMut(&EventValue) + 'static,
    ) -> Option<Subscription> {
        let target = self.lookup_mut(node)?;
        let key = target.core.bus.on(name, callback);
        Some(Subscription::new(node.clone(), key))
    }

    /// Subscribe to at most one delivery of `name` on a node's bus.
    pub fn once(
        &mut self,
        node: &NodeRef,
        name: &str,
        callback: impl FnMut(&EventValue) + 'static,
    ) -> Option<Subscription> {
        let target = self.lookup_mut(node)?;
        let key = target.core.bus.once(name, callback);
        Some(Subscription::new(node.clone(), key))
    }

    /// Cancel a subscription. Idempotent; stale handles are ignored.
    pub fn off(&mut self, subscription: &Subscription) {
        if subscription.node().scene() != self.id {
            return;
        }
        if let Some(target) = self.registry.get_mut(subscription.node().id()) {
            target.core.bus.off(subscription.key());
        }
    }

    /// Fire an application event on a node's bus.
    pub fn fire(&mut self, node: &NodeRef, name: &str, value: EventValue, retain: bool) -> bool {
        let Some(target) = self.lookup_mut(node) else {
            return false;
        };
        target.core.bus.fire(name, value, retain);
        true
    }

    // --- defaults and attachment ---

    /// Register `node` as the fallback instance for `role`.
    pub fn register_default(&mut self, role: &str, node: &NodeRef) -> bool {
        let Some(target) = self.lookup_mut(node) else {
            return false;
        };
        if target.core.destroyed {
            let error = SceneError::ComponentNotFound {
                id: node.id().to_owned(),
            };
            self.report(&error, "scene", &self.root.clone());
            return false;
        }
        self.defaults.insert(role.to_owned(), node.id().to_owned());
        true
    }

    /// The registered default for `role`, if any.
    pub fn default_for(&self, role: &str) -> Option<NodeRef> {
        self.defaults
            .get(role)
            .map(|id| NodeRef::new(self.id, id.clone()))
    }

    /// Attach a child under `role` on `parent`.
    ///
    /// Resolution failures (`MissingDefaultComponent`, `ComponentNotFound`,
    /// `CrossSceneAttachment`) are logged and leave the parent untouched.
    /// Re-attaching the already-attached child is a harmless no-op. On
    /// success the parent is marked dirty and its `role` event fires with the
    /// resolved child; the resolved handle is returned.
    pub fn set_child(&mut self, parent: &NodeRef, role: &str, child: ChildSel) -> Option<NodeRef> {
        if self.lookup_mut(parent).is_none() {
            return None;
        }
        let (parent_tag, parent_destroyed) = {
            let p = self.registry.get(parent.id())?;
            (p.core.type_tag, p.core.destroyed)
        };
        if parent_destroyed {
            self.emit(
                LogLevel::Warn,
                None,
                logging::format_record(
                    LogLevel::Warn,
                    parent_tag,
                    parent.id(),
                    &format!("attachment of '{role}' on destroyed node ignored"),
                ),
            );
            return None;
        }

        let child_id = self.resolve_child(parent, role, child)?;

        // Idempotence: same resolved child already attached at this role.
        if self.registry.get(parent.id())?.core.children.get(role) == Some(&child_id) {
            return Some(NodeRef::new(self.id, child_id));
        }

        let previous = {
            let p = self.registry.get_mut(parent.id())?;
            p.core.children.insert(role.to_owned(), child_id.clone())
        };
        if let Some(previous_id) = previous {
            self.remove_back_edge(&previous_id, parent.id(), role);
        }
        self.parents
            .entry(child_id.clone())
            .or_default()
            .push((parent.id().to_owned(), role.to_owned()));

        self.mark_dirty(parent.id());
        let child_ref = NodeRef::new(self.id, child_id);
        if let Some(p) = self.registry.get_mut(parent.id()) {
            p.core
                .bus
                .fire(role, EventValue::Node(child_ref.clone()), true);
        }
        Some(child_ref)
    }

    /// Detach the child at `role`, firing a null-value change for the role.
    pub fn unset_child(&mut self, parent: &NodeRef, role: &str) -> bool {
        let Some(p) = self.lookup_mut(parent) else {
            return false;
        };
        let Some(child_id) = p.core.children.remove(role) else {
            return false;
        };
        self.remove_back_edge(&child_id, parent.id(), role);
        self.mark_dirty(parent.id());
        if let Some(p) = self.registry.get_mut(parent.id()) {
            p.core.bus.fire(role, EventValue::Null, true);
        }
        true
    }

    /// Handle to the child attached at `role` on `parent`.
    pub fn child_of(&self, parent: &NodeRef, role: &str) -> Option<NodeRef> {
        self.node(parent)?
            .child(role)
            .map(|id| NodeRef::new(self.id, id.to_owned()))
    }

    // --- lifecycle ---

    /// Destroy a node: detach it everywhere, fall parents back to the
    /// registered default for each role (or clear the slot), and fire the
    /// retained terminal `destroyed` event.
    ///
    /// Idempotent: a second call on the same node returns `false` and fires
    /// nothing.
    pub fn destroy(&mut self, node: &NodeRef) -> bool {
        if node.id() == self.root {
            self.emit(
                LogLevel::Warn,
                None,
                logging::format_record(
                    LogLevel::Warn,
                    "scene",
                    &self.root.clone(),
                    "the scene root cannot be destroyed",
                ),
            );
            return false;
        }
        let Some(target) = self.lookup_mut(node) else {
            return false;
        };
        if target.core.destroyed {
            return false;
        }
        target.core.destroyed = true;
        target.core.dirty = false;
        target.kind.teardown();
        let type_tag = target.core.type_tag;
        let children: Vec<(String, String)> = target
            .core
            .children
            .iter()
            .map(|(role, id)| (role.clone(), id.clone()))
            .collect();
        target.core.children.clear();
        target
            .core
            .bus
            .fire("destroyed", EventValue::Bool(true), true);

        self.dirty.remove(node.id());
        // This node stops listening to its children before anything else can
        // call back into a half-destroyed parent.
        for (role, child_id) in children {
            self.remove_back_edge(&child_id, node.id(), &role);
        }
        // A destroyed default must not be the fallback target below.
        self.defaults.retain(|_, id| id != node.id());

        let edges = self.parents.remove(node.id()).unwrap_or_default();
        for (parent_id, role) in edges {
            let Some(p) = self.registry.get_mut(&parent_id) else {
                continue;
            };
            if p.core.destroyed || p.core.children.get(&role) != Some(&node.id().to_owned()) {
                continue;
            }
            p.core.children.remove(&role);
            if let Some(default_id) = self.defaults.get(&role).cloned() {
                let parent_ref = NodeRef::new(self.id, parent_id);
                self.set_child(&parent_ref, &role, ChildSel::Id(default_id));
            } else if let Some(p) = self.registry.get_mut(&parent_id) {
                p.core.bus.fire(&role, EventValue::Null, true);
            }
        }

        self.emit(
            LogLevel::Log,
            None,
            logging::format_record(LogLevel::Log, type_tag, node.id(), "destroyed"),
        );
        true
    }

    /// Drop destroyed nodes from the registry. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let doomed: Vec<String> = self
            .registry
            .iter()
            .filter(|(_, n)| n.core.destroyed)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &doomed {
            self.registry.remove(id);
            self.dirty.remove(id);
            self.parents.remove(id);
        }
        doomed.len()
    }

    // --- dirty scheduling and the frame clock ---

    /// Whether a node is queued for a rebuild on the next tick.
    pub fn is_scheduled(&self, node: &NodeRef) -> bool {
        node.scene() == self.id && self.dirty.contains(node.id())
    }

    /// Advance the frame clock by one tick of `delta` seconds: fire `tick`
    /// on the root, then drain the dirty set, rebuilding every live member.
    pub fn tick(&mut self, delta: f32) {
        self.clock.advance(delta);
        let payload = EventValue::Json(json!({
            "frame": self.clock.frame(),
            "delta": f64::from(self.clock.delta()),
        }));
        if let Some(root) = self.registry.get_mut(&self.root) {
            root.core.bus.fire("tick", payload, true);
        }
        let due = std::mem::take(&mut self.dirty);
        for id in due {
            if let Some(node) = self.registry.get_mut(&id) {
                node.rebuild();
            }
        }
    }

    /// The node's compiled snapshot, rebuilding first if it is stale so a
    /// reader never observes stale derived state between ticks.
    pub fn compiled(&mut self, node: &NodeRef) -> Option<CompiledState<'_>> {
        if node.scene() != self.id || !self.registry.contains_key(node.id()) {
            self.report_not_found(node.id());
            return None;
        }
        if let Some(target) = self.registry.get_mut(node.id()) {
            target.rebuild();
        }
        self.dirty.remove(node.id());
        self.registry.get(node.id()).map(Node::compiled_raw)
    }

    /// Convenience copy of a transform or projection node's compiled matrix.
    pub fn compiled_matrix(&mut self, node: &NodeRef) -> Option<nalgebra::Matrix4<f32>> {
        match self.compiled(node)? {
            CompiledState::Matrix(matrix) => Some(*matrix),
            _ => None,
        }
    }

    // --- the compiler boundary ---

    /// Hand every node reachable from the root over the attachment graph to
    /// the renderer collaborator, forcing rebuilds so only fresh snapshots
    /// cross the boundary.
    pub fn compile_into(&mut self, ctx: &mut dyn RenderContext) {
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = vec![self.root.clone()];
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(node) = self.registry.get_mut(&id) {
                if node.core.destroyed {
                    continue;
                }
                node.rebuild();
                node.kind.compile_into(&node.core.id, ctx);
            } else {
                continue;
            }
            self.dirty.remove(&id);
            if let Some(node) = self.registry.get(&id) {
                for (_, child_id) in node.children() {
                    if !visited.contains(child_id) {
                        stack.push(child_id.to_owned());
                    }
                }
            }
        }
    }

    /// Compile a single node's snapshot into the renderer collaborator.
    pub fn compile_node_into(&mut self, node: &NodeRef, ctx: &mut dyn RenderContext) -> bool {
        let Some(target) = self.lookup_mut(node) else {
            return false;
        };
        if target.core.destroyed {
            return false;
        }
        target.rebuild();
        target.kind.compile_into(&target.core.id, ctx);
        self.dirty.remove(node.id());
        true
    }

    // --- cloning ---

    /// Clone a node: serialize minus identity, shallow-merge `overrides`,
    /// reconstruct in this scene. Child references stay shared with the
    /// source unless overridden. Fails with `DestroyedComponentClone` on a
    /// destroyed source.
    pub fn clone_node(
        &mut self,
        source: &NodeRef,
        overrides: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Option<NodeRef> {
        if source.scene() != self.id || !self.registry.contains_key(source.id()) {
            self.report_not_found(source.id());
            return None;
        }
        let (json, destroyed, type_tag) = {
            let node = self.registry.get(source.id())?;
            (node.to_json(), node.core.destroyed, node.core.type_tag)
        };
        if destroyed {
            let error = SceneError::DestroyedComponentClone {
                id: source.id().to_owned(),
            };
            self.report(&error, type_tag, &source.id().to_owned());
            return None;
        }
        let mut json = json;
        if let Some(fields) = json.as_object_mut() {
            fields.remove("id");
            if let Some(overrides) = overrides {
                for (key, value) in overrides {
                    fields.insert(key, value);
                }
            }
        }
        self.reconstruct(&json)
    }

    // --- logging surface ---

    /// Informational record on the scene channel, attributed to `node`.
    pub fn log(&mut self, node: &NodeRef, message: &str) {
        self.channel(LogLevel::Log, node, message);
    }

    /// Warning record on the scene channel, attributed to `node`.
    pub fn warn(&mut self, node: &NodeRef, message: &str) {
        self.channel(LogLevel::Warn, node, message);
    }

    /// Error record on the scene channel, attributed to `node`.
    pub fn error(&mut self, node: &NodeRef, message: &str) {
        self.channel(LogLevel::Error, node, message);
    }

    fn channel(&mut self, level: LogLevel, node: &NodeRef, message: &str) {
        let type_tag = self
            .node(node)
            .map_or("unknown", |n| n.core.type_tag);
        let formatted = logging::format_record(level, type_tag, node.id(), message);
        self.emit(level, None, formatted);
    }

    // --- internals ---

    fn insert(&mut self, id: String, kind: NodeKind) -> NodeRef {
        let node = Node::new(id.clone(), self.id, kind);
        self.registry.insert(id.clone(), node);
        NodeRef::new(self.id, id)
    }

    fn generate_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("{}-{}", self.config.id_prefix, self.next_id);
            if !self.registry.contains_key(&id) {
                return id;
            }
        }
    }

    fn lookup_mut(&mut self, node: &NodeRef) -> Option<&mut Node> {
        if node.scene() != self.id || !self.registry.contains_key(node.id()) {
            self.report_not_found(node.id());
            return None;
        }
        self.registry.get_mut(node.id())
    }

    fn resolve_child(&mut self, parent: &NodeRef, role: &str, child: ChildSel) -> Option<String> {
        let child_id = match child {
            ChildSel::Default => match self.defaults.get(role) {
                Some(id) => id.clone(),
                None => {
                    let error = SceneError::MissingDefaultComponent {
                        role: role.to_owned(),
                    };
                    self.report_for(parent, &error);
                    return None;
                }
            },
            ChildSel::Id(id) => {
                if self.registry.contains_key(&id) {
                    id
                } else {
                    let error = SceneError::ComponentNotFound { id };
                    self.report_for(parent, &error);
                    return None;
                }
            }
            ChildSel::Node(node) => {
                if node.scene() != self.id {
                    let error = SceneError::CrossSceneAttachment {
                        id: node.id().to_owned(),
                    };
                    self.report_for(parent, &error);
                    return None;
                }
                if !self.registry.contains_key(node.id()) {
                    let error = SceneError::ComponentNotFound {
                        id: node.id().to_owned(),
                    };
                    self.report_for(parent, &error);
                    return None;
                }
                node.id().to_owned()
            }
        };
        if self.registry.get(&child_id).is_some_and(|n| n.core.destroyed) {
            let error = SceneError::ComponentNotFound { id: child_id };
            self.report_for(parent, &error);
            return None;
        }
        Some(child_id)
    }

    /// Mark `start` dirty and propagate up the attachment graph. Each node
    /// transitions at most once per wave: the visited set makes attachment
    /// cycles terminate, and an already-dirty node's parents were notified
    /// when it transitioned.
    fn mark_dirty(&mut self, start: &str) {
        let mut stack = vec![start.to_owned()];
        let mut visited: HashSet<String> = HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            let Some(node) = self.registry.get_mut(&id) else {
                continue;
            };
            if node.core.destroyed || node.core.dirty {
                continue;
            }
            node.core.dirty = true;
            node.core.bus.fire("dirty", EventValue::Bool(true), false);
            self.dirty.insert(id.clone());
            if let Some(edges) = self.parents.get(&id) {
                for (parent_id, _) in edges {
                    if !visited.contains(parent_id) {
                        stack.push(parent_id.clone());
                    }
                }
            }
        }
    }

    fn remove_back_edge(&mut self, child_id: &str, parent_id: &str, role: &str) {
        if let Some(edges) = self.parents.get_mut(child_id) {
            edges.retain(|(p, r)| !(p == parent_id && r == role));
            if edges.is_empty() {
                self.parents.remove(child_id);
            }
        }
    }

    fn emit_pending(&mut self, record: &PendingRecord, type_tag: &'static str, id: &str) {
        let formatted = logging::format_record(record.level, type_tag, id, &record.message);
        let code = record.error.as_ref().map(SceneError::code);
        self.emit(record.level, code, formatted);
    }

    fn report(&mut self, error: &SceneError, type_tag: &str, id: &str) {
        let formatted = logging::format_record(error.level(), type_tag, id, &error.to_string());
        self.emit(error.level(), Some(error.code()), formatted);
    }

    fn report_for(&mut self, node: &NodeRef, error: &SceneError) {
        let type_tag = self
            .node(node)
            .map_or("unknown", |n| n.core.type_tag);
        self.report(error, type_tag, &node.id().to_owned());
    }

    pub(crate) fn report_reconstruct(&mut self, error: &SceneError) {
        self.report(error, "scene", &self.root.clone());
    }

    fn report_not_found(&mut self, id: &str) {
        let error = SceneError::ComponentNotFound { id: id.to_owned() };
        self.report(&error, "scene", &self.root.clone());
    }

    /// Emit on the log channel and, when configured, re-fire the record as a
    /// same-named event on the scene root.
    fn emit(&mut self, level: LogLevel, code: Option<&'static str>, formatted: String) {
        logging::emit(level, &formatted);
        if !self.config.log_events {
            return;
        }
        let payload = code.map_or_else(
            || EventValue::Text(formatted.clone()),
            |code| EventValue::Json(json!({ "code": code, "message": formatted })),
        );
        if let Some(root) = self.registry.get_mut(&self.root) {
            root.core.bus.fire(level.channel(), payload, true);
        }
    }
}
