//! Node: the base reactive unit of the scene graph
//!
//! A [`Node`] pairs the shared machinery every scene object carries (identity,
//! metadata, event bus, child role slots, dirty/destroyed flags) with a typed
//! [`NodeKind`] variant holding the reactive properties and the compiled
//! snapshot they produce. Nodes are owned by their [`super::Scene`]'s
//! registry; application code holds [`NodeRef`] handles and mutates through
//! [`super::Scene::update`], which is what turns recorded property changes
//! into dirty scheduling and log-channel records.

use crate::events::{EventBus, EventValue};
use crate::foundation::logging::LogLevel;
use crate::nodes::{CompiledState, NodeKind};
use crate::scene::SceneError;
use std::collections::BTreeMap;

/// Identifies one scene instance within the process.
///
/// Carried by every [`NodeRef`] so cross-scene attachment can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub(crate) u64);

impl SceneId {
    /// Raw numeric value, useful for diagnostics.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Handle to a node: its owning scene plus its registry id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    scene: SceneId,
    id: String,
}

impl NodeRef {
    pub(crate) fn new(scene: SceneId, id: impl Into<String>) -> Self {
        Self {
            scene,
            id: id.into(),
        }
    }

    /// Scene this node belongs to.
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Registry id, unique within the owning scene.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Log-channel record produced inside a node mutation and drained by the
/// scene once the mutation completes.
#[derive(Debug, Clone)]
pub(crate) struct PendingRecord {
    pub level: LogLevel,
    pub error: Option<SceneError>,
    pub message: String,
}

/// Shared per-node state managed by the core, independent of kind.
#[derive(Debug)]
pub(crate) struct NodeCore {
    pub id: String,
    pub type_tag: &'static str,
    pub scene: SceneId,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub destroyed: bool,
    pub dirty: bool,
    /// Role name -> child node id. Shared-by-reference: many parents may
    /// point at the same child; the edge holds no lifetime.
    pub children: BTreeMap<String, String>,
    pub bus: EventBus,
    pub pending: Vec<PendingRecord>,
    pub changed: bool,
}

impl NodeCore {
    fn new(id: String, type_tag: &'static str, scene: SceneId) -> Self {
        Self {
            id,
            type_tag,
            scene,
            metadata: serde_json::Map::new(),
            destroyed: false,
            dirty: false,
            children: BTreeMap::new(),
            bus: EventBus::new(),
            pending: Vec::new(),
            changed: false,
        }
    }
}

/// A reactive, identifiable, event-emitting scene object.
#[derive(Debug)]
pub struct Node {
    pub(crate) core: NodeCore,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(id: String, scene: SceneId, kind: NodeKind) -> Self {
        Self {
            core: NodeCore::new(id, kind.type_tag(), scene),
            kind,
        }
    }

    /// Root nodes keep the `scene` tag while reusing the group kind.
    pub(crate) fn new_root(id: String, scene: SceneId) -> Self {
        Self {
            core: NodeCore::new(id, "scene", scene),
            kind: NodeKind::Group,
        }
    }

    /// Registry id of this node.
    pub fn id(&self) -> &str {
        &self.core.id
    }

    /// Immutable type tag identifying the concrete variant.
    pub fn type_tag(&self) -> &'static str {
        self.core.type_tag
    }

    /// Whether `destroy` has run on this node. Monotonic false to true.
    pub fn is_destroyed(&self) -> bool {
        self.core.destroyed
    }

    /// Whether the compiled snapshot is stale.
    pub fn is_dirty(&self) -> bool {
        self.core.dirty
    }

    /// Open key-value bag, opaque to the engine and round-tripped through
    /// serialization.
    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.core.metadata
    }

    /// Mutable access to the metadata bag. Metadata writes fire no events.
    pub fn metadata_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.core.metadata
    }

    /// Id of the child attached at `role`, if any.
    pub fn child(&self, role: &str) -> Option<&str> {
        self.core.children.get(role).map(String::as_str)
    }

    /// Iterate `(role, child id)` pairs in role order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &str)> {
        self.core
            .children
            .iter()
            .map(|(role, id)| (role.as_str(), id.as_str()))
    }

    /// The typed variant of this node.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Current compiled snapshot, without forcing a rebuild.
    ///
    /// Use [`super::Scene::compiled`] for read-time consistency; this
    /// accessor can observe a stale snapshot on a dirty node.
    pub fn compiled_raw(&self) -> CompiledState<'_> {
        self.kind.compiled()
    }

    /// Last retained value fired for `name` on this node's bus.
    pub fn retained(&self, name: &str) -> Option<&EventValue> {
        self.core.bus.retained(name)
    }

    // --- support for typed accessor pairs (see the `nodes` module) ---

    /// Record a property change: fire the retained change event and flag the
    /// node so the scene schedules a rebuild when the mutation completes.
    pub(crate) fn note_change(&mut self, name: &str, value: EventValue) {
        self.core.bus.fire(name, value, true);
        self.core.changed = true;
    }

    /// Coerce-and-warn guard for properties whose domain is `>= 0`.
    pub(crate) fn coerce_non_negative(&mut self, property: &str, value: f32) -> f32 {
        if value < 0.0 {
            let coerced = -value;
            self.note_coercion(property, value, coerced);
            coerced
        } else {
            value
        }
    }

    /// Coerce-and-warn guard for properties whose domain is `[0, 1]`.
    pub(crate) fn coerce_unit(&mut self, property: &str, value: f32) -> f32 {
        if (0.0..=1.0).contains(&value) {
            value
        } else {
            let coerced = value.clamp(0.0, 1.0);
            self.note_coercion(property, value, coerced);
            coerced
        }
    }

    /// Record an out-of-domain value that was coerced into range.
    pub(crate) fn note_coercion(&mut self, property: &str, given: f32, coerced: f32) {
        let error = SceneError::InvalidPropertyValue {
            property: property.to_owned(),
            given: f64::from(given),
            coerced: f64::from(coerced),
        };
        self.core.pending.push(PendingRecord {
            level: LogLevel::Warn,
            message: error.to_string(),
            error: Some(error),
        });
    }

    /// Record a plain warning on the node's channel.
    pub(crate) fn push_warning(&mut self, message: String) {
        self.core.pending.push(PendingRecord {
            level: LogLevel::Warn,
            error: None,
            message,
        });
    }

    /// Setter invoked on the wrong node kind: warn and leave state untouched.
    pub(crate) fn wrong_kind(&mut self, method: &str, expected: &str) -> bool {
        self.core.pending.push(PendingRecord {
            level: LogLevel::Warn,
            error: None,
            message: format!(
                "{method} ignored: node is a '{}', not a '{expected}'",
                self.core.type_tag
            ),
        });
        false
    }

    /// Recompute the compiled snapshot if stale, firing the value-ready
    /// `rebuilt` event. Destroyed nodes skip the recompute.
    pub(crate) fn rebuild(&mut self) {
        if !self.core.dirty {
            return;
        }
        self.core.dirty = false;
        if self.core.destroyed {
            return;
        }
        if let Some(payload) = self.kind.rebuild() {
            self.core.bus.fire("rebuilt", payload, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::SphereGeometryNode;

    fn sphere() -> Node {
        Node::new(
            "s1".to_owned(),
            SceneId(1),
            NodeKind::SphereGeometry(SphereGeometryNode::default()),
        )
    }

    #[test]
    fn type_tag_comes_from_kind() {
        assert_eq!(sphere().type_tag(), "sphere");
    }

    #[test]
    fn negative_coercion_records_a_warning() {
        let mut node = sphere();
        let coerced = node.coerce_non_negative("radius", -5.0);
        assert_eq!(coerced, 5.0);
        assert_eq!(node.core.pending.len(), 1);
        let record = &node.core.pending[0];
        assert_eq!(record.level, LogLevel::Warn);
        assert!(matches!(
            record.error,
            Some(SceneError::InvalidPropertyValue { .. })
        ));
    }

    #[test]
    fn in_domain_values_pass_through_silently() {
        let mut node = sphere();
        assert_eq!(node.coerce_non_negative("radius", 3.0), 3.0);
        assert_eq!(node.coerce_unit("alpha", 0.5), 0.5);
        assert!(node.core.pending.is_empty());
    }

    #[test]
    fn wrong_kind_setter_warns_and_leaves_state() {
        let mut node = sphere();
        assert!(!node.set_translation(1.0, 2.0, 3.0));
        assert_eq!(node.core.pending.len(), 1);
        assert!(!node.core.changed);
    }

    #[test]
    fn rebuild_clears_dirty_and_fires_value_ready() {
        let mut node = sphere();
        node.core.dirty = true;
        node.rebuild();
        assert!(!node.is_dirty());
        assert!(node.retained("rebuilt").is_some());
    }

    #[test]
    fn destroyed_node_skips_rebuild() {
        let mut node = sphere();
        node.core.dirty = true;
        node.core.destroyed = true;
        node.rebuild();
        assert!(!node.is_dirty());
        assert!(node.retained("rebuilt").is_none());
    }
}
