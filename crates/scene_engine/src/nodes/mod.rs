//! Typed node variants
//!
//! Shared behavior (attachment, destruction, dirty scheduling) lives in the
//! scene core; this module carries the per-variant data: reactive parameter
//! structs and the compiled snapshots they rebuild into. Variants are a
//! tagged enum rather than an inheritance chain, so adding a kind means
//! adding a variant and its arms here.

pub mod camera;
pub mod geometry;
pub mod material;
pub mod transform;

pub use camera::{OrthoNode, PerspectiveNode};
pub use geometry::{BoxGeometryNode, GeometryData, SphereGeometryNode};
pub use material::{MaterialNode, MaterialState};
pub use transform::{RotateNode, ScaleNode, TranslateNode};

use crate::events::EventValue;
use crate::render::RenderContext;
use nalgebra::Matrix4;
use serde_json::json;

/// The concrete variant of a node, tagged for serialization.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure attachment node with no compiled state.
    Group,
    /// Translation transform.
    Translate(TranslateNode),
    /// Axis-angle rotation transform.
    Rotate(RotateNode),
    /// Non-uniform scale transform.
    Scale(ScaleNode),
    /// Perspective projection.
    Perspective(PerspectiveNode),
    /// Orthographic projection.
    Ortho(OrthoNode),
    /// Box geometry builder.
    BoxGeometry(BoxGeometryNode),
    /// Lat-long sphere geometry builder.
    SphereGeometry(SphereGeometryNode),
    /// Base-color material.
    Material(MaterialNode),
}

/// Borrowed view of a node's compiled snapshot.
#[derive(Debug, Clone, Copy)]
pub enum CompiledState<'a> {
    /// The kind carries no compiled state (groups, the scene root).
    None,
    /// Transform or projection matrix.
    Matrix(&'a Matrix4<f32>),
    /// Generated vertex data.
    Geometry(&'a GeometryData),
    /// Renderer-ready material values.
    Material(&'a MaterialState),
}

impl NodeKind {
    /// Immutable tag identifying the variant in logs and serialized form.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Translate(_) => "translate",
            Self::Rotate(_) => "rotate",
            Self::Scale(_) => "scale",
            Self::Perspective(_) => "perspective",
            Self::Ortho(_) => "ortho",
            Self::BoxGeometry(_) => "box",
            Self::SphereGeometry(_) => "sphere",
            Self::Material(_) => "material",
        }
    }

    /// Recompute the compiled snapshot from current parameters.
    ///
    /// Returns the payload of the value-ready event, or `None` for kinds
    /// without compiled state.
    pub(crate) fn rebuild(&mut self) -> Option<EventValue> {
        match self {
            Self::Group => None,
            Self::Translate(node) => Some(node.rebuild()),
            Self::Rotate(node) => Some(node.rebuild()),
            Self::Scale(node) => Some(node.rebuild()),
            Self::Perspective(node) => Some(node.rebuild()),
            Self::Ortho(node) => Some(node.rebuild()),
            Self::BoxGeometry(node) => Some(node.rebuild()),
            Self::SphereGeometry(node) => Some(node.rebuild()),
            Self::Material(node) => Some(node.rebuild()),
        }
    }

    /// Borrow the current compiled snapshot.
    pub(crate) fn compiled(&self) -> CompiledState<'_> {
        match self {
            Self::Group => CompiledState::None,
            Self::Translate(node) => CompiledState::Matrix(&node.compiled),
            Self::Rotate(node) => CompiledState::Matrix(&node.compiled),
            Self::Scale(node) => CompiledState::Matrix(&node.compiled),
            Self::Perspective(node) => CompiledState::Matrix(&node.compiled),
            Self::Ortho(node) => CompiledState::Matrix(&node.compiled),
            Self::BoxGeometry(node) => CompiledState::Geometry(&node.compiled),
            Self::SphereGeometry(node) => CompiledState::Geometry(&node.compiled),
            Self::Material(node) => CompiledState::Material(&node.compiled),
        }
    }

    /// Hand the compiled snapshot to the renderer collaborator.
    pub(crate) fn compile_into(&self, id: &str, ctx: &mut dyn RenderContext) {
        match self {
            Self::Group => {}
            Self::Translate(node) => ctx.transform(id, &node.compiled),
            Self::Rotate(node) => ctx.transform(id, &node.compiled),
            Self::Scale(node) => ctx.transform(id, &node.compiled),
            Self::Perspective(node) => ctx.projection(id, &node.compiled),
            Self::Ortho(node) => ctx.projection(id, &node.compiled),
            Self::BoxGeometry(node) => ctx.geometry(id, &node.compiled),
            Self::SphereGeometry(node) => ctx.geometry(id, &node.compiled),
            Self::Material(node) => ctx.material(id, &node.compiled),
        }
    }

    /// Kind-owned fields for the JSON contract (never `type`/`id`; those are
    /// merged on top by the core).
    pub(crate) fn own_json(&self) -> serde_json::Map<String, serde_json::Value> {
        let value = match self {
            Self::Group => serde_json::Value::Object(serde_json::Map::new()),
            Self::Translate(node) => to_json_object(&node.params),
            Self::Rotate(node) => to_json_object(&node.params),
            Self::Scale(node) => to_json_object(&node.params),
            Self::Perspective(node) => to_json_object(&node.params),
            Self::Ortho(node) => to_json_object(&node.params),
            Self::BoxGeometry(node) => to_json_object(&node.params),
            Self::SphereGeometry(node) => to_json_object(&node.params),
            Self::Material(node) => to_json_object(&node.params),
        };
        match value {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        }
    }

    /// Reconstruct a kind from its type tag and serialized fields.
    ///
    /// Unknown fields are ignored, missing fields take their defaults, so a
    /// partially-specified node (as produced by clone overrides) works.
    pub(crate) fn from_json(tag: &str, fields: &serde_json::Value) -> Option<Self> {
        let kind = match tag {
            "group" => Self::Group,
            "translate" => Self::Translate(TranslateNode::from_params(from_json(fields)?)),
            "rotate" => Self::Rotate(RotateNode::from_params(from_json(fields)?)),
            "scale" => Self::Scale(ScaleNode::from_params(from_json(fields)?)),
            "perspective" => Self::Perspective(PerspectiveNode::from_params(from_json(fields)?)),
            "ortho" => Self::Ortho(OrthoNode::from_params(from_json(fields)?)),
            "box" => Self::BoxGeometry(BoxGeometryNode::from_params(from_json(fields)?)),
            "sphere" => Self::SphereGeometry(SphereGeometryNode::from_params(from_json(fields)?)),
            "material" => Self::Material(MaterialNode::from_params(from_json(fields)?)),
            _ => return None,
        };
        Some(kind)
    }

    /// Per-kind teardown: drop heavyweight compiled data so a
    /// destroyed node that lingers in the registry holds no buffers.
    pub(crate) fn teardown(&mut self) {
        match self {
            Self::BoxGeometry(node) => node.compiled = GeometryData::default(),
            Self::SphereGeometry(node) => node.compiled = GeometryData::default(),
            _ => {}
        }
    }
}

fn to_json_object<T: serde::Serialize>(params: &T) -> serde_json::Value {
    serde_json::to_value(params).unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()))
}

fn from_json<T: serde::de::DeserializeOwned>(fields: &serde_json::Value) -> Option<T> {
    serde_json::from_value(fields.clone()).ok()
}

/// Value-ready payload for matrix-producing kinds: the 16 column-major floats.
pub(crate) fn matrix_payload(matrix: &Matrix4<f32>) -> EventValue {
    EventValue::Json(json!({ "matrix": matrix.as_slice() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags_are_stable() {
        assert_eq!(NodeKind::Group.type_tag(), "group");
        assert_eq!(
            NodeKind::SphereGeometry(SphereGeometryNode::default()).type_tag(),
            "sphere"
        );
    }

    #[test]
    fn from_json_round_trips_every_tag() {
        for tag in [
            "group",
            "translate",
            "rotate",
            "scale",
            "perspective",
            "ortho",
            "box",
            "sphere",
            "material",
        ] {
            let kind = NodeKind::from_json(tag, &json!({})).expect(tag);
            assert_eq!(kind.type_tag(), tag);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(NodeKind::from_json("torus", &json!({})).is_none());
    }

    #[test]
    fn from_json_ignores_unknown_fields() {
        let kind = NodeKind::from_json("translate", &json!({"x": 2.0, "bogus": true})).unwrap();
        let fields = kind.own_json();
        assert_eq!(fields.get("x").and_then(serde_json::Value::as_f64), Some(2.0));
        assert!(fields.get("bogus").is_none());
    }
}
