//! JSON serialization contract
//!
//! A node serializes to a flat object: the kind's own parameter fields plus
//! `id`, `type`, a `children` object mapping role names to child ids, and a
//! free-form `metadata` object. Reconstruction dispatches on `type` (required;
//! a missing or unrecognized tag is reported), tolerates missing parameter
//! fields (defaults apply) and unknown fields (ignored), and re-wires
//! `children` by id against the scene registry.

use crate::nodes::NodeKind;
use crate::scene::node::{Node, NodeRef};
use crate::scene::scene::{ChildSel, Scene};
use crate::scene::SceneError;
use serde_json::{Map, Value};

impl Node {
    /// Serialize this node to its flat JSON form.
    ///
    /// Only declarative state crosses: parameters, identity, attachment by
    /// id, metadata. Compiled snapshots, subscriptions, and the dirty flag
    /// are derived or session-local and are deliberately absent.
    pub fn to_json(&self) -> Value {
        let mut fields = self.kind.own_json();
        if !self.core.metadata.is_empty() {
            fields.insert(
                "metadata".to_owned(),
                Value::Object(self.core.metadata.clone()),
            );
        }
        if !self.core.children.is_empty() {
            let children: Map<String, Value> = self
                .core
                .children
                .iter()
                .map(|(role, id)| (role.clone(), Value::String(id.clone())))
                .collect();
            fields.insert("children".to_owned(), Value::Object(children));
        }
        fields.insert("id".to_owned(), Value::String(self.core.id.clone()));
        fields.insert(
            "type".to_owned(),
            Value::String(self.core.type_tag.to_owned()),
        );
        Value::Object(fields)
    }
}

impl Scene {
    /// Reconstruct a node from its serialized form and register it.
    ///
    /// An explicit `id` is honored (duplicate ids fail the registration); a
    /// missing `id` gets an engine-generated one. `children` entries naming
    /// ids absent from the registry are logged and skipped, the rest of the
    /// node still lands.
    pub fn reconstruct(&mut self, json: &Value) -> Option<NodeRef> {
        let Some(fields) = json.as_object() else {
            let error = SceneError::UnknownNodeType {
                tag: json.to_string(),
            };
            self.report_reconstruct(&error);
            return None;
        };
        let Some(tag) = fields.get("type").and_then(Value::as_str) else {
            let error = SceneError::UnknownNodeType {
                tag: "(missing)".to_owned(),
            };
            self.report_reconstruct(&error);
            return None;
        };
        let Some(kind) = NodeKind::from_json(tag, json) else {
            let error = SceneError::UnknownNodeType {
                tag: tag.to_owned(),
            };
            self.report_reconstruct(&error);
            return None;
        };

        let node_ref = match fields.get("id").and_then(Value::as_str) {
            Some(id) => self.add_with_id(id, kind)?,
            None => self.add(kind),
        };

        if let Some(Value::Object(metadata)) = fields.get("metadata") {
            let _ = self.update(&node_ref, |node| {
                node.metadata_mut().clone_from(metadata);
            });
        }
        if let Some(Value::Object(children)) = fields.get("children") {
            for (role, child) in children {
                if let Some(child_id) = child.as_str() {
                    self.set_child(&node_ref, role, ChildSel::Id(child_id.to_owned()));
                }
            }
        }
        Some(node_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn sphere_round_trips_through_json() {
        let mut scene = Scene::default();
        let sphere = scene.add(NodeKind::SphereGeometry(SphereGeometryNode::new(2.5)));
        scene.update(&sphere, |n| {
            n.set_radius(3.0);
            n.metadata_mut()
                .insert("label".to_owned(), json!("hero-sphere"));
        });

        let serialized = scene.node(&sphere).unwrap().to_json();
        assert_eq!(serialized["type"], json!("sphere"));
        assert_relative_eq!(serialized["radius"].as_f64().unwrap(), 3.0);
        assert_eq!(serialized["metadata"]["label"], json!("hero-sphere"));

        let mut other = Scene::default();
        let restored = other.reconstruct(&serialized).unwrap();
        let node = other.node(&restored).unwrap();
        assert_eq!(node.type_tag(), "sphere");
        assert_relative_eq!(node.radius().unwrap(), 3.0);
        assert_eq!(node.metadata()["label"], json!("hero-sphere"));
    }

    #[test]
    fn children_serialize_as_role_to_id_map() {
        let mut scene = Scene::default();
        let group = scene.add(NodeKind::Group);
        let material = scene.add_with_id("mat-1", NodeKind::Material(MaterialNode::default()));
        scene.set_child(&group, "material", ChildSel::from(&material.unwrap()));

        let serialized = scene.node(&group).unwrap().to_json();
        assert_eq!(serialized["children"]["material"], json!("mat-1"));
    }

    #[test]
    fn reconstruct_rewires_children_by_id() {
        let mut scene = Scene::default();
        scene.add_with_id("mat-1", NodeKind::Material(MaterialNode::default()));
        let restored = scene
            .reconstruct(&json!({
                "type": "group",
                "id": "g-1",
                "children": { "material": "mat-1" },
            }))
            .unwrap();
        assert_eq!(
            scene.child_of(&restored, "material").unwrap().id(),
            "mat-1"
        );
    }

    #[test]
    fn reconstruct_skips_dangling_child_references() {
        let mut scene = Scene::default();
        let restored = scene
            .reconstruct(&json!({
                "type": "group",
                "children": { "material": "never-registered" },
            }))
            .unwrap();
        assert!(scene.child_of(&restored, "material").is_none());
    }

    #[test]
    fn unknown_type_tag_fails_reconstruction() {
        let mut scene = Scene::default();
        assert!(scene.reconstruct(&json!({ "type": "torus" })).is_none());
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn missing_type_tag_fails_reconstruction() {
        let mut scene = Scene::default();
        assert!(scene.reconstruct(&json!({ "radius": 2.0 })).is_none());
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn duplicate_id_fails_reconstruction() {
        let mut scene = Scene::default();
        scene.add_with_id("g-1", NodeKind::Group);
        assert!(scene
            .reconstruct(&json!({ "type": "group", "id": "g-1" }))
            .is_none());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let mut scene = Scene::default();
        let restored = scene.reconstruct(&json!({ "type": "perspective" })).unwrap();
        let (fovy, aspect, near, far) = scene.node(&restored).unwrap().optics().unwrap();
        assert_relative_eq!(fovy, 60.0);
        assert_relative_eq!(aspect, 1.0);
        assert_relative_eq!(near, 0.1);
        assert_relative_eq!(far, 1000.0);
    }

    #[test]
    fn derived_state_never_serializes() {
        let mut scene = Scene::default();
        let translate = scene.add(NodeKind::Translate(TranslateNode::new(1.0, 2.0, 3.0)));
        let serialized = scene.node(&translate).unwrap().to_json();
        let fields = serialized.as_object().unwrap();
        assert!(!fields.contains_key("matrix"));
        assert!(!fields.contains_key("dirty"));
        assert!(!fields.contains_key("destroyed"));
    }
}
