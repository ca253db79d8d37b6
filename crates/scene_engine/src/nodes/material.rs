//! Material node
//!
//! The cheapest derived-state kind: the compiled snapshot is just the
//! validated color values, but it participates in the same dirty/rebuild
//! cycle as everything else so renderers observe one consistent protocol.

use crate::events::EventValue;
use crate::scene::Node;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::NodeKind;

/// Renderer-ready material values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialState {
    /// RGBA base color, each channel in `[0, 1]`.
    pub base_color: [f32; 4],
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Reactive material parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialParams {
    /// RGBA base color.
    pub color: [f32; 4],
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Base-color material node.
#[derive(Debug, Clone)]
pub struct MaterialNode {
    pub(crate) params: MaterialParams,
    pub(crate) compiled: MaterialState,
}

impl MaterialNode {
    /// Create a material with the given RGBA base color.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self::from_params(MaterialParams {
            color: [r, g, b, a],
        })
    }

    pub(crate) fn from_params(params: MaterialParams) -> Self {
        Self {
            compiled: MaterialState {
                base_color: params.color,
            },
            params,
        }
    }

    pub(crate) fn rebuild(&mut self) -> EventValue {
        self.compiled = MaterialState {
            base_color: self.params.color,
        };
        EventValue::Json(json!({ "color": self.params.color }))
    }
}

impl Default for MaterialNode {
    fn default() -> Self {
        Self::from_params(MaterialParams::default())
    }
}

impl Node {
    /// Set the RGBA base color. Channels outside `[0, 1]` are clamped with a
    /// warning. Fires `color`.
    pub fn set_base_color(&mut self, r: f32, g: f32, b: f32, a: f32) -> bool {
        let r = self.coerce_unit("color.r", r);
        let g = self.coerce_unit("color.g", g);
        let b = self.coerce_unit("color.b", b);
        let a = self.coerce_unit("color.a", a);
        match &mut self.kind {
            NodeKind::Material(node) => {
                node.params.color = [r, g, b, a];
            }
            _ => return self.wrong_kind("set_base_color", "material"),
        }
        self.note_change("color", EventValue::Json(json!([r, g, b, a])));
        true
    }

    /// Current base color, if this is a material node.
    pub fn base_color(&self) -> Option<[f32; 4]> {
        match &self.kind {
            NodeKind::Material(node) => Some(node.params.color),
            _ => None,
        }
    }
}
