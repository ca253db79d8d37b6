//! Transform nodes: translate, rotate, scale
//!
//! Each compiles its parameters into a `Matrix4<f32>` snapshot. The setters
//! are typed accessor pairs: validate, store, fire the named change event,
//! flag the node for a rebuild on the scene's next tick.

use crate::events::EventValue;
use crate::scene::Node;
use nalgebra::{Matrix4, Unit, Vector3};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{matrix_payload, NodeKind};

/// Reactive parameters of a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TranslateParams {
    /// Offset along X.
    pub x: f32,
    /// Offset along Y.
    pub y: f32,
    /// Offset along Z.
    pub z: f32,
}

impl TranslateParams {
    fn matrix(self) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(self.x, self.y, self.z))
    }
}

/// Translation transform node.
#[derive(Debug, Clone)]
pub struct TranslateNode {
    pub(crate) params: TranslateParams,
    pub(crate) compiled: Matrix4<f32>,
}

impl TranslateNode {
    /// Create a translation by `(x, y, z)`.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self::from_params(TranslateParams { x, y, z })
    }

    pub(crate) fn from_params(params: TranslateParams) -> Self {
        Self {
            compiled: params.matrix(),
            params,
        }
    }

    pub(crate) fn rebuild(&mut self) -> EventValue {
        self.compiled = self.params.matrix();
        matrix_payload(&self.compiled)
    }
}

impl Default for TranslateNode {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Reactive parameters of an axis-angle rotation. Angle is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateParams {
    /// Rotation angle in degrees.
    pub angle: f32,
    /// Axis X component.
    pub x: f32,
    /// Axis Y component.
    pub y: f32,
    /// Axis Z component.
    pub z: f32,
}

impl Default for RotateParams {
    fn default() -> Self {
        Self {
            angle: 0.0,
            x: 0.0,
            y: 1.0,
            z: 0.0,
        }
    }
}

impl RotateParams {
    fn matrix(self) -> Matrix4<f32> {
        let axis = Vector3::new(self.x, self.y, self.z);
        // Degenerate axis compiles to identity; the setter has already warned.
        Unit::try_new(axis, 1.0e-6).map_or_else(Matrix4::identity, |axis| {
            Matrix4::from_axis_angle(&axis, self.angle.to_radians())
        })
    }
}

/// Axis-angle rotation transform node.
#[derive(Debug, Clone)]
pub struct RotateNode {
    pub(crate) params: RotateParams,
    pub(crate) compiled: Matrix4<f32>,
}

impl RotateNode {
    /// Create a rotation of `angle` degrees around `(x, y, z)`.
    pub fn new(angle: f32, x: f32, y: f32, z: f32) -> Self {
        Self::from_params(RotateParams { angle, x, y, z })
    }

    pub(crate) fn from_params(params: RotateParams) -> Self {
        Self {
            compiled: params.matrix(),
            params,
        }
    }

    pub(crate) fn rebuild(&mut self) -> EventValue {
        self.compiled = self.params.matrix();
        matrix_payload(&self.compiled)
    }
}

impl Default for RotateNode {
    fn default() -> Self {
        Self::from_params(RotateParams::default())
    }
}

/// Reactive parameters of a non-uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleParams {
    /// Scale factor along X.
    pub x: f32,
    /// Scale factor along Y.
    pub y: f32,
    /// Scale factor along Z.
    pub z: f32,
}

impl Default for ScaleParams {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

impl ScaleParams {
    fn matrix(self) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(self.x, self.y, self.z))
    }
}

/// Non-uniform scale transform node.
#[derive(Debug, Clone)]
pub struct ScaleNode {
    pub(crate) params: ScaleParams,
    pub(crate) compiled: Matrix4<f32>,
}

impl ScaleNode {
    /// Create a scale by `(x, y, z)`. Negative factors mirror, so they are
    /// a valid domain here.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self::from_params(ScaleParams { x, y, z })
    }

    pub(crate) fn from_params(params: ScaleParams) -> Self {
        Self {
            compiled: params.matrix(),
            params,
        }
    }

    pub(crate) fn rebuild(&mut self) -> EventValue {
        self.compiled = self.params.matrix();
        matrix_payload(&self.compiled)
    }
}

impl Default for ScaleNode {
    fn default() -> Self {
        Self::from_params(ScaleParams::default())
    }
}

impl Node {
    /// Set the translation offset. Fires `translation`.
    pub fn set_translation(&mut self, x: f32, y: f32, z: f32) -> bool {
        match &mut self.kind {
            NodeKind::Translate(node) => {
                node.params = TranslateParams { x, y, z };
            }
            _ => return self.wrong_kind("set_translation", "translate"),
        }
        self.note_change("translation", EventValue::Json(json!([x, y, z])));
        true
    }

    /// Current translation offset, if this is a translate node.
    pub fn translation(&self) -> Option<(f32, f32, f32)> {
        match &self.kind {
            NodeKind::Translate(node) => {
                Some((node.params.x, node.params.y, node.params.z))
            }
            _ => None,
        }
    }

    /// Set the rotation angle in degrees, keeping the current axis.
    /// Fires `angle`.
    pub fn set_angle(&mut self, degrees: f32) -> bool {
        match &mut self.kind {
            NodeKind::Rotate(node) => {
                node.params.angle = degrees;
            }
            _ => return self.wrong_kind("set_angle", "rotate"),
        }
        self.note_change("angle", EventValue::Number(f64::from(degrees)));
        true
    }

    /// Set angle (degrees) and axis together. A zero-length axis is coerced
    /// to +Y with a warning. Fires `rotation`.
    pub fn set_rotation(&mut self, degrees: f32, x: f32, y: f32, z: f32) -> bool {
        if !matches!(self.kind, NodeKind::Rotate(_)) {
            return self.wrong_kind("set_rotation", "rotate");
        }
        let (x, y, z) = if x == 0.0 && y == 0.0 && z == 0.0 {
            self.push_warning("zero-length rotation axis, using +Y".to_owned());
            (0.0, 1.0, 0.0)
        } else {
            (x, y, z)
        };
        if let NodeKind::Rotate(node) = &mut self.kind {
            node.params = RotateParams {
                angle: degrees,
                x,
                y,
                z,
            };
        }
        self.note_change("rotation", EventValue::Json(json!([degrees, x, y, z])));
        true
    }

    /// Current rotation angle in degrees, if this is a rotate node.
    pub fn angle(&self) -> Option<f32> {
        match &self.kind {
            NodeKind::Rotate(node) => Some(node.params.angle),
            _ => None,
        }
    }

    /// Set the scale factors. Fires `scale`.
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) -> bool {
        match &mut self.kind {
            NodeKind::Scale(node) => {
                node.params = ScaleParams { x, y, z };
            }
            _ => return self.wrong_kind("set_scale", "scale"),
        }
        self.note_change("scale", EventValue::Json(json!([x, y, z])));
        true
    }

    /// Current scale factors, if this is a scale node.
    pub fn scale(&self) -> Option<(f32, f32, f32)> {
        match &self.kind {
            NodeKind::Scale(node) => Some((node.params.x, node.params.y, node.params.z)),
            _ => None,
        }
    }
}
