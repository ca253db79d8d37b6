//! Projection nodes: perspective and orthographic
//!
//! Both compile into a projection `Matrix4<f32>`. Out-of-domain optics are
//! coerced and warned rather than rejected, so a bad resize callback distorts
//! a frame instead of killing the scene.

use crate::events::EventValue;
use crate::scene::Node;
use nalgebra::{Matrix4, Orthographic3, Perspective3};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{matrix_payload, NodeKind};

/// Reactive optics of a perspective projection. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveParams {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Viewport width / height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for PerspectiveParams {
    fn default() -> Self {
        Self {
            fovy: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveParams {
    fn matrix(self) -> Matrix4<f32> {
        Perspective3::new(self.aspect, self.fovy.to_radians(), self.near, self.far)
            .to_homogeneous()
    }
}

/// Perspective projection node.
#[derive(Debug, Clone)]
pub struct PerspectiveNode {
    pub(crate) params: PerspectiveParams,
    pub(crate) compiled: Matrix4<f32>,
}

impl PerspectiveNode {
    /// Create a perspective projection from optics.
    pub fn new(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::from_params(PerspectiveParams {
            fovy,
            aspect,
            near,
            far,
        })
    }

    pub(crate) fn from_params(params: PerspectiveParams) -> Self {
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

impl Default for PerspectiveNode {
    fn default() -> Self {
        Self::from_params(PerspectiveParams::default())
    }
}

/// Reactive extents of an orthographic projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrthoParams {
    /// Left clip plane.
    pub left: f32,
    /// Right clip plane.
    pub right: f32,
    /// Bottom clip plane.
    pub bottom: f32,
    /// Top clip plane.
    pub top: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for OrthoParams {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl OrthoParams {
    fn matrix(self) -> Matrix4<f32> {
        Orthographic3::new(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
        .to_homogeneous()
    }
}

/// Orthographic projection node.
#[derive(Debug, Clone)]
pub struct OrthoNode {
    pub(crate) params: OrthoParams,
    pub(crate) compiled: Matrix4<f32>,
}

impl OrthoNode {
    /// Create an orthographic projection from clip extents.
    pub fn new(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self::from_params(OrthoParams {
            left,
            right,
            bottom,
            top,
            near,
            far,
        })
    }

    pub(crate) fn from_params(params: OrthoParams) -> Self {
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

impl Default for OrthoNode {
    fn default() -> Self {
        Self::from_params(OrthoParams::default())
    }
}

impl Node {
    /// Set the full perspective optics. The field of view is clamped into
    /// `(0, 180)` degrees and distances are coerced non-negative, with
    /// warnings. Fires `optics`.
    pub fn set_optics(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) -> bool {
        let fovy = self.coerce_fovy(fovy);
        let aspect = self.coerce_non_negative("aspect", aspect);
        let near = self.coerce_non_negative("near", near);
        let far = self.coerce_non_negative("far", far);
        match &mut self.kind {
            NodeKind::Perspective(node) => {
                node.params = PerspectiveParams {
                    fovy,
                    aspect,
                    near,
                    far,
                };
            }
            _ => return self.wrong_kind("set_optics", "perspective"),
        }
        self.note_change(
            "optics",
            EventValue::Json(json!({
                "fovy": fovy,
                "aspect": aspect,
                "near": near,
                "far": far,
            })),
        );
        true
    }

    /// Set only the aspect ratio (the usual resize path). Fires `aspect`.
    pub fn set_aspect(&mut self, aspect: f32) -> bool {
        let aspect = self.coerce_non_negative("aspect", aspect);
        match &mut self.kind {
            NodeKind::Perspective(node) => {
                node.params.aspect = aspect;
            }
            _ => return self.wrong_kind("set_aspect", "perspective"),
        }
        self.note_change("aspect", EventValue::Number(f64::from(aspect)));
        true
    }

    /// Current perspective optics, if this is a perspective node.
    pub fn optics(&self) -> Option<(f32, f32, f32, f32)> {
        match &self.kind {
            NodeKind::Perspective(node) => Some((
                node.params.fovy,
                node.params.aspect,
                node.params.near,
                node.params.far,
            )),
            _ => None,
        }
    }

    /// Set orthographic clip extents. Fires `extents`.
    pub fn set_ortho_extents(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> bool {
        match &mut self.kind {
            NodeKind::Ortho(node) => {
                node.params = OrthoParams {
                    left,
                    right,
                    bottom,
                    top,
                    near,
                    far,
                };
            }
            _ => return self.wrong_kind("set_ortho_extents", "ortho"),
        }
        self.note_change(
            "extents",
            EventValue::Json(json!([left, right, bottom, top, near, far])),
        );
        true
    }

    /// Current orthographic extents, if this is an ortho node.
    pub fn ortho_extents(&self) -> Option<(f32, f32, f32, f32, f32, f32)> {
        match &self.kind {
            NodeKind::Ortho(node) => Some((
                node.params.left,
                node.params.right,
                node.params.bottom,
                node.params.top,
                node.params.near,
                node.params.far,
            )),
            _ => None,
        }
    }

    fn coerce_fovy(&mut self, fovy: f32) -> f32 {
        if fovy > 0.0 && fovy < 180.0 {
            fovy
        } else {
            let coerced = fovy.abs().clamp(0.1, 179.9);
            self.note_coercion("fovy", fovy, coerced);
            coerced
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn perspective_maps_near_plane_center() {
        let node = PerspectiveNode::new(90.0, 1.0, 1.0, 10.0);
        let projected = node.compiled.transform_point(&Point3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(projected.z, -1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn ortho_maps_extent_corners_to_clip_cube() {
        let node = OrthoNode::new(-2.0, 2.0, -1.0, 1.0, 0.1, 10.0);
        let projected = node.compiled.transform_point(&Point3::new(2.0, 1.0, -0.1));
        assert_relative_eq!(projected.x, 1.0, epsilon = 1.0e-5);
        assert_relative_eq!(projected.y, 1.0, epsilon = 1.0e-5);
    }

    #[test]
    fn rebuild_recomputes_after_param_change() {
        let mut node = PerspectiveNode::default();
        let before = node.compiled;
        node.params.aspect = 2.0;
        node.rebuild();
        assert_ne!(node.compiled, before);
    }
}
