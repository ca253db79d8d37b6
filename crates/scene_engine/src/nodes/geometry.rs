//! Geometry builder nodes: box and sphere
//!
//! The generated vertex data is the canonical "expensive derived state" of
//! the engine: many property writes per frame, one generation pass per tick.
//! The generators themselves are deliberately simple face/lat-long builders.

use crate::events::EventValue;
use crate::scene::Node;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::NodeKind;

/// Renderer-ready vertex data produced by a geometry rebuild.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals, parallel to `positions`.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indexing into `positions`.
    pub indices: Vec<u32>,
}

impl GeometryData {
    fn payload(&self) -> EventValue {
        EventValue::Json(json!({
            "vertices": self.positions.len(),
            "indices": self.indices.len(),
        }))
    }
}

/// Reactive half-extent parameters of a box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxParams {
    /// Half-extent along X.
    pub xsize: f32,
    /// Half-extent along Y.
    pub ysize: f32,
    /// Half-extent along Z.
    pub zsize: f32,
}

impl Default for BoxParams {
    fn default() -> Self {
        Self {
            xsize: 1.0,
            ysize: 1.0,
            zsize: 1.0,
        }
    }
}

/// Box geometry builder node.
#[derive(Debug, Clone)]
pub struct BoxGeometryNode {
    pub(crate) params: BoxParams,
    pub(crate) compiled: GeometryData,
}

impl BoxGeometryNode {
    /// Create a box with the given half-extents.
    pub fn new(xsize: f32, ysize: f32, zsize: f32) -> Self {
        Self::from_params(BoxParams {
            xsize,
            ysize,
            zsize,
        })
    }

    pub(crate) fn from_params(params: BoxParams) -> Self {
        Self {
            compiled: build_box(params),
            params,
        }
    }

    pub(crate) fn rebuild(&mut self) -> EventValue {
        self.compiled = build_box(self.params);
        self.compiled.payload()
    }
}

impl Default for BoxGeometryNode {
    fn default() -> Self {
        Self::from_params(BoxParams::default())
    }
}

/// Reactive parameters of a lat-long sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereParams {
    /// Sphere radius.
    pub radius: f32,
    /// Longitudinal subdivisions (minimum 3).
    pub slices: u32,
    /// Latitudinal subdivisions (minimum 2).
    pub rings: u32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            slices: 16,
            rings: 12,
        }
    }
}

/// Sphere geometry builder node.
#[derive(Debug, Clone)]
pub struct SphereGeometryNode {
    pub(crate) params: SphereParams,
    pub(crate) compiled: GeometryData,
}

impl SphereGeometryNode {
    /// Create a sphere of `radius` with default tessellation.
    pub fn new(radius: f32) -> Self {
        Self::from_params(SphereParams {
            radius,
            ..SphereParams::default()
        })
    }

    pub(crate) fn from_params(params: SphereParams) -> Self {
        Self {
            compiled: build_sphere(params),
            params,
        }
    }

    pub(crate) fn rebuild(&mut self) -> EventValue {
        self.compiled = build_sphere(self.params);
        self.compiled.payload()
    }
}

impl Default for SphereGeometryNode {
    fn default() -> Self {
        Self::from_params(SphereParams::default())
    }
}

/// One quad face per axis direction: (normal, u axis, v axis).
const BOX_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
];

fn build_box(params: BoxParams) -> GeometryData {
    let half = [params.xsize, params.ysize, params.zsize];
    let mut data = GeometryData::default();

    for (normal, u_axis, v_axis) in BOX_FACES {
        let base = u32::try_from(data.positions.len()).unwrap_or(u32::MAX);
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let mut position = [0.0_f32; 3];
            for axis in 0..3 {
                position[axis] =
                    (normal[axis] + u_axis[axis] * su + v_axis[axis] * sv) * half[axis];
            }
            data.positions.push(position);
            data.normals.push(normal);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    data
}

fn build_sphere(params: SphereParams) -> GeometryData {
    let slices = params.slices.max(3);
    let rings = params.rings.max(2);
    let radius = params.radius;
    let mut data = GeometryData::default();

    for ring in 0..=rings {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();
        for slice in 0..=slices {
            let phi = std::f32::consts::TAU * slice as f32 / slices as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.normals.push(normal);
            data.positions
                .push([normal[0] * radius, normal[1] * radius, normal[2] * radius]);
        }
    }

    let stride = slices + 1;
    for ring in 0..rings {
        for slice in 0..slices {
            let a = ring * stride + slice;
            let b = a + stride;
            data.indices
                .extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
        }
    }
    data
}

impl Node {
    /// Set the box half-extents. Negative extents are coerced to their
    /// absolute value with a warning. Fires `size`.
    pub fn set_box_size(&mut self, xsize: f32, ysize: f32, zsize: f32) -> bool {
        let xsize = self.coerce_non_negative("xsize", xsize);
        let ysize = self.coerce_non_negative("ysize", ysize);
        let zsize = self.coerce_non_negative("zsize", zsize);
        match &mut self.kind {
            NodeKind::BoxGeometry(node) => {
                node.params = BoxParams {
                    xsize,
                    ysize,
                    zsize,
                };
            }
            _ => return self.wrong_kind("set_box_size", "box"),
        }
        self.note_change("size", EventValue::Json(json!([xsize, ysize, zsize])));
        true
    }

    /// Current box half-extents, if this is a box node.
    pub fn box_size(&self) -> Option<(f32, f32, f32)> {
        match &self.kind {
            NodeKind::BoxGeometry(node) => Some((
                node.params.xsize,
                node.params.ysize,
                node.params.zsize,
            )),
            _ => None,
        }
    }

    /// Set the sphere radius. A negative radius is coerced to its absolute
    /// value with a warning. Fires `radius` with the stored value.
    pub fn set_radius(&mut self, radius: f32) -> bool {
        let radius = self.coerce_non_negative("radius", radius);
        match &mut self.kind {
            NodeKind::SphereGeometry(node) => {
                node.params.radius = radius;
            }
            _ => return self.wrong_kind("set_radius", "sphere"),
        }
        self.note_change("radius", EventValue::Number(f64::from(radius)));
        true
    }

    /// Current sphere radius, if this is a sphere node.
    pub fn radius(&self) -> Option<f32> {
        match &self.kind {
            NodeKind::SphereGeometry(node) => Some(node.params.radius),
            _ => None,
        }
    }

    /// Set sphere tessellation. Values below the 3-slice/2-ring floor are
    /// raised to it with a warning. Fires `detail`.
    pub fn set_sphere_detail(&mut self, slices: u32, rings: u32) -> bool {
        if slices < 3 {
            self.note_coercion("slices", slices as f32, 3.0);
        }
        if rings < 2 {
            self.note_coercion("rings", rings as f32, 2.0);
        }
        let slices = slices.max(3);
        let rings = rings.max(2);
        match &mut self.kind {
            NodeKind::SphereGeometry(node) => {
                node.params.slices = slices;
                node.params.rings = rings;
            }
            _ => return self.wrong_kind("set_sphere_detail", "sphere"),
        }
        self.note_change(
            "detail",
            EventValue::Json(json!({ "slices": slices, "rings": rings })),
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn box_has_24_vertices_and_36_indices() {
        let node = BoxGeometryNode::default();
        assert_eq!(node.compiled.positions.len(), 24);
        assert_eq!(node.compiled.normals.len(), 24);
        assert_eq!(node.compiled.indices.len(), 36);
    }

    #[test]
    fn box_vertices_lie_on_half_extents() {
        let node = BoxGeometryNode::new(2.0, 3.0, 4.0);
        for position in &node.compiled.positions {
            assert_relative_eq!(position[0].abs(), 2.0);
            assert_relative_eq!(position[1].abs(), 3.0);
            assert_relative_eq!(position[2].abs(), 4.0);
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let node = SphereGeometryNode::new(3.0);
        for position in &node.compiled.positions {
            let length =
                (position[0].powi(2) + position[1].powi(2) + position[2].powi(2)).sqrt();
            assert_relative_eq!(length, 3.0, epsilon = 1.0e-4);
        }
    }

    #[test]
    fn sphere_counts_match_tessellation() {
        let params = SphereParams {
            radius: 1.0,
            slices: 8,
            rings: 4,
        };
        let data = build_sphere(params);
        assert_eq!(data.positions.len(), (8 + 1) * (4 + 1));
        assert_eq!(data.indices.len(), (8 * 4 * 6) as usize);
    }

    #[test]
    fn sphere_tessellation_floor_is_enforced() {
        let data = build_sphere(SphereParams {
            radius: 1.0,
            slices: 0,
            rings: 0,
        });
        assert_eq!(data.positions.len(), (3 + 1) * (2 + 1));
    }

    #[test]
    fn sphere_indices_are_in_range() {
        let node = SphereGeometryNode::default();
        let count = node.compiled.positions.len() as u32;
        assert!(node.compiled.indices.iter().all(|i| *i < count));
    }
}
