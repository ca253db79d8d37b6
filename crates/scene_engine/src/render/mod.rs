//! Compiler boundary to the renderer collaborator
//!
//! The engine never inspects renderer internals. At render time the scene
//! walks the attachment graph and hands each node's compiled snapshot, by
//! reference, to a [`RenderContext`] implementation. Turning snapshots into
//! draw calls (shader compilation, uniform and texture binding) is entirely
//! the collaborator's business.

use crate::nodes::{GeometryData, MaterialState};
use nalgebra::Matrix4;

/// Receiver for compiled scene state.
///
/// One callback per compiled-state category; `id` identifies the producing
/// node so the collaborator can cache GPU resources across frames.
pub trait RenderContext {
    /// A transform node's model matrix.
    fn transform(&mut self, id: &str, matrix: &Matrix4<f32>);

    /// A projection node's matrix.
    fn projection(&mut self, id: &str, matrix: &Matrix4<f32>);

    /// A material node's renderer-ready values.
    fn material(&mut self, id: &str, state: &MaterialState);

    /// A geometry node's generated vertex data.
    fn geometry(&mut self, id: &str, data: &GeometryData);
}
