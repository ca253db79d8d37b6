//! Scene graph core
//!
//! The [`Scene`] owns every [`Node`], the default-instance table, the parent
//! back-edge index, and the frame clock that drives lazy rebuilds.
//! Application code holds [`NodeRef`] handles and goes through the scene for
//! every mutation; that is what keeps event dispatch, dirty scheduling, and
//! the log channel consistent.

pub mod error;
mod node;
#[allow(clippy::module_inception)]
mod scene;
mod serialize;

pub use crate::nodes::{CompiledState, NodeKind};
pub use error::SceneError;
pub use node::{Node, NodeRef, SceneId};
pub use scene::{ChildSel, Scene};
