//! # Scene Engine
//!
//! A retained-mode scene graph engine written in Rust.
//!
//! Applications build a graph of typed nodes (transforms, projections,
//! geometry builders, materials) owned by a [`scene::Scene`]. Property writes
//! are reactive: each setter validates its input, fires a named change event,
//! and marks the node dirty. Expensive derived state (matrices, generated
//! vertex data) is rebuilt lazily, coalesced to at most one rebuild per node
//! per frame tick. At render time the compiled snapshots are handed to an
//! external renderer through the [`render::RenderContext`] boundary.
//!
//! ## Features
//!
//! - **Reactive properties**: typed accessor pairs with coerce-and-warn
//!   validation and per-property change events
//! - **Event bus**: ordered synchronous dispatch, retained last values with
//!   replay-on-subscribe, handle-based unsubscription
//! - **Lazy rebuilds**: a scene-owned dirty set drained on each frame tick
//! - **Role attachment**: named child slots with automatic fallback to
//!   scene-registered defaults when a child is destroyed
//! - **JSON contract**: every node round-trips through
//!   `{ type, id, metadata?, children?, ...fields }`
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//!
//! let mut scene = Scene::new(SceneConfig::default());
//!
//! let sphere = scene.add(NodeKind::SphereGeometry(SphereGeometryNode::default()));
//! scene.update(&sphere, |node| {
//!     node.set_radius(2.0);
//! });
//!
//! // One rebuild happens on the next tick, however many writes occurred.
//! scene.tick(1.0 / 60.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod core;
pub mod events;
pub mod foundation;
pub mod nodes;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{Config, ConfigError, SceneConfig},
        events::{EventValue, Subscription},
        foundation::time::{FrameClock, Timer},
        nodes::{
            BoxGeometryNode, GeometryData, MaterialNode, MaterialState, OrthoNode,
            PerspectiveNode, RotateNode, ScaleNode, SphereGeometryNode, TranslateNode,
        },
        render::RenderContext,
        scene::{ChildSel, CompiledState, Node, NodeKind, NodeRef, Scene, SceneError, SceneId},
    };
}
