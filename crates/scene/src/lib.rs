//! Scene graph: node hierarchy, cameras, and culled render traversal.
//!
//! # Invariants
//! - A node has at most one parent and appears in at most one child list.
//! - Child lookup by id and tag stays consistent under swap-removal.
//! - `world(node) = compose(world(parent), local(node))`; a node without a
//!   parent uses its local transform.
//! - A camera's projection and frustum are recomputed only after a lens
//!   change, at most once per change.
//! - Traversal visits children in insertion order; a culled or hidden node
//!   takes its whole subtree with it.
//! - A node whose backend program or render call fails stays disabled until
//!   its shader source changes; the rest of the frame continues.

mod camera;
mod error;
mod mesh;
mod node;
mod renderable;
mod scene;
mod traverse;

pub use camera::{
    Camera, DEFAULT_FAR, DEFAULT_NEAR, Lens, OrthographicLens, PerspectiveLens, ViewOffset,
};
pub use error::{CameraError, RenderError, SceneError};
pub use mesh::{BASIC_FRAGMENT_SHADER, BASIC_VERTEX_SHADER, Material, Mesh};
pub use node::{ChildSlot, Hierarchy, Node, NodeKind, NodeListener, RenderState};
pub use renderable::{RenderContext, Renderable, ShaderSource};
pub use scene::{Scene, SceneEvent};
pub use traverse::FrameStats;

pub fn crate_info() -> &'static str {
    "arbor-scene v0.1.0"
}
