use std::fmt;

use arbor_math::Box3;
use arbor_render::{Backend, BackendError, ProgramHandle};
use glam::DMat4;

/// Matrices handed to a node when it is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub projection: DMat4,
    /// Inverse of `camera_world`.
    pub view: DMat4,
    pub camera_world: DMat4,
    /// Accumulated local-to-world transform of the node being drawn.
    pub world: DMat4,
}

/// Vertex and fragment source for a node's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// Per-node render contract used by traversal.
///
/// Traversal creates the program from [`Renderable::shader`] once, uploads
/// the `proj`, `view` and `transform` uniforms, then calls
/// [`Renderable::render`]. An error from either step disables the node
/// until its shader source changes. A change of source builds a new program.
pub trait Renderable: fmt::Debug {
    /// Local-space bounds. An empty box opts out of culling.
    fn bounds(&self) -> Box3 {
        Box3::EMPTY
    }

    fn shader(&self) -> ShaderSource<'_>;

    fn render(
        &mut self,
        backend: &mut dyn Backend,
        program: ProgramHandle,
        ctx: &RenderContext,
    ) -> Result<(), BackendError>;
}
