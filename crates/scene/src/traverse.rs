use arbor_common::NodeId;
use arbor_math::{Frustum, compose, try_inverse};
use arbor_render::{Backend, BackendError, ProgramHandle, Uniform};
use glam::DMat4;
use serde::Serialize;

use crate::error::RenderError;
use crate::node::{Node, RenderState};
use crate::renderable::RenderContext;
use crate::scene::Scene;

/// Per-frame counters from [`Scene::render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Nodes that passed the visibility and culling checks.
    pub visited: usize,
    /// Subtrees skipped by their visibility flag.
    pub hidden: usize,
    /// Subtrees rejected by the frustum.
    pub culled: usize,
    /// Successful render calls.
    pub rendered: usize,
    /// Nodes that failed for the first time this frame.
    pub failed: usize,
    /// Nodes skipped because they failed on an earlier frame.
    pub skipped: usize,
}

struct Frame {
    projection: DMat4,
    view: DMat4,
    camera_world: DMat4,
    frustum: Frustum,
}

impl Scene {
    /// Draw the scene through its active camera.
    ///
    /// Clears to the background color, then walks the root's children
    /// depth-first in insertion order. Hidden nodes and nodes whose world
    /// bounds miss the frustum are skipped together with their subtrees.
    /// A node whose program or render call fails is disabled and the rest
    /// of the frame continues. Without an active camera only the clear
    /// happens.
    pub fn render(&mut self, backend: &mut dyn Backend) -> Result<FrameStats, RenderError> {
        let _span = tracing::info_span!("scene_render", nodes = self.nodes.len()).entered();

        backend.clear_color(self.background);
        if let Some(viewport) = self.viewport {
            backend.viewport(viewport);
        }

        let Some(camera_id) = self.active_camera else {
            tracing::trace!("no active camera, frame cleared only");
            return Ok(FrameStats::default());
        };
        let frame = self.prepare_frame(camera_id)?;

        let mut stats = FrameStats::default();
        let Some(root) = self.nodes.get(&self.root) else {
            return Ok(stats);
        };
        let root_world = root.transform.matrix();
        for index in 0..root.num_children() {
            let Some(child) = self.nodes.get(&self.root).map(|r| r.child_at(index)) else {
                break;
            };
            self.render_node(backend, &frame, child, &root_world, &mut stats);
        }

        tracing::trace!(
            visited = stats.visited,
            hidden = stats.hidden,
            culled = stats.culled,
            rendered = stats.rendered,
            failed = stats.failed,
            skipped = stats.skipped,
            "frame rendered"
        );
        Ok(stats)
    }

    /// Camera world transform, view and frustum, once per frame.
    fn prepare_frame(&mut self, camera_id: NodeId) -> Result<Frame, RenderError> {
        let camera_world = self
            .world_transform(camera_id)
            .ok_or(RenderError::CameraNotFound(camera_id))?;
        let view = try_inverse(&camera_world)?;
        let camera = self
            .nodes
            .get_mut(&camera_id)
            .and_then(Node::camera_mut)
            .ok_or(RenderError::NotACamera(camera_id))?;
        camera.set_view(view);
        let projection = camera.projection();
        let frustum = *camera.frustum();
        Ok(Frame {
            projection,
            view,
            camera_world,
            frustum,
        })
    }

    fn render_node(
        &mut self,
        backend: &mut dyn Backend,
        frame: &Frame,
        id: NodeId,
        parent_world: &DMat4,
        stats: &mut FrameStats,
    ) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if !node.is_visible() {
            stats.hidden += 1;
            return;
        }

        let world = compose(parent_world, &node.transform.matrix());
        let bounds = node.kind.bounds();
        if !bounds.is_empty() && !frame.frustum.intersects_box(&bounds.transformed(&world)) {
            stats.culled += 1;
            tracing::trace!(node = %id, "culled");
            return;
        }
        stats.visited += 1;

        let ctx = RenderContext {
            projection: frame.projection,
            view: frame.view,
            camera_world: frame.camera_world,
            world,
        };
        draw(node, backend, &ctx, stats);

        let count = node.num_children();
        for index in 0..count {
            let Some(child) = self.nodes.get(&id).map(|n| n.child_at(index)) else {
                break;
            };
            self.render_node(backend, frame, child, &world, stats);
        }
    }
}

/// Create the node's program on first use or after its shader source
/// changed, then upload matrices and render.
fn draw(node: &mut Node, backend: &mut dyn Backend, ctx: &RenderContext, stats: &mut FrameStats) {
    let id = node.id();
    let Some(renderable) = node.kind.renderable_mut() else {
        return;
    };

    let shader = renderable.shader();
    let source_changed = node
        .built_from
        .as_ref()
        .is_some_and(|(vertex, fragment)| vertex != shader.vertex || fragment != shader.fragment);
    if source_changed {
        tracing::debug!(node = %id, "shader source changed, rebuilding program");
        node.render_state = RenderState::Pending;
    }

    let program = match node.render_state {
        RenderState::Failed => {
            stats.skipped += 1;
            tracing::trace!(node = %id, "skipping failed node");
            return;
        }
        RenderState::Ready(program) => program,
        RenderState::Pending => {
            node.built_from = Some((shader.vertex.to_string(), shader.fragment.to_string()));
            match backend.create_program(shader.vertex, shader.fragment) {
                Ok(program) => {
                    tracing::debug!(node = %id, %program, "program created");
                    node.render_state = RenderState::Ready(program);
                    program
                }
                Err(err) => {
                    tracing::warn!(node = %id, error = %err, "program creation failed, node disabled");
                    node.render_state = RenderState::Failed;
                    stats.failed += 1;
                    return;
                }
            }
        }
    };

    let result = upload_matrices(backend, program, ctx).and_then(|()| renderable.render(backend, program, ctx));
    match result {
        Ok(()) => stats.rendered += 1,
        Err(err) => {
            tracing::warn!(node = %id, error = %err, "render failed, node disabled");
            node.render_state = RenderState::Failed;
            stats.failed += 1;
        }
    }
}

fn upload_matrices(backend: &mut dyn Backend, program: ProgramHandle, ctx: &RenderContext) -> Result<(), BackendError> {
    backend.set_uniform(program, "proj", Uniform::Mat4(ctx.projection.as_mat4()))?;
    backend.set_uniform(program, "view", Uniform::Mat4(ctx.view.as_mat4()))?;
    backend.set_uniform(program, "transform", Uniform::Mat4(ctx.world.as_mat4()))
}
