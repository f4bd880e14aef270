use std::collections::BTreeMap;

use arbor_common::{Color, IdAllocator, NodeId, Transform};
use arbor_math::{compose, transform_point};
use arbor_render::Viewport;
use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::node::{Node, NodeKind};

/// A record appended by every structural change and lifecycle hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneEvent {
    ChildAdded { parent: NodeId, child: NodeId },
    ChildRemoved { parent: NodeId, child: NodeId },
    NodeDestroyed { id: NodeId },
    Entered,
    Exited,
}

/// A tree of nodes under a single root, plus what is needed to draw it.
///
/// Nodes live in an arena keyed by id; parent and child links are ids.
/// Nodes created with [`Scene::spawn`] start detached and join the tree
/// through [`Scene::add_child`]. The root is never drawn, but its transform
/// applies to everything under it.
#[derive(Debug)]
pub struct Scene {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) root: NodeId,
    ids: IdAllocator,
    pub(crate) background: Color,
    pub(crate) viewport: Option<Viewport>,
    pub(crate) active_camera: Option<NodeId>,
    entered: bool,
    event_log: Vec<SceneEvent>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut ids = IdAllocator::new();
        let root = ids.allocate();
        let mut nodes = BTreeMap::new();
        nodes.insert(root, Node::new(root, NodeKind::Group));
        Self {
            nodes,
            root,
            ids,
            background: Color::default(),
            viewport: None,
            active_camera: None,
            entered: false,
            event_log: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Nodes in the arena, attached or not, including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Viewport issued to the backend at clear time; `None` leaves it alone.
    pub fn set_viewport(&mut self, viewport: Option<Viewport>) {
        self.viewport = viewport;
    }

    pub fn active_camera(&self) -> Option<NodeId> {
        self.active_camera
    }

    pub fn set_active_camera(&mut self, id: NodeId) -> Result<(), SceneError> {
        let node = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?;
        if node.camera().is_none() {
            return Err(SceneError::NotACamera(id));
        }
        self.active_camera = Some(id);
        Ok(())
    }

    pub fn clear_active_camera(&mut self) {
        self.active_camera = None;
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }

    /// Called by the scene-stack owner when this scene becomes active.
    pub fn on_enter(&mut self) {
        self.entered = true;
        self.event_log.push(SceneEvent::Entered);
        tracing::debug!("scene entered");
    }

    /// Called by the scene-stack owner when this scene stops being active.
    pub fn on_exit(&mut self) {
        self.entered = false;
        self.event_log.push(SceneEvent::Exited);
        tracing::debug!("scene exited");
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Create a detached node.
    pub fn spawn(&mut self, kind: impl Into<NodeKind>) -> NodeId {
        let id = self.ids.allocate();
        self.nodes.insert(id, Node::new(id, kind.into()));
        id
    }

    /// Create a node directly under the root.
    pub fn add(&mut self, kind: impl Into<NodeKind>) -> NodeId {
        let id = self.spawn(kind);
        self.link(self.root, id);
        id
    }

    fn require(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(of);
        while let Some(id) = cursor {
            if id == candidate {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Attach `child` under `parent`, detaching it from any previous parent.
    ///
    /// Adding a node that is already a child of `parent` changes nothing.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.require(parent)?;
        let current = self.require(child)?.parent;
        if child == self.root {
            return Err(SceneError::RootCannotBeChild);
        }
        if self.is_ancestor(child, parent) {
            return Err(SceneError::CycleDetected { parent, child });
        }
        if current == Some(parent) {
            return Ok(());
        }
        if let Some(previous) = current {
            self.remove_child(previous, child);
        }
        self.link(parent, child);
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        let Some(tag) = self.nodes.get(&child).map(|n| n.tag().to_string()) else {
            return;
        };
        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return;
        };
        if !parent_node.children.push(child, &tag) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
            node.notify(|listener, node| listener.on_added(node));
        }
        self.event_log.push(SceneEvent::ChildAdded { parent, child });
        tracing::debug!(%parent, %child, "child added");
    }

    /// Detach the child at `index`. The child stays in the arena.
    ///
    /// Panics when `index` is out of range for `parent`'s children.
    pub fn remove_child_by_index(&mut self, parent: NodeId, index: usize) -> Result<NodeId, SceneError> {
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(SceneError::NodeNotFound(parent))?;
        let slot = parent_node.children.remove_at(index);
        let child = slot.id;
        if let Some(node) = self.nodes.get_mut(&child) {
            node.notify(|listener, node| listener.on_removed(node));
            node.parent = None;
        }
        self.event_log.push(SceneEvent::ChildRemoved { parent, child });
        tracing::debug!(%parent, %child, "child removed");
        Ok(child)
    }

    /// Detach `child` from `parent`. False when it is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.remove_child_by_id(parent, child)
    }

    pub fn remove_child_by_id(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(index) = self.nodes.get(&parent).and_then(|n| n.children.index_of(child)) else {
            return false;
        };
        self.remove_child_by_index(parent, index).is_ok()
    }

    pub fn remove_child_by_tag(&mut self, parent: NodeId, tag: &str) -> bool {
        let Some(index) = self.nodes.get(&parent).and_then(|n| n.children.index_of_tag(tag)) else {
            return false;
        };
        self.remove_child_by_index(parent, index).is_ok()
    }

    /// Detach `id` from its parent, if it has one.
    pub fn detach(&mut self, id: NodeId) -> bool {
        match self.nodes.get(&id).and_then(|n| n.parent) {
            Some(parent) => self.remove_child(parent, id),
            None => false,
        }
    }

    pub fn child_by_tag(&self, parent: NodeId, tag: &str) -> Option<&Node> {
        let id = self.nodes.get(&parent)?.child_by_tag(tag)?;
        self.nodes.get(&id)
    }

    pub fn child_by_id(&self, parent: NodeId, child: NodeId) -> Option<&Node> {
        let id = self.nodes.get(&parent)?.child_by_id(child)?;
        self.nodes.get(&id)
    }

    /// Set a node's tag and keep its parent's tag index in step.
    /// An empty tag removes it.
    pub fn set_tag(&mut self, id: NodeId, tag: &str) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        node.set_tag_raw(tag);
        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retag(id, tag);
            }
        }
        Ok(())
    }

    /// Remove `id` and its whole subtree from the scene.
    ///
    /// Returns how many nodes were dropped.
    pub fn destroy(&mut self, id: NodeId) -> Result<usize, SceneError> {
        if id == self.root {
            return Err(SceneError::RootCannotBeDestroyed);
        }
        self.require(id)?;
        self.detach(id);

        let mut stack = vec![id];
        let mut dropped = 0;
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.remove(&next) else {
                continue;
            };
            stack.extend(node.children());
            if self.active_camera == Some(next) {
                self.active_camera = None;
            }
            self.event_log.push(SceneEvent::NodeDestroyed { id: next });
            dropped += 1;
        }
        tracing::debug!(%id, dropped, "subtree destroyed");
        Ok(dropped)
    }

    /// Ids of `id` and everything under it, pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get(&next) else {
                continue;
            };
            out.push(next);
            // reversed so the first child is visited first
            let children: Vec<NodeId> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn depth(&self, id: NodeId) -> Option<usize> {
        let mut node = self.nodes.get(&id)?;
        let mut depth = 0;
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Run every attached node's `on_update`, root first, pre-order.
    pub fn update(&mut self) {
        let _span = tracing::debug_span!("scene_update").entered();
        for id in self.descendants(self.root) {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.notify(|listener, node| listener.on_update(node));
            }
        }
    }

    /// Local transform composed with every ancestor's, root first.
    pub fn world_transform(&self, id: NodeId) -> Option<DMat4> {
        let mut node = self.nodes.get(&id)?;
        let mut world = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            world = compose(&node.transform.matrix(), &world);
        }
        Some(world)
    }

    /// Map a point from `id`'s local space to world space.
    pub fn local_to_world(&self, id: NodeId, point: DVec3) -> Option<DVec3> {
        Some(transform_point(&self.world_transform(id)?, point))
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))?;
        node.transform = transform;
        Ok(())
    }

    /// Rotate `id` to face a world-space `target`.
    ///
    /// Cameras point their -Z axis at the target, everything else +Z. Does
    /// nothing when the target coincides with the node's position.
    pub fn look_at(&mut self, id: NodeId, target: DVec3) -> Result<(), SceneError> {
        let world = self.world_transform(id).ok_or(SceneError::NodeNotFound(id))?;
        let eye = world.w_axis.truncate();
        let Some(forward) = (target - eye).try_normalize() else {
            return Ok(());
        };

        let node = self.require(id)?;
        let z_axis = if node.camera().is_some() { -forward } else { forward };
        let up = if z_axis.cross(DVec3::Y).length_squared() < 1e-12 {
            DVec3::Z
        } else {
            DVec3::Y
        };
        let x_axis = up.cross(z_axis).normalize();
        let y_axis = z_axis.cross(x_axis);
        let world_rotation = DQuat::from_mat3(&DMat3::from_cols(x_axis, y_axis, z_axis));

        let parent_rotation = match node.parent.and_then(|p| self.world_transform(p)) {
            Some(parent_world) => parent_world.to_scale_rotation_translation().1,
            None => DQuat::IDENTITY,
        };
        let local = (parent_rotation.inverse() * world_rotation).normalize();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform.rotation = local;
        }
        Ok(())
    }
}
