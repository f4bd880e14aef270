use std::collections::HashMap;
use std::fmt;

use arbor_common::{NodeId, Transform};
use arbor_math::Box3;
use arbor_render::ProgramHandle;

use crate::camera::Camera;
use crate::mesh::Mesh;
use crate::renderable::Renderable;

/// What a node is, beyond its place in the hierarchy.
#[derive(Debug)]
pub enum NodeKind {
    /// Pure transform node; draws nothing.
    Group,
    Mesh(Mesh),
    Camera(Camera),
    Custom(Box<dyn Renderable>),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Mesh(_) => "mesh",
            NodeKind::Camera(_) => "camera",
            NodeKind::Custom(_) => "custom",
        }
    }

    /// Local-space bounds; empty for nodes that are never culled.
    pub fn bounds(&self) -> Box3 {
        match self {
            NodeKind::Group | NodeKind::Camera(_) => Box3::EMPTY,
            NodeKind::Mesh(mesh) => mesh.bounds(),
            NodeKind::Custom(custom) => custom.bounds(),
        }
    }

    pub fn renderable_mut(&mut self) -> Option<&mut dyn Renderable> {
        match self {
            NodeKind::Group | NodeKind::Camera(_) => None,
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Custom(custom) => Some(custom.as_mut()),
        }
    }
}

impl From<Mesh> for NodeKind {
    fn from(mesh: Mesh) -> Self {
        NodeKind::Mesh(mesh)
    }
}

impl From<Camera> for NodeKind {
    fn from(camera: Camera) -> Self {
        NodeKind::Camera(camera)
    }
}

/// Lazily created backend program of a drawable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Pending,
    Ready(ProgramHandle),
    /// Program creation or a render call failed; not retried until the
    /// shader source changes or the state is reset.
    Failed,
}

/// Callbacks a node receives from its scene.
///
/// `on_removed` runs while the node still knows its parent and tag.
pub trait NodeListener {
    fn on_added(&mut self, _node: &Node) {}
    fn on_removed(&mut self, _node: &Node) {}
    fn on_update(&mut self, _node: &Node) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSlot {
    pub id: NodeId,
    pub tag: String,
}

/// Ordered children with O(1) lookup by id and tag.
///
/// Removal swaps the last child into the vacated slot. Tags are unique per
/// parent with last write wins: an index entry is only touched when it
/// still points at the slot being changed.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    slots: Vec<ChildSlot>,
    by_id: HashMap<NodeId, usize>,
    by_tag: HashMap<String, usize>,
}

impl Hierarchy {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Panics when `index` is out of range.
    pub fn get(&self, index: usize) -> NodeId {
        match self.slots.get(index) {
            Some(slot) => slot.id,
            None => panic!("child index {index} out of range for {} children", self.slots.len()),
        }
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn index_of_tag(&self, tag: &str) -> Option<usize> {
        if tag.is_empty() {
            return None;
        }
        self.by_tag.get(tag).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    /// Append a child. Returns false if it is already present.
    pub fn push(&mut self, id: NodeId, tag: &str) -> bool {
        if self.by_id.contains_key(&id) {
            return false;
        }
        let index = self.slots.len();
        self.by_id.insert(id, index);
        if !tag.is_empty() {
            self.by_tag.insert(tag.to_string(), index);
        }
        self.slots.push(ChildSlot {
            id,
            tag: tag.to_string(),
        });
        true
    }

    /// Swap-remove the child at `index`. Panics when out of range.
    pub fn remove_at(&mut self, index: usize) -> ChildSlot {
        let len = self.slots.len();
        assert!(index < len, "child index {index} out of range for {len} children");

        let removed = self.slots.swap_remove(index);
        self.by_id.remove(&removed.id);
        if self.by_tag.get(&removed.tag) == Some(&index) {
            self.by_tag.remove(&removed.tag);
        }

        let moved_from = len - 1;
        if index != moved_from {
            let moved = &self.slots[index];
            self.by_id.insert(moved.id, index);
            if let Some(entry) = self.by_tag.get_mut(&moved.tag) {
                if *entry == moved_from {
                    *entry = index;
                }
            }
        }
        removed
    }

    /// Change the tag recorded for `id`. Returns false if `id` is not a child.
    pub fn retag(&mut self, id: NodeId, tag: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let slot = &mut self.slots[index];
        if self.by_tag.get(&slot.tag) == Some(&index) {
            self.by_tag.remove(&slot.tag);
        }
        slot.tag = tag.to_string();
        if !tag.is_empty() {
            self.by_tag.insert(tag.to_string(), index);
        }
        true
    }
}

/// An element of the scene tree.
///
/// Structure (parent, children, tag) is changed through the owning
/// [`Scene`](crate::Scene) so both ends of every link stay consistent.
pub struct Node {
    id: NodeId,
    tag: String,
    pub transform: Transform,
    visible: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Hierarchy,
    pub(crate) kind: NodeKind,
    pub(crate) render_state: RenderState,
    /// Vertex and fragment source of the last program creation attempt.
    pub(crate) built_from: Option<(String, String)>,
    pub(crate) listener: Option<Box<dyn NodeListener>>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("kind", &self.kind.name())
            .field("visible", &self.visible)
            .field("parent", &self.parent)
            .field("children", &self.children.len())
            .field("render_state", &self.render_state)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            tag: String::new(),
            transform: Transform::default(),
            visible: true,
            parent: None,
            children: Hierarchy::default(),
            kind,
            render_state: RenderState::Pending,
            built_from: None,
            listener: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Empty when untagged.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub(crate) fn set_tag_raw(&mut self, tag: &str) {
        self.tag = tag.to_string();
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    /// Forget a failed or created program so the next frame creates it again.
    pub fn reset_render_state(&mut self) {
        self.render_state = RenderState::Pending;
    }

    pub fn set_listener(&mut self, listener: impl NodeListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Panics when `index >= num_children()`.
    pub fn child_at(&self, index: usize) -> NodeId {
        self.children.get(index)
    }

    pub fn child_by_id(&self, id: NodeId) -> Option<NodeId> {
        self.children.index_of(id).map(|_| id)
    }

    pub fn child_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.children.index_of_tag(tag).map(|index| self.children.get(index))
    }

    /// Children in draw order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.ids()
    }

    /// Run `call` against this node's listener, if any.
    pub(crate) fn notify(&mut self, call: impl FnOnce(&mut dyn NodeListener, &Node)) {
        if let Some(mut listener) = self.listener.take() {
            call(listener.as_mut(), self);
            self.listener = Some(listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn id(n: u64) -> NodeId {
        NodeId(n)
    }

    #[test]
    fn push_is_idempotent() {
        let mut h = Hierarchy::default();
        assert!(h.push(id(1), "a"));
        assert!(!h.push(id(1), "a"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn swap_remove_reindexes_moved_child() {
        let mut h = Hierarchy::default();
        h.push(id(1), "x");
        h.push(id(2), "y");
        h.push(id(3), "z");

        let removed = h.remove_at(0);
        assert_eq!(removed.id, id(1));
        assert_eq!(h.len(), 2);
        assert_eq!(h.get(0), id(3));
        assert_eq!(h.index_of(id(3)), Some(0));
        assert_eq!(h.index_of_tag("z"), Some(0));
        assert_eq!(h.index_of_tag("x"), None);
        assert_eq!(h.index_of(id(1)), None);
    }

    #[test]
    fn remove_last_needs_no_swap() {
        let mut h = Hierarchy::default();
        h.push(id(1), "");
        h.push(id(2), "b");
        h.remove_at(1);
        assert_eq!(h.ids().collect::<Vec<_>>(), vec![id(1)]);
        assert_eq!(h.index_of_tag("b"), None);
    }

    #[test]
    fn duplicate_tag_last_write_wins() {
        let mut h = Hierarchy::default();
        h.push(id(1), "dup");
        h.push(id(2), "dup");
        assert_eq!(h.index_of_tag("dup"), Some(1));

        // removing the shadowed sibling leaves the winner indexed
        h.remove_at(0);
        assert_eq!(h.index_of_tag("dup"), Some(0));
        assert_eq!(h.get(0), id(2));
    }

    #[test]
    fn empty_tag_is_never_indexed() {
        let mut h = Hierarchy::default();
        h.push(id(1), "");
        assert_eq!(h.index_of_tag(""), None);
    }

    #[test]
    fn retag_moves_index_entry() {
        let mut h = Hierarchy::default();
        h.push(id(1), "old");
        assert!(h.retag(id(1), "new"));
        assert_eq!(h.index_of_tag("old"), None);
        assert_eq!(h.index_of_tag("new"), Some(0));
        assert!(h.retag(id(1), ""));
        assert_eq!(h.index_of_tag("new"), None);
        assert!(!h.retag(id(9), "x"));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_index_panics() {
        let h = Hierarchy::default();
        h.get(0);
    }

    #[test]
    fn node_kind_bounds() {
        assert!(NodeKind::Group.bounds().is_empty());
        assert!(NodeKind::Camera(Camera::default()).bounds().is_empty());
        assert!(NodeKind::Group.renderable_mut().is_none());
    }

    #[test]
    fn listener_is_restored_after_notify() {
        struct Count(Rc<Cell<u32>>);
        impl NodeListener for Count {
            fn on_update(&mut self, _node: &Node) {
                self.0.set(self.0.get() + 1);
            }
        }

        let calls = Rc::new(Cell::new(0));
        let mut node = Node::new(id(1), NodeKind::Group);
        node.set_listener(Count(Rc::clone(&calls)));
        node.notify(|l, n| l.on_update(n));
        node.notify(|l, n| l.on_update(n));
        assert_eq!(calls.get(), 2);
        assert!(node.listener.is_some());

        node.clear_listener();
        node.notify(|l, n| l.on_update(n));
        assert_eq!(calls.get(), 2);
    }
}
