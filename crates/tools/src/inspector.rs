use std::fmt::{self, Write as _};

use arbor_common::NodeId;
use arbor_scene::{Node, NodeKind, RenderState, Scene};
use serde::Serialize;

/// Scene inspector for developer tooling.
///
/// Read-only queries against a scene for debugging and CLI output.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let attached = scene.descendants(scene.root());
        let mut summary = SceneSummary {
            node_count: scene.node_count(),
            attached: attached.len(),
            max_depth: 0,
            groups: 0,
            meshes: 0,
            cameras: 0,
            custom: 0,
            hidden: 0,
            failed: 0,
            active_camera: scene.active_camera(),
            pending_events: scene.events().len(),
        };
        for node in scene.nodes() {
            match node.kind() {
                NodeKind::Group => summary.groups += 1,
                NodeKind::Mesh(_) => summary.meshes += 1,
                NodeKind::Camera(_) => summary.cameras += 1,
                NodeKind::Custom(_) => summary.custom += 1,
            }
            if !node.is_visible() {
                summary.hidden += 1;
            }
            if node.render_state() == RenderState::Failed {
                summary.failed += 1;
            }
        }
        summary.max_depth = attached
            .iter()
            .filter_map(|id| scene.depth(*id))
            .max()
            .unwrap_or(0);
        summary
    }

    /// Details of a single node, or `None` if it does not exist.
    pub fn inspect_node(scene: &Scene, id: NodeId) -> Option<NodeInfo> {
        let node = scene.node(id)?;
        let t = &node.transform;
        let world = scene.world_transform(id)?.w_axis;
        Some(NodeInfo {
            id,
            tag: node.tag().to_string(),
            kind: node.kind().name(),
            parent: node.parent(),
            children: node.children().collect(),
            visible: node.is_visible(),
            render_state: describe_state(node.render_state()),
            position: t.position.to_array(),
            rotation: t.rotation.to_array(),
            scale: t.scale.to_array(),
            world_position: [world.x, world.y, world.z],
        })
    }

    /// Indented dump of the attached tree, one node per line, draw order.
    pub fn tree(scene: &Scene) -> String {
        let mut out = String::new();
        for id in scene.descendants(scene.root()) {
            let (Some(node), Some(depth)) = (scene.node(id), scene.depth(id)) else {
                continue;
            };
            let _ = writeln!(out, "{}{}", "  ".repeat(depth), describe_node(node));
        }
        out
    }
}

fn describe_node(node: &Node) -> String {
    let mut line = format!("{} {}", node.kind().name(), node.id());
    if !node.tag().is_empty() {
        line.push_str(&format!(" \"{}\"", node.tag()));
    }
    if !node.is_visible() {
        line.push_str(" (hidden)");
    }
    if node.render_state() == RenderState::Failed {
        line.push_str(" (failed)");
    }
    line
}

fn describe_state(state: RenderState) -> String {
    match state {
        RenderState::Pending => "pending".to_string(),
        RenderState::Ready(program) => format!("ready ({program})"),
        RenderState::Failed => "failed".to_string(),
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    /// Every node in the scene, attached or not.
    pub node_count: usize,
    /// Nodes reachable from the root, root included.
    pub attached: usize,
    pub max_depth: usize,
    pub groups: usize,
    pub meshes: usize,
    pub cameras: usize,
    pub custom: usize,
    pub hidden: usize,
    pub failed: usize,
    pub active_camera: Option<NodeId>,
    pub pending_events: usize,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let camera = self
            .active_camera
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        write!(
            f,
            "Scene: nodes={} attached={} depth={} meshes={} cameras={} hidden={} failed={} camera={} pending_events={}",
            self.node_count,
            self.attached,
            self.max_depth,
            self.meshes,
            self.cameras,
            self.hidden,
            self.failed,
            camera,
            self.pending_events
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeInfo {
    pub id: NodeId,
    pub tag: String,
    pub kind: &'static str,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub visible: bool,
    pub render_state: String,
    pub position: [f64; 3],
    pub rotation: [f64; 4],
    pub scale: [f64; 3],
    pub world_position: [f64; 3],
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} pos=({:.2}, {:.2}, {:.2}) world=({:.2}, {:.2}, {:.2}) children={} {}",
            self.kind,
            self.id,
            self.position[0],
            self.position[1],
            self.position[2],
            self.world_position[0],
            self.world_position[1],
            self.world_position[2],
            self.children.len(),
            self.render_state,
        )
    }
}
