use arbor_common::NodeId;
use arbor_math::MathError;

/// Rejected camera configuration. The camera is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CameraError {
    #[error("near plane must be positive and finite, got {0}")]
    InvalidNear(f64),
    #[error("far plane ({far}) must be finite and beyond the near plane ({near})")]
    InvalidFar { near: f64, far: f64 },
    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspect(f64),
    #[error("zoom must be positive and finite, got {0}")]
    InvalidZoom(f64),
    #[error("field of view must lie in (0, 180) degrees, got {0}")]
    InvalidFov(f64),
    #[error("view offset needs positive full and sub-view sizes")]
    InvalidViewOffset,
    #[error("orthographic bounds are degenerate: left {left}, right {right}, top {top}, bottom {bottom}")]
    InvalidOrthographicBounds { left: f64, right: f64, top: f64, bottom: f64 },
    #[error("focal length must be positive and finite, got {0}")]
    InvalidFocalLength(f64),
    #[error("film gauge must be positive and finite, got {0}")]
    InvalidFilmGauge(f64),
    #[error("film offset must be finite, got {0}")]
    InvalidFilmOffset(f64),
    #[error("camera is not perspective")]
    NotPerspective,
    #[error("camera is not orthographic")]
    NotOrthographic,
}

/// Failed structural operation on a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("adding {child} under {parent} would create a cycle")]
    CycleDetected { parent: NodeId, child: NodeId },
    #[error("the scene root cannot become a child")]
    RootCannotBeChild,
    #[error("the scene root cannot be destroyed")]
    RootCannotBeDestroyed,
    #[error("node {0} is not a camera")]
    NotACamera(NodeId),
}

/// Frame-level render failure.
///
/// Per-node backend failures never surface here; they disable the node.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("active camera {0} no longer exists")]
    CameraNotFound(NodeId),
    #[error("active camera {0} is not a camera")]
    NotACamera(NodeId),
    #[error("camera world transform cannot be inverted: {0}")]
    DegenerateCamera(#[from] MathError),
}
