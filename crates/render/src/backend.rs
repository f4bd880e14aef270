use arbor_common::Color;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::fmt;

/// Opaque handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

impl fmt::Display for ProgramHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "program:{}", self.0)
    }
}

/// Opaque handle to geometry uploaded by an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(pub u64);

impl fmt::Display for GeometryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geometry:{}", self.0)
    }
}

/// Sub-range of a geometry's elements to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub start: u32,
    pub count: u32,
}

impl DrawRange {
    pub const fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }
}

/// Pixel rectangle passed to the backend at clear time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            return 1.0;
        }
        f64::from(self.width) / f64::from(self.height)
    }
}

/// A value bound to a named shader uniform. Single precision, as uploaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl From<Color> for Uniform {
    fn from(c: Color) -> Self {
        Uniform::Vec4(Vec4::from_array(c.to_array()))
    }
}

/// Which shader stage a compile error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Errors reported by a graphics backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("program failed to link: {0}")]
    Link(String),
    #[error("unknown {0}")]
    UnknownProgram(ProgramHandle),
    #[error("draw failed: {0}")]
    Draw(String),
}

/// Capabilities the scene consumes from a graphics API binding.
///
/// The scene never owns GPU resources beyond the program handles it gets
/// back from [`Backend::create_program`]; geometry lives with whoever
/// handed out the [`GeometryHandle`].
pub trait Backend {
    /// Compile and link a program.
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramHandle, BackendError>;

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: Uniform) -> Result<(), BackendError>;

    fn clear_color(&mut self, color: Color);

    fn viewport(&mut self, viewport: Viewport);

    /// Submit `geometry` with `program`. `None` draws the whole geometry.
    fn draw(
        &mut self,
        program: ProgramHandle,
        geometry: GeometryHandle,
        range: Option<DrawRange>,
    ) -> Result<(), BackendError>;
}
