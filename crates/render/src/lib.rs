//! Graphics backend contract consumed by scene traversal.
//!
//! # Invariants
//! - The backend never sees scene structure, only programs, uniforms and draws.
//! - Geometry contents stay with the collaborator that issued the handle.
//!
//! [`RecordingBackend`] implements the contract without a GPU. It backs the
//! CLI and every traversal test; a real API binding implements the same
//! trait without changing consumers.

mod backend;
mod recording;

pub use backend::{
    Backend, BackendError, DrawRange, GeometryHandle, ProgramHandle, ShaderStage, Uniform, Viewport,
};
pub use recording::{BackendCall, RecordingBackend};

pub fn crate_info() -> &'static str {
    "arbor-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
