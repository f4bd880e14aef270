use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use arbor_common::Color;

use crate::backend::{
    Backend, BackendError, DrawRange, GeometryHandle, ProgramHandle, ShaderStage, Uniform, Viewport,
};

/// One call made against a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// `None` when creation failed.
    CreateProgram(Option<ProgramHandle>),
    SetUniform {
        program: ProgramHandle,
        name: String,
        value: Uniform,
    },
    ClearColor(Color),
    Viewport(Viewport),
    Draw {
        program: ProgramHandle,
        geometry: GeometryHandle,
        range: Option<DrawRange>,
    },
}

/// Backend that records calls instead of talking to a GPU.
///
/// Used for CLI output, logging, and exercising traversal without a
/// graphics context. Failures can be injected per shader source marker and
/// per geometry.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    next_program: u32,
    programs: HashMap<ProgramHandle, HashMap<String, Uniform>>,
    fail_marker: Option<String>,
    failing_geometry: HashSet<GeometryHandle>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail compilation of any shader whose source contains `marker`.
    pub fn fail_programs_containing(&mut self, marker: impl Into<String>) {
        self.fail_marker = Some(marker.into());
    }

    /// Fail every draw of `geometry`.
    pub fn fail_draws_for(&mut self, geometry: GeometryHandle) {
        self.failing_geometry.insert(geometry);
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Drain the recorded calls, keeping programs and uniform state.
    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Programs created successfully so far.
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Successful draws in submission order.
    pub fn draws(&self) -> impl Iterator<Item = (ProgramHandle, GeometryHandle)> + '_ {
        self.calls.iter().filter_map(|call| match call {
            BackendCall::Draw { program, geometry, .. } => Some((*program, *geometry)),
            _ => None,
        })
    }

    /// Last value uploaded to `name` on `program`.
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<Uniform> {
        self.programs.get(&program)?.get(name).copied()
    }

    /// Number of recorded `set_uniform` calls for `name` on any program.
    pub fn uniform_uploads(&self, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::SetUniform { name: n, .. } if n == name))
            .count()
    }

    /// Human-readable transcript, one line per call.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== Backend transcript ({} calls) ===\n", self.calls.len()));
        for call in &self.calls {
            let _ = match call {
                BackendCall::CreateProgram(Some(program)) => writeln!(out, "create {program}"),
                BackendCall::CreateProgram(None) => writeln!(out, "create <failed>"),
                BackendCall::SetUniform { program, name, value } => {
                    writeln!(out, "uniform {program} {name} = {}", describe(value))
                }
                BackendCall::ClearColor(c) => {
                    writeln!(out, "clear rgba({:.2}, {:.2}, {:.2}, {:.2})", c.r, c.g, c.b, c.a)
                }
                BackendCall::Viewport(v) => {
                    writeln!(out, "viewport ({}, {}) {}x{}", v.x, v.y, v.width, v.height)
                }
                BackendCall::Draw { program, geometry, range } => match range {
                    Some(r) => writeln!(
                        out,
                        "draw {program} {geometry} [{}..{}]",
                        r.start,
                        r.start + r.count
                    ),
                    None => writeln!(out, "draw {program} {geometry}"),
                },
            };
        }
        out
    }

    fn check_source(&self, stage: ShaderStage, source: &str) -> Result<(), BackendError> {
        match &self.fail_marker {
            Some(marker) if source.contains(marker.as_str()) => Err(BackendError::Compile {
                stage,
                log: format!("injected failure on `{marker}`"),
            }),
            _ => Ok(()),
        }
    }
}

fn describe(value: &Uniform) -> String {
    match value {
        Uniform::Int(v) => v.to_string(),
        Uniform::Float(v) => format!("{v:.3}"),
        Uniform::Vec2(v) => format!("({:.3}, {:.3})", v.x, v.y),
        Uniform::Vec3(v) => format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z),
        Uniform::Vec4(v) => format!("({:.3}, {:.3}, {:.3}, {:.3})", v.x, v.y, v.z, v.w),
        Uniform::Mat4(m) => format!("mat4(t=({:.3}, {:.3}, {:.3}))", m.w_axis.x, m.w_axis.y, m.w_axis.z),
    }
}

impl Backend for RecordingBackend {
    fn create_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramHandle, BackendError> {
        let checked = self
            .check_source(ShaderStage::Vertex, vertex)
            .and_then(|()| self.check_source(ShaderStage::Fragment, fragment));
        if let Err(err) = checked {
            tracing::debug!(error = %err, "recording backend rejected program");
            self.calls.push(BackendCall::CreateProgram(None));
            return Err(err);
        }
        self.next_program += 1;
        let program = ProgramHandle(self.next_program);
        self.programs.insert(program, HashMap::new());
        self.calls.push(BackendCall::CreateProgram(Some(program)));
        Ok(program)
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: Uniform) -> Result<(), BackendError> {
        let uniforms = self
            .programs
            .get_mut(&program)
            .ok_or(BackendError::UnknownProgram(program))?;
        uniforms.insert(name.to_string(), value);
        self.calls.push(BackendCall::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn clear_color(&mut self, color: Color) {
        self.calls.push(BackendCall::ClearColor(color));
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.calls.push(BackendCall::Viewport(viewport));
    }

    fn draw(
        &mut self,
        program: ProgramHandle,
        geometry: GeometryHandle,
        range: Option<DrawRange>,
    ) -> Result<(), BackendError> {
        if !self.programs.contains_key(&program) {
            return Err(BackendError::UnknownProgram(program));
        }
        if self.failing_geometry.contains(&geometry) {
            return Err(BackendError::Draw(format!("injected failure on {geometry}")));
        }
        self.calls.push(BackendCall::Draw { program, geometry, range });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn records_calls_in_order() {
        let mut backend = RecordingBackend::new();
        backend.clear_color(Color::BLACK);
        backend.viewport(Viewport::new(0, 0, 640, 480));
        let program = backend.create_program("void main() {}", "void main() {}").unwrap();
        backend.set_uniform(program, "tint", Uniform::Float(0.5)).unwrap();
        backend.draw(program, GeometryHandle(9), None).unwrap();

        assert_eq!(backend.calls().len(), 5);
        assert_eq!(backend.calls()[0], BackendCall::ClearColor(Color::BLACK));
        assert_eq!(backend.program_count(), 1);
        assert_eq!(backend.draws().collect::<Vec<_>>(), vec![(program, GeometryHandle(9))]);
        assert_eq!(backend.uniform(program, "tint"), Some(Uniform::Float(0.5)));
    }

    #[test]
    fn program_handles_are_distinct() {
        let mut backend = RecordingBackend::new();
        let a = backend.create_program("a", "a").unwrap();
        let b = backend.create_program("b", "b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn injected_compile_failure() {
        let mut backend = RecordingBackend::new();
        backend.fail_programs_containing("#error");
        let err = backend.create_program("ok", "#error broken").unwrap_err();
        assert!(matches!(err, BackendError::Compile { stage: ShaderStage::Fragment, .. }));
        assert_eq!(backend.program_count(), 0);
        assert_eq!(backend.calls(), &[BackendCall::CreateProgram(None)]);
    }

    #[test]
    fn unknown_program_is_rejected() {
        let mut backend = RecordingBackend::new();
        let err = backend
            .set_uniform(ProgramHandle(42), "x", Uniform::Int(1))
            .unwrap_err();
        assert_eq!(err, BackendError::UnknownProgram(ProgramHandle(42)));
        assert!(backend.draw(ProgramHandle(42), GeometryHandle(1), None).is_err());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn injected_draw_failure_is_not_recorded() {
        let mut backend = RecordingBackend::new();
        let program = backend.create_program("v", "f").unwrap();
        backend.fail_draws_for(GeometryHandle(3));
        assert!(backend.draw(program, GeometryHandle(3), None).is_err());
        assert!(backend.draw(program, GeometryHandle(4), None).is_ok());
        assert_eq!(backend.draws().count(), 1);
    }

    #[test]
    fn transcript_lists_every_call() {
        let mut backend = RecordingBackend::new();
        backend.clear_color(Color::WHITE);
        let program = backend.create_program("v", "f").unwrap();
        backend
            .set_uniform(program, "color", Uniform::Vec3(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        backend
            .draw(program, GeometryHandle(2), Some(DrawRange::new(6, 12)))
            .unwrap();

        let out = backend.transcript();
        assert!(out.contains("(4 calls)"));
        assert!(out.contains("clear rgba(1.00, 1.00, 1.00, 1.00)"));
        assert!(out.contains("create program:1"));
        assert!(out.contains("uniform program:1 color = (1.000, 0.000, 0.000)"));
        assert!(out.contains("draw program:1 geometry:2 [6..18]"));
    }

    #[test]
    fn take_calls_keeps_programs() {
        let mut backend = RecordingBackend::new();
        let program = backend.create_program("v", "f").unwrap();
        assert_eq!(backend.take_calls().len(), 1);
        assert!(backend.calls().is_empty());
        assert!(backend.draw(program, GeometryHandle(1), None).is_ok());
    }
}
