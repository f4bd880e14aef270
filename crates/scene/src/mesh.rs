use std::collections::BTreeMap;

use arbor_common::{Cached, Color};
use arbor_math::Box3;
use arbor_render::{Backend, BackendError, DrawRange, GeometryHandle, ProgramHandle, Uniform};

use crate::renderable::{RenderContext, Renderable, ShaderSource};

pub const BASIC_VERTEX_SHADER: &str = "\
uniform mat4 proj;
uniform mat4 view;
uniform mat4 transform;
in vec3 position;
void main() {
    gl_Position = proj * view * transform * vec4(position, 1.0);
}
";

pub const BASIC_FRAGMENT_SHADER: &str = "\
uniform vec4 color;
out vec4 frag_color;
void main() {
    frag_color = color;
}
";

/// Shader sources plus the uniforms a mesh uploads for them.
///
/// Uniforms are re-uploaded only after a change, or when the material is
/// drawn with a different program than last time.
#[derive(Debug, Clone)]
pub struct Material {
    vertex: String,
    fragment: String,
    uniforms: BTreeMap<String, Uniform>,
    uploaded: Cached<ProgramHandle>,
}

impl Material {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            uniforms: BTreeMap::new(),
            uploaded: Cached::Dirty,
        }
    }

    /// Flat-colored material.
    pub fn basic(color: Color) -> Self {
        let mut material = Self::new(BASIC_VERTEX_SHADER, BASIC_FRAGMENT_SHADER);
        material.set_uniform("color", color);
        material
    }

    pub fn shader(&self) -> ShaderSource<'_> {
        ShaderSource {
            vertex: &self.vertex,
            fragment: &self.fragment,
        }
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.uniforms.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn set_uniform(&mut self, name: impl Into<String>, value: impl Into<Uniform>) {
        self.uniforms.insert(name.into(), value.into());
        self.uploaded.invalidate();
    }

    pub fn needs_upload(&self, program: ProgramHandle) -> bool {
        self.uploaded.get() != Some(&program)
    }

    fn upload(&mut self, backend: &mut dyn Backend, program: ProgramHandle) -> Result<(), BackendError> {
        if !self.needs_upload(program) {
            return Ok(());
        }
        for (name, value) in &self.uniforms {
            backend.set_uniform(program, name, *value)?;
        }
        self.uploaded.set(program);
        Ok(())
    }
}

/// Geometry drawn with a material.
///
/// The geometry itself lives with whoever issued the handle; the mesh only
/// carries its local bounds for culling.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: GeometryHandle,
    pub bounds: Box3,
    pub range: Option<DrawRange>,
    pub material: Material,
}

impl Mesh {
    pub fn new(geometry: GeometryHandle, bounds: Box3, material: Material) -> Self {
        Self {
            geometry,
            bounds,
            range: None,
            material,
        }
    }

    pub fn with_range(mut self, range: DrawRange) -> Self {
        self.range = Some(range);
        self
    }
}

impl Renderable for Mesh {
    fn bounds(&self) -> Box3 {
        self.bounds
    }

    fn shader(&self) -> ShaderSource<'_> {
        self.material.shader()
    }

    fn render(
        &mut self,
        backend: &mut dyn Backend,
        program: ProgramHandle,
        _ctx: &RenderContext,
    ) -> Result<(), BackendError> {
        self.material.upload(backend, program)?;
        backend.draw(program, self.geometry, self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_render::RecordingBackend;
    use glam::{DMat4, DVec3};

    fn ctx() -> RenderContext {
        RenderContext {
            projection: DMat4::IDENTITY,
            view: DMat4::IDENTITY,
            camera_world: DMat4::IDENTITY,
            world: DMat4::IDENTITY,
        }
    }

    fn cube() -> Mesh {
        Mesh::new(
            GeometryHandle(1),
            Box3::new(DVec3::splat(-0.5), DVec3::splat(0.5)),
            Material::basic(Color::WHITE),
        )
    }

    #[test]
    fn uniforms_upload_once_until_changed() {
        let mut backend = RecordingBackend::new();
        let program = backend.create_program("v", "f").unwrap();
        let mut mesh = cube();

        mesh.render(&mut backend, program, &ctx()).unwrap();
        mesh.render(&mut backend, program, &ctx()).unwrap();
        assert_eq!(backend.uniform_uploads("color"), 1);
        assert_eq!(backend.draws().count(), 2);

        mesh.material.set_uniform("color", Color::BLACK);
        mesh.render(&mut backend, program, &ctx()).unwrap();
        assert_eq!(backend.uniform_uploads("color"), 2);
        assert_eq!(backend.uniform(program, "color"), Some(Uniform::from(Color::BLACK)));
    }

    #[test]
    fn new_program_triggers_upload() {
        let mut backend = RecordingBackend::new();
        let first = backend.create_program("v", "f").unwrap();
        let second = backend.create_program("v", "f").unwrap();
        let mut mesh = cube();

        mesh.render(&mut backend, first, &ctx()).unwrap();
        assert!(!mesh.material.needs_upload(first));
        assert!(mesh.material.needs_upload(second));
        mesh.render(&mut backend, second, &ctx()).unwrap();
        assert_eq!(backend.uniform_uploads("color"), 2);
    }

    #[test]
    fn draw_range_is_forwarded() {
        let mut backend = RecordingBackend::new();
        let program = backend.create_program("v", "f").unwrap();
        let mut mesh = cube().with_range(DrawRange::new(0, 36));
        mesh.render(&mut backend, program, &ctx()).unwrap();
        assert!(backend.transcript().contains("[0..36]"));
    }

    #[test]
    fn basic_material_uses_builtin_shaders() {
        let material = Material::basic(Color::WHITE);
        assert!(material.shader().vertex.contains("uniform mat4 proj"));
        assert_eq!(material.uniforms().count(), 1);
        assert_eq!(material.uniform("color"), Some(&Uniform::from(Color::WHITE)));
    }
}
