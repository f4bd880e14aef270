use arbor_common::Cached;
use arbor_math::linalg::{compose, make_orthographic, make_perspective};
use arbor_math::{Box3, Frustum, Sphere};
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::CameraError;

pub const DEFAULT_NEAR: f64 = 0.1;
pub const DEFAULT_FAR: f64 = 2000.0;

/// Vertical field of view and film description of a perspective camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveLens {
    /// Vertical field of view in degrees.
    pub fov: f64,
    pub aspect: f64,
    /// Film width in millimeters.
    pub film_gauge: f64,
    /// Horizontal film offset, same unit as the gauge.
    pub film_offset: f64,
}

impl Default for PerspectiveLens {
    fn default() -> Self {
        Self {
            fov: 50.0,
            aspect: 1.0,
            film_gauge: 35.0,
            film_offset: 0.0,
        }
    }
}

impl PerspectiveLens {
    /// Film not completely covered in portrait format (aspect < 1).
    pub fn film_width(&self) -> f64 {
        self.film_gauge * self.aspect.min(1.0)
    }

    /// Film not completely covered in landscape format (aspect > 1).
    pub fn film_height(&self) -> f64 {
        self.film_gauge / self.aspect.max(1.0)
    }

    fn validate(&self) -> Result<(), CameraError> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(CameraError::InvalidFov(self.fov));
        }
        if !(self.aspect > 0.0 && self.aspect.is_finite()) {
            return Err(CameraError::InvalidAspect(self.aspect));
        }
        if !(self.film_gauge > 0.0 && self.film_gauge.is_finite()) {
            return Err(CameraError::InvalidFilmGauge(self.film_gauge));
        }
        if !self.film_offset.is_finite() {
            return Err(CameraError::InvalidFilmOffset(self.film_offset));
        }
        Ok(())
    }
}

/// View-space extents of an orthographic camera at zoom 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrthographicLens {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for OrthographicLens {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            top: 1.0,
            bottom: -1.0,
        }
    }
}

impl OrthographicLens {
    fn validate(&self) -> Result<(), CameraError> {
        let finite = [self.left, self.right, self.top, self.bottom]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.left == self.right || self.top == self.bottom {
            return Err(CameraError::InvalidOrthographicBounds {
                left: self.left,
                right: self.right,
                top: self.top,
                bottom: self.bottom,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Lens {
    Perspective(PerspectiveLens),
    Orthographic(OrthographicLens),
}

/// Renders a sub-rectangle of a larger virtual view, e.g. one tile of a
/// multi-monitor wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewOffset {
    pub full_width: f64,
    pub full_height: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewOffset {
    fn validate(&self) -> Result<(), CameraError> {
        let positive = [self.full_width, self.full_height, self.width, self.height]
            .iter()
            .all(|v| *v > 0.0 && v.is_finite());
        if !positive || !self.x.is_finite() || !self.y.is_finite() {
            return Err(CameraError::InvalidViewOffset);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Projection {
    matrix: DMat4,
    inverse: DMat4,
}

/// A perspective or orthographic camera.
///
/// The projection and frustum are derived lazily: every lens mutation marks
/// both dirty, and the next read recomputes them once. The frustum is taken
/// from `projection * view`, where `view` is whatever was last passed to
/// [`Camera::set_view`] (identity until then, giving view-space planes).
#[derive(Debug, Clone)]
pub struct Camera {
    lens: Lens,
    near: f64,
    far: f64,
    zoom: f64,
    view_offset: Option<ViewOffset>,
    view: DMat4,
    projection: Cached<Projection>,
    frustum: Cached<Frustum>,
    projection_updates: u64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_lens(Lens::Perspective(PerspectiveLens::default()), DEFAULT_NEAR, DEFAULT_FAR)
    }
}

impl Camera {
    fn from_lens(lens: Lens, near: f64, far: f64) -> Self {
        Self {
            lens,
            near,
            far,
            zoom: 1.0,
            view_offset: None,
            view: DMat4::IDENTITY,
            projection: Cached::Dirty,
            frustum: Cached::Dirty,
            projection_updates: 0,
        }
    }

    /// Perspective camera with a vertical field of view in degrees.
    pub fn perspective(fov: f64, aspect: f64, near: f64, far: f64) -> Result<Self, CameraError> {
        let lens = PerspectiveLens {
            fov,
            aspect,
            ..PerspectiveLens::default()
        };
        Self::with_lens(Lens::Perspective(lens), near, far)
    }

    pub fn orthographic(
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
        near: f64,
        far: f64,
    ) -> Result<Self, CameraError> {
        let lens = OrthographicLens {
            left,
            right,
            top,
            bottom,
        };
        Self::with_lens(Lens::Orthographic(lens), near, far)
    }

    pub fn with_lens(lens: Lens, near: f64, far: f64) -> Result<Self, CameraError> {
        validate_lens(&lens)?;
        validate_clip(near, far)?;
        Ok(Self::from_lens(lens, near, far))
    }

    pub fn lens(&self) -> &Lens {
        &self.lens
    }

    pub fn is_perspective(&self) -> bool {
        matches!(self.lens, Lens::Perspective(_))
    }

    pub fn near(&self) -> f64 {
        self.near
    }

    pub fn far(&self) -> f64 {
        self.far
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn view_offset(&self) -> Option<&ViewOffset> {
        self.view_offset.as_ref()
    }

    pub fn view(&self) -> &DMat4 {
        &self.view
    }

    /// True until the next projection read.
    pub fn needs_update(&self) -> bool {
        self.projection.is_dirty()
    }

    /// How many times the projection has been recomputed.
    pub fn projection_updates(&self) -> u64 {
        self.projection_updates
    }

    fn invalidate(&mut self) {
        self.projection.invalidate();
        self.frustum.invalidate();
    }

    pub fn set_near(&mut self, near: f64) -> Result<(), CameraError> {
        self.set_clip(near, self.far)
    }

    pub fn set_far(&mut self, far: f64) -> Result<(), CameraError> {
        self.set_clip(self.near, far)
    }

    pub fn set_clip(&mut self, near: f64, far: f64) -> Result<(), CameraError> {
        validate_clip(near, far)?;
        self.near = near;
        self.far = far;
        self.invalidate();
        Ok(())
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), CameraError> {
        if !(zoom > 0.0 && zoom.is_finite()) {
            return Err(CameraError::InvalidZoom(zoom));
        }
        self.zoom = zoom;
        self.invalidate();
        Ok(())
    }

    pub fn set_view_offset(&mut self, offset: ViewOffset) -> Result<(), CameraError> {
        offset.validate()?;
        self.view_offset = Some(offset);
        self.invalidate();
        Ok(())
    }

    pub fn clear_view_offset(&mut self) {
        self.view_offset = None;
        self.invalidate();
    }

    /// Replace the lens wholesale, switching variants if needed.
    pub fn set_lens(&mut self, lens: Lens) -> Result<(), CameraError> {
        validate_lens(&lens)?;
        self.lens = lens;
        self.invalidate();
        Ok(())
    }

    fn update_perspective(&mut self, edit: impl FnOnce(&mut PerspectiveLens)) -> Result<(), CameraError> {
        let Lens::Perspective(current) = self.lens else {
            return Err(CameraError::NotPerspective);
        };
        let mut lens = current;
        edit(&mut lens);
        lens.validate()?;
        self.lens = Lens::Perspective(lens);
        self.invalidate();
        Ok(())
    }

    pub fn set_fov(&mut self, fov: f64) -> Result<(), CameraError> {
        self.update_perspective(|lens| lens.fov = fov)
    }

    pub fn set_aspect(&mut self, aspect: f64) -> Result<(), CameraError> {
        self.update_perspective(|lens| lens.aspect = aspect)
    }

    pub fn set_film_gauge(&mut self, film_gauge: f64) -> Result<(), CameraError> {
        self.update_perspective(|lens| lens.film_gauge = film_gauge)
    }

    pub fn set_film_offset(&mut self, film_offset: f64) -> Result<(), CameraError> {
        self.update_perspective(|lens| lens.film_offset = film_offset)
    }

    /// Set the field of view from a focal length against the film height.
    pub fn set_focal_length(&mut self, focal_length: f64) -> Result<(), CameraError> {
        if !(focal_length > 0.0 && focal_length.is_finite()) {
            return Err(CameraError::InvalidFocalLength(focal_length));
        }
        self.update_perspective(|lens| {
            let v_extent_slope = 0.5 * lens.film_height() / focal_length;
            lens.fov = (2.0 * v_extent_slope.atan()).to_degrees();
        })
    }

    pub fn focal_length(&self) -> Result<f64, CameraError> {
        let Lens::Perspective(lens) = &self.lens else {
            return Err(CameraError::NotPerspective);
        };
        let v_extent_slope = (0.5 * lens.fov).to_radians().tan();
        Ok(0.5 * lens.film_height() / v_extent_slope)
    }

    /// Field of view after zoom, in degrees.
    pub fn effective_fov(&self) -> Result<f64, CameraError> {
        let Lens::Perspective(lens) = &self.lens else {
            return Err(CameraError::NotPerspective);
        };
        let half = (0.5 * lens.fov).to_radians().tan() / self.zoom;
        Ok((2.0 * half.atan()).to_degrees())
    }

    pub fn set_orthographic_bounds(
        &mut self,
        left: f64,
        right: f64,
        top: f64,
        bottom: f64,
    ) -> Result<(), CameraError> {
        if !matches!(self.lens, Lens::Orthographic(_)) {
            return Err(CameraError::NotOrthographic);
        }
        let lens = OrthographicLens {
            left,
            right,
            top,
            bottom,
        };
        lens.validate()?;
        self.lens = Lens::Orthographic(lens);
        self.invalidate();
        Ok(())
    }

    /// World-to-camera matrix used for the frustum. Invalidates the frustum
    /// only when it actually changes.
    pub fn set_view(&mut self, view: DMat4) {
        if self.view != view {
            self.view = view;
            self.frustum.invalidate();
        }
    }

    fn projection_state(&mut self) -> &Projection {
        let lens = &self.lens;
        let (near, far, zoom) = (self.near, self.far, self.zoom);
        let offset = self.view_offset.as_ref();
        let updates = &mut self.projection_updates;
        self.projection.get_or_update(|| {
            *updates += 1;
            tracing::trace!(updates = *updates, "camera projection recomputed");
            let matrix = match lens {
                Lens::Perspective(p) => perspective_matrix(p, near, far, zoom, offset),
                Lens::Orthographic(o) => orthographic_matrix(o, near, far, zoom, offset),
            };
            Projection {
                matrix,
                inverse: matrix.inverse(),
            }
        })
    }

    /// The projection matrix, recomputed first if any lens input changed.
    pub fn projection(&mut self) -> DMat4 {
        self.projection_state().matrix
    }

    pub fn projection_inverse(&mut self) -> DMat4 {
        self.projection_state().inverse
    }

    /// Planes of `projection * view`.
    pub fn frustum(&mut self) -> &Frustum {
        let projection = self.projection();
        let view = self.view;
        self.frustum
            .get_or_update(|| Frustum::from_matrix(&compose(&projection, &view)))
    }

    pub fn contains_point(&mut self, point: DVec3) -> bool {
        self.frustum().contains_point(point)
    }

    pub fn intersects_box(&mut self, b: &Box3) -> bool {
        self.frustum().intersects_box(b)
    }

    pub fn intersects_sphere(&mut self, sphere: &Sphere) -> bool {
        self.frustum().intersects_sphere(sphere)
    }
}

fn validate_clip(near: f64, far: f64) -> Result<(), CameraError> {
    if !(near > 0.0 && near.is_finite()) {
        return Err(CameraError::InvalidNear(near));
    }
    if !(far > near && far.is_finite()) {
        return Err(CameraError::InvalidFar { near, far });
    }
    Ok(())
}

fn validate_lens(lens: &Lens) -> Result<(), CameraError> {
    match lens {
        Lens::Perspective(p) => p.validate(),
        Lens::Orthographic(o) => o.validate(),
    }
}

fn perspective_matrix(lens: &PerspectiveLens, near: f64, far: f64, zoom: f64, offset: Option<&ViewOffset>) -> DMat4 {
    let mut top = near * (0.5 * lens.fov).to_radians().tan() / zoom;
    let mut height = 2.0 * top;
    let mut width = lens.aspect * height;
    let mut left = -0.5 * width;
    if let Some(view) = offset {
        left += view.x * width / view.full_width;
        top -= view.y * height / view.full_height;
        width *= view.width / view.full_width;
        height *= view.height / view.full_height;
    }
    if lens.film_offset != 0.0 {
        left += near * lens.film_offset / lens.film_width();
    }
    make_perspective(left, left + width, top, top - height, near, far)
}

fn orthographic_matrix(lens: &OrthographicLens, near: f64, far: f64, zoom: f64, offset: Option<&ViewOffset>) -> DMat4 {
    let dx = (lens.right - lens.left) / (2.0 * zoom);
    let dy = (lens.top - lens.bottom) / (2.0 * zoom);
    let cx = (lens.right + lens.left) / 2.0;
    let cy = (lens.top + lens.bottom) / 2.0;

    let mut left = cx - dx;
    let mut right = cx + dx;
    let mut top = cy + dy;
    let mut bottom = cy - dy;
    if let Some(view) = offset {
        let scale_w = (lens.right - lens.left) / view.full_width / zoom;
        let scale_h = (lens.top - lens.bottom) / view.full_height / zoom;
        left += scale_w * view.x;
        right = left + scale_w * view.width;
        top -= scale_h * view.y;
        bottom = top - scale_h * view.height;
    }
    make_orthographic(left, right, top, bottom, near, far)
}
