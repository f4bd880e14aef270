//! Matrix helpers that pin down the composition convention.
//!
//! Points are column vectors, so `m * p` transforms `p`. Composition follows
//! from that: [`compose`]`(a, b)` is `a * b` and applies `b` first. Every
//! transform in the workspace (node locals, world accumulation, camera
//! view and projection) goes through this convention.

use glam::{DMat4, DVec3, DVec4};

/// Determinants at or below this magnitude are treated as singular.
pub const DETERMINANT_EPSILON: f64 = 1e-12;

/// Errors from matrix operations.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MathError {
    #[error("matrix is singular (determinant {determinant:e})")]
    SingularMatrix { determinant: f64 },
}

/// The transform that applies `inner` and then `outer`.
#[inline]
pub fn compose(outer: &DMat4, inner: &DMat4) -> DMat4 {
    *outer * *inner
}

/// Transform a point (w = 1), dividing by the resulting w when it is not 1.
pub fn transform_point(m: &DMat4, point: DVec3) -> DVec3 {
    let v = *m * point.extend(1.0);
    if v.w == 1.0 || v.w == 0.0 {
        v.truncate()
    } else {
        v.truncate() / v.w
    }
}

#[inline]
pub fn transform_vector4(m: &DMat4, v: DVec4) -> DVec4 {
    *m * v
}

/// Invert `m`, refusing singular input instead of returning garbage.
pub fn try_inverse(m: &DMat4) -> Result<DMat4, MathError> {
    let determinant = m.determinant();
    if !determinant.is_finite() || determinant.abs() <= DETERMINANT_EPSILON {
        return Err(MathError::SingularMatrix { determinant });
    }
    Ok(m.inverse())
}

/// OpenGL-style off-axis perspective projection (clip z in `[-w, w]`).
///
/// `top > bottom` and `far > near > 0` are the caller's responsibility.
pub fn make_perspective(left: f64, right: f64, top: f64, bottom: f64, near: f64, far: f64) -> DMat4 {
    let x = 2.0 * near / (right - left);
    let y = 2.0 * near / (top - bottom);
    let a = (right + left) / (right - left);
    let b = (top + bottom) / (top - bottom);
    let c = -(far + near) / (far - near);
    let d = -2.0 * far * near / (far - near);
    DMat4::from_cols(
        DVec4::new(x, 0.0, 0.0, 0.0),
        DVec4::new(0.0, y, 0.0, 0.0),
        DVec4::new(a, b, c, -1.0),
        DVec4::new(0.0, 0.0, d, 0.0),
    )
}

/// OpenGL-style orthographic projection (clip z in `[-1, 1]`).
pub fn make_orthographic(left: f64, right: f64, top: f64, bottom: f64, near: f64, far: f64) -> DMat4 {
    let w = 1.0 / (right - left);
    let h = 1.0 / (top - bottom);
    let p = 1.0 / (far - near);
    let x = (right + left) * w;
    let y = (top + bottom) * h;
    let z = (far + near) * p;
    DMat4::from_cols(
        DVec4::new(2.0 * w, 0.0, 0.0, 0.0),
        DVec4::new(0.0, 2.0 * h, 0.0, 0.0),
        DVec4::new(0.0, 0.0, -2.0 * p, 0.0),
        DVec4::new(-x, -y, -z, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;

    #[test]
    fn compose_applies_inner_first() {
        let translate = DMat4::from_translation(DVec3::new(5.0, 0.0, 0.0));
        let scale = DMat4::from_scale(DVec3::splat(2.0));
        let p = DVec3::new(1.0, 0.0, 0.0);
        // scale then translate: (1 * 2) + 5
        assert_eq!(transform_point(&compose(&translate, &scale), p).x, 7.0);
        // translate then scale: (1 + 5) * 2
        assert_eq!(transform_point(&compose(&scale, &translate), p).x, 12.0);
    }

    #[test]
    fn compose_is_associative() {
        let a = DMat4::from_rotation_translation(DQuat::from_rotation_x(0.3), DVec3::new(1.0, 2.0, 3.0));
        let b = DMat4::from_scale(DVec3::new(2.0, 1.0, 0.5));
        let c = DMat4::from_rotation_translation(DQuat::from_rotation_z(-1.1), DVec3::Y);
        let left = compose(&compose(&a, &b), &c);
        let right = compose(&a, &compose(&b, &c));
        assert!(left.abs_diff_eq(right, 1e-12));
    }

    #[test]
    fn try_inverse_rejects_singular() {
        let flat = DMat4::from_scale(DVec3::new(1.0, 0.0, 1.0));
        assert!(matches!(try_inverse(&flat), Err(MathError::SingularMatrix { .. })));

        let m = DMat4::from_translation(DVec3::new(3.0, -1.0, 2.0));
        let inv = try_inverse(&m).unwrap();
        assert!(compose(&m, &inv).abs_diff_eq(DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn perspective_maps_near_and_far_to_clip_bounds() {
        let m = make_perspective(-1.0, 1.0, 1.0, -1.0, 1.0, 10.0);
        let near = transform_point(&m, DVec3::new(0.0, 0.0, -1.0));
        let far = transform_point(&m, DVec3::new(0.0, 0.0, -10.0));
        assert!((near.z + 1.0).abs() < 1e-12);
        assert!((far.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn orthographic_maps_box_to_unit_cube() {
        let m = make_orthographic(-4.0, 4.0, 2.0, -2.0, 1.0, 11.0);
        let corner = transform_point(&m, DVec3::new(4.0, 2.0, -11.0));
        assert!(corner.abs_diff_eq(DVec3::ONE, 1e-12));
        let other = transform_point(&m, DVec3::new(-4.0, -2.0, -1.0));
        assert!(other.abs_diff_eq(DVec3::NEG_ONE, 1e-12));
    }
}
