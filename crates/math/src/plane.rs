use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::{Line3, Sphere};

/// A plane `dot(normal, p) + constant == 0`.
///
/// Signed distances are positive on the side the normal points toward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: DVec3,
    pub constant: f64,
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(DVec3::X, 0.0)
    }
}

impl Plane {
    pub const fn new(normal: DVec3, constant: f64) -> Self {
        Self { normal, constant }
    }

    /// Raw plane-equation coefficients `ax + by + cz + d`. Not normalized.
    pub const fn from_components(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self::new(DVec3::new(a, b, c), d)
    }

    /// `normal` is expected to be unit length.
    pub fn from_normal_and_coplanar_point(normal: DVec3, point: DVec3) -> Self {
        Self::new(normal, -point.dot(normal))
    }

    /// Plane through three points. The normal faces the side from which
    /// `a, b, c` appear counter-clockwise.
    pub fn from_coplanar_points(a: DVec3, b: DVec3, c: DVec3) -> Self {
        let normal = (c - b).cross(a - b).normalize();
        Self::from_normal_and_coplanar_point(normal, a)
    }

    /// Scale so that `|normal| == 1`. A zero normal is left as is.
    #[must_use]
    pub fn normalized(self) -> Self {
        let length = self.normal.length();
        if length <= f64::EPSILON {
            return self;
        }
        let inv = 1.0 / length;
        Self::new(self.normal * inv, self.constant * inv)
    }

    #[must_use]
    pub fn negated(self) -> Self {
        Self::new(-self.normal, -self.constant)
    }

    #[inline]
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.constant
    }

    pub fn distance_to_sphere(&self, sphere: &Sphere) -> f64 {
        self.distance_to_point(sphere.center) - sphere.radius
    }

    /// Orthogonal projection of `point` onto the plane.
    pub fn project_point(&self, point: DVec3) -> DVec3 {
        point - self.normal * self.distance_to_point(point)
    }

    /// Where the segment crosses the plane, if it does.
    ///
    /// A segment lying in the plane reports its start point.
    pub fn intersect_line(&self, line: &Line3) -> Option<DVec3> {
        let direction = line.direction();
        let denominator = self.normal.dot(direction);
        if denominator == 0.0 {
            return (self.distance_to_point(line.start) == 0.0).then_some(line.start);
        }
        let t = -(line.start.dot(self.normal) + self.constant) / denominator;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(line.at(t))
    }

    /// True when the segment endpoints lie strictly on opposite sides.
    pub fn intersects_line(&self, line: &Line3) -> bool {
        let start = self.distance_to_point(line.start);
        let end = self.distance_to_point(line.end);
        (start < 0.0 && end > 0.0) || (end < 0.0 && start > 0.0)
    }

    pub fn coplanar_point(&self) -> DVec3 {
        self.normal * -self.constant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_distance_follows_normal() {
        let plane = Plane::from_normal_and_coplanar_point(DVec3::Y, DVec3::new(0.0, 5.0, 0.0));
        assert_eq!(plane.distance_to_point(DVec3::new(3.0, 5.0, -2.0)), 0.0);
        assert_eq!(plane.distance_to_point(DVec3::new(0.0, 7.0, 0.0)), 2.0);
        assert_eq!(plane.distance_to_point(DVec3::new(0.0, 4.0, 0.0)), -1.0);
    }

    #[test]
    fn normalize_yields_unit_normal() {
        let plane = Plane::from_components(0.0, 2.0, 0.0, -10.0).normalized();
        assert!((plane.normal.length() - 1.0).abs() < 1e-12);
        assert!(plane.distance_to_point(DVec3::new(0.0, 5.0, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn normalize_leaves_degenerate_plane_alone() {
        let plane = Plane::from_components(0.0, 0.0, 0.0, 3.0);
        assert_eq!(plane.normalized(), plane);
    }

    #[test]
    fn coplanar_points_winding() {
        let plane = Plane::from_coplanar_points(DVec3::ZERO, DVec3::X, DVec3::Y);
        // counter-clockwise seen from +z, so the normal faces +z
        assert!(plane.normal.abs_diff_eq(DVec3::Z, 1e-12));
        assert_eq!(plane.constant, 0.0);
    }

    #[test]
    fn negate_flips_sides() {
        let plane = Plane::new(DVec3::Z, -1.0);
        let p = DVec3::new(0.0, 0.0, 3.0);
        assert_eq!(plane.negated().distance_to_point(p), -plane.distance_to_point(p));
    }

    #[test]
    fn projection_and_coplanar_point_lie_on_plane() {
        let plane = Plane::from_normal_and_coplanar_point(DVec3::X, DVec3::new(2.0, 0.0, 0.0));
        let projected = plane.project_point(DVec3::new(9.0, 1.0, 1.0));
        assert_eq!(projected, DVec3::new(2.0, 1.0, 1.0));
        assert_eq!(plane.distance_to_point(plane.coplanar_point()), 0.0);
    }

    #[test]
    fn sphere_distance_subtracts_radius() {
        let plane = Plane::new(DVec3::Y, 0.0);
        let sphere = Sphere::new(DVec3::new(0.0, 3.0, 0.0), 1.0);
        assert_eq!(plane.distance_to_sphere(&sphere), 2.0);
    }

    #[test]
    fn segment_crossing() {
        let plane = Plane::new(DVec3::Y, 0.0);
        let crossing = Line3::new(DVec3::new(0.0, -1.0, 0.0), DVec3::new(0.0, 3.0, 0.0));
        assert!(plane.intersects_line(&crossing));
        assert_eq!(plane.intersect_line(&crossing), Some(DVec3::ZERO));

        let above = Line3::new(DVec3::new(0.0, 1.0, 0.0), DVec3::new(0.0, 3.0, 0.0));
        assert!(!plane.intersects_line(&above));
        assert_eq!(plane.intersect_line(&above), None);

        let inside = Line3::new(DVec3::ZERO, DVec3::X);
        assert_eq!(plane.intersect_line(&inside), Some(DVec3::ZERO));
    }
}
