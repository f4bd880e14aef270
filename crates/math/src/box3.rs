use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::{Plane, Sphere, linalg};

/// Axis-aligned bounding box.
///
/// A box is empty when any `max` component is below the matching `min`
/// component. Empty boxes intersect nothing and contain nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Box3 {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for Box3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Box3 {
    /// Identity element for [`Box3::union`] and [`Box3::expand_by_point`].
    pub const EMPTY: Self = Self { min: DVec3::INFINITY, max: DVec3::NEG_INFINITY };

    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_and_size(center: DVec3, size: DVec3) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |b, p| b.expand_by_point(p))
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    #[must_use]
    pub fn expand_by_point(self, point: DVec3) -> Self {
        Self::new(self.min.min(point), self.max.max(point))
    }

    /// Zero for an empty box.
    pub fn center(&self) -> DVec3 {
        if self.is_empty() { DVec3::ZERO } else { (self.min + self.max) * 0.5 }
    }

    /// Zero for an empty box.
    pub fn size(&self) -> DVec3 {
        if self.is_empty() { DVec3::ZERO } else { self.max - self.min }
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn contains_box(&self, other: &Box3) -> bool {
        !other.is_empty() && self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    /// Overlap of two boxes; empty when they are disjoint.
    #[must_use]
    pub fn intersect(self, other: &Box3) -> Self {
        let overlap = Self::new(self.min.max(other.min), self.max.min(other.max));
        if overlap.is_empty() { Self::EMPTY } else { overlap }
    }

    #[must_use]
    pub fn union(self, other: &Box3) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn intersects_box(&self, other: &Box3) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y
            || other.max.z < self.min.z
            || other.min.z > self.max.z)
    }

    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        if self.is_empty() {
            return false;
        }
        let closest = self.clamp_point(sphere.center);
        closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
    }

    /// True when the plane passes through the box.
    pub fn intersects_plane(&self, plane: &Plane) -> bool {
        if self.is_empty() {
            return false;
        }
        // extremes of the box along the plane normal
        let mut min = 0.0;
        let mut max = 0.0;
        for axis in 0..3 {
            let n = plane.normal[axis];
            if n > 0.0 {
                min += n * self.min[axis];
                max += n * self.max[axis];
            } else {
                min += n * self.max[axis];
                max += n * self.min[axis];
            }
        }
        min <= -plane.constant && max >= -plane.constant
    }

    pub fn clamp_point(&self, point: DVec3) -> DVec3 {
        point.clamp(self.min, self.max)
    }

    /// Zero for points inside the box.
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.clamp_point(point).distance(point)
    }

    pub fn corners(&self) -> [DVec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            DVec3::new(lo.x, lo.y, lo.z),
            DVec3::new(lo.x, lo.y, hi.z),
            DVec3::new(lo.x, hi.y, lo.z),
            DVec3::new(lo.x, hi.y, hi.z),
            DVec3::new(hi.x, lo.y, lo.z),
            DVec3::new(hi.x, lo.y, hi.z),
            DVec3::new(hi.x, hi.y, lo.z),
            DVec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Bounds of this box after transforming all eight corners by `m`.
    ///
    /// Empty boxes stay empty.
    #[must_use]
    pub fn transformed(&self, m: &DMat4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::from_points(self.corners().into_iter().map(|c| linalg::transform_point(m, c)))
    }
}
