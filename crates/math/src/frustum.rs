use glam::{DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};

use crate::{Box3, Plane, Sphere};

pub const NEAR: usize = 0;
pub const FAR: usize = 1;
pub const LEFT: usize = 2;
pub const RIGHT: usize = 3;
pub const TOP: usize = 4;
pub const BOTTOM: usize = 5;

/// Six planes bounding a camera's visible volume.
///
/// Every normal points into the volume, so a point is visible when its
/// signed distance to all six planes is non-negative. Tests never mutate
/// the frustum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Default for Frustum {
    /// The clip-space cube, i.e. the frustum of the identity matrix.
    fn default() -> Self {
        Self::from_matrix(&DMat4::IDENTITY)
    }
}

impl Frustum {
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract the planes of `m` (typically `projection * view`).
    ///
    /// Planes come out in the space `m` maps from: pass the projection alone
    /// for view-space planes, or `projection * view` for world-space planes.
    pub fn from_matrix(m: &DMat4) -> Self {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);
        let plane = |v: DVec4| Plane::from_components(v.x, v.y, v.z, v.w).normalized();

        let mut planes = [Plane::default(); 6];
        planes[NEAR] = plane(r3 + r2);
        planes[FAR] = plane(r3 - r2);
        planes[LEFT] = plane(r3 + r0);
        planes[RIGHT] = plane(r3 - r0);
        planes[TOP] = plane(r3 - r1);
        planes[BOTTOM] = plane(r3 + r1);
        Self { planes }
    }

    pub fn near(&self) -> &Plane {
        &self.planes[NEAR]
    }

    pub fn far(&self) -> &Plane {
        &self.planes[FAR]
    }

    pub fn left(&self) -> &Plane {
        &self.planes[LEFT]
    }

    pub fn right(&self) -> &Plane {
        &self.planes[RIGHT]
    }

    pub fn top(&self) -> &Plane {
        &self.planes[TOP]
    }

    pub fn bottom(&self) -> &Plane {
        &self.planes[BOTTOM]
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        self.planes.iter().all(|p| p.distance_to_point(point) >= 0.0)
    }

    /// Conservative box test using each plane's positive vertex.
    ///
    /// May report a box just outside a frustum corner as visible, never the
    /// reverse. Empty boxes are never visible.
    pub fn intersects_box(&self, b: &Box3) -> bool {
        if b.is_empty() {
            return false;
        }
        self.planes.iter().all(|plane| {
            let n = plane.normal;
            let positive = DVec3::new(
                if n.x > 0.0 { b.max.x } else { b.min.x },
                if n.y > 0.0 { b.max.y } else { b.min.y },
                if n.z > 0.0 { b.max.z } else { b.min.z },
            );
            plane.distance_to_point(positive) >= 0.0
        })
    }

    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.distance_to_point(sphere.center) >= -sphere.radius)
    }
}
