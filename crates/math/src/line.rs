use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A line segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3 {
    pub start: DVec3,
    pub end: DVec3,
}

impl Line3 {
    pub const fn new(start: DVec3, end: DVec3) -> Self {
        Self { start, end }
    }

    pub fn center(&self) -> DVec3 {
        (self.start + self.end) * 0.5
    }

    /// Unnormalized, `end - start`.
    pub fn direction(&self) -> DVec3 {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.direction().length()
    }

    /// Point at parameter `t`; `0` is `start`, `1` is `end`.
    pub fn at(&self, t: f64) -> DVec3 {
        self.start + self.direction() * t
    }

    /// Parameter of the point on the line closest to `point`.
    pub fn closest_point_to_point_parameter(&self, point: DVec3, clamp_to_segment: bool) -> f64 {
        let direction = self.direction();
        let length_sq = direction.length_squared();
        if length_sq == 0.0 {
            return 0.0;
        }
        let t = direction.dot(point - self.start) / length_sq;
        if clamp_to_segment { t.clamp(0.0, 1.0) } else { t }
    }

    pub fn closest_point_to_point(&self, point: DVec3, clamp_to_segment: bool) -> DVec3 {
        self.at(self.closest_point_to_point_parameter(point, clamp_to_segment))
    }
}
