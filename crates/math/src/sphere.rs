use glam::DVec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: DVec3,
    pub radius: f64,
}

impl Sphere {
    pub const fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_point_on_surface() {
        let sphere = Sphere::new(DVec3::ZERO, 2.0);
        assert!(sphere.contains_point(DVec3::new(0.0, 2.0, 0.0)));
        assert!(!sphere.contains_point(DVec3::new(0.0, 2.1, 0.0)));
    }
}
