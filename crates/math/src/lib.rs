//! Linear algebra conventions and spatial bounds for the arbor scene graph.
//!
//! Built on glam's double-precision types. See [`linalg`] for the
//! composition convention every other crate relies on.
//!
//! # Invariants
//! - `compose(a, b)` applies `b` first (column vectors).
//! - A normalized [`Plane`] has a unit normal.
//! - [`Box3`] is empty when any `max` component is below `min`; empty boxes
//!   intersect nothing.
//! - [`Frustum`] normals point into the visible volume.

mod box3;
pub mod frustum;
mod line;
pub mod linalg;
mod plane;
mod sphere;

pub use box3::Box3;
pub use frustum::Frustum;
pub use line::Line3;
pub use linalg::{MathError, compose, transform_point, try_inverse};
pub use plane::Plane;
pub use sphere::Sphere;

pub use glam::{DMat4, DQuat, DVec3, DVec4};

pub fn crate_info() -> &'static str {
    "arbor-math v0.1.0"
}
