//! Shared value types for the arbor scene graph.
//!
//! # Invariants
//! - Node ids are allocated by the owning scene, never from global state.
//! - Cached derived values are either `Clean` or `Dirty`; nothing else.

mod cached;
mod id;
mod types;

pub use cached::Cached;
pub use id::IdAllocator;
pub use types::{Color, NodeId, Transform};

pub fn crate_info() -> &'static str {
    "arbor-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
