use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Hands out monotonically increasing node ids.
///
/// Owned by a scene, so uniqueness is scoped to that scene instance.
/// Id `0` is never issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();
        assert!(a < b && b < c);
        assert_eq!(a, NodeId(1));
        assert_eq!(ids.issued(), 3);
    }

    #[test]
    fn allocators_are_independent() {
        let mut first = IdAllocator::new();
        let mut second = IdAllocator::new();
        first.allocate();
        first.allocate();
        assert_eq!(second.allocate(), NodeId(1));
    }
}
