//! Developer tooling: scene inspector and tree dumps.
//!
//! # Invariants
//! - Tools only read the scene; nothing here mutates it.

mod inspector;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "arbor-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
