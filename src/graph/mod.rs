//! The graph registry and its compiled execution plans.
pub mod compiled;
pub mod dag;

pub use compiled::{CompiledGraph, CompiledNode};
pub use dag::Graph;
