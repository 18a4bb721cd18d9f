//! The declared model: names, variables, namespaces and their registry.
pub mod name;
pub mod namespace;
pub mod registry;
pub mod variable;

pub use name::{qualify, split_qualified, QUAL_SEP};
pub use namespace::{DeclaredNamespace, ExternalNamespace, Namespace};
pub use registry::Registry;
pub use variable::{Formula, VarSpec, Variable};
