//! Graph algorithms: topological ordering and reverse-dependency queries.
pub(crate) mod dependents;
pub(crate) mod topology;
