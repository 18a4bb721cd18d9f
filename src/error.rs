//! Defines the error types for graph registration, compilation and execution.

use thiserror::Error;

/// A structured error from the graph engine.
///
/// Variants carry qualified names (`namespace.variable`) wherever the
/// offending entity is a variable, so callers can inspect errors
/// programmatically instead of matching on message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The requested computation graph contains a circular dependency.
    #[error("Cycle detected at '{0}'")]
    Cycle(String),

    /// A qualified name references a namespace that is not in the registry.
    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    /// A declared namespace does not contain the requested variable.
    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    /// `execute` was called without any values for a required external
    /// namespace.
    #[error("Missing external source '{0}'")]
    MissingExternalSource(String),

    /// A required external namespace was supplied, but the specific
    /// variable's value is absent.
    #[error("Missing value for external variable '{0}'")]
    MissingExternalValue(String),

    /// Two namespaces were registered under the same name.
    #[error("Namespace '{0}' has already been registered")]
    DuplicateNamespace(String),

    /// A namespace declared the same variable name twice.
    #[error("Variable '{0}' is declared more than once")]
    DuplicateVariable(String),

    /// A namespace or variable name is empty or contains the qualifier
    /// separator.
    #[error("Invalid name '{0}': names must be non-empty and must not contain '.'")]
    InvalidName(String),

    /// A variable carries a derivation formula but declares no inputs.
    #[error("Variable '{0}' has a formula but declares no inputs")]
    FormulaWithoutInputs(String),
}
