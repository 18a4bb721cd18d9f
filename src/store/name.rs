//! Qualified-name handling.
//!
//! Every variable is globally identified by `"<namespace>.<variable>"`.
//! Namespace and variable names must not contain the separator themselves,
//! which keeps the qualified form unambiguous in both directions.

use crate::error::GraphError;

/// Separator between a namespace name and a variable name.
pub const QUAL_SEP: char = '.';

/// Returns the qualified name of a variable owned by the given namespace.
pub fn qualify(namespace: &str, variable: &str) -> String {
    format!("{namespace}{QUAL_SEP}{variable}")
}

/// Splits a qualified name back into `(namespace, variable)`.
pub fn split_qualified(qual_name: &str) -> Result<(&str, &str), GraphError> {
    qual_name
        .rsplit_once(QUAL_SEP)
        .ok_or_else(|| GraphError::InvalidName(qual_name.to_string()))
}

/// Checks that a bare namespace or variable name is usable in a qualified
/// name.
pub fn check_bare_name(name: &str) -> Result<(), GraphError> {
    if name.is_empty() || name.contains(QUAL_SEP) {
        return Err(GraphError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn qualify_and_split_are_inverse() {
        let qual = qualify("calc", "x");
        assert_eq!(qual, "calc.x");
        assert_eq!(split_qualified(&qual).unwrap(), ("calc", "x"));
    }

    #[rstest]
    #[case("")]
    #[case("a.b")]
    #[case(".")]
    fn bad_bare_names_are_rejected(#[case] name: &str) {
        assert_eq!(
            check_bare_name(name),
            Err(GraphError::InvalidName(name.to_string()))
        );
    }

    #[test]
    fn split_without_separator_fails() {
        assert_eq!(
            split_qualified("loose"),
            Err(GraphError::InvalidName("loose".to_string()))
        );
    }
}
