//! Human-readable derivation traces.
//!
//! Walks a variable's inputs recursively and reports, per visited variable,
//! either the external source it comes from or the metadata text of its
//! formula annotated with its immediate inputs. Shared sub-dependencies are
//! reported once.

use crate::error::GraphError;
use crate::store::name::{qualify, split_qualified};
use crate::store::registry::Registry;
use std::collections::HashSet;

/// Emission order of a derivation trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceOrder {
    /// Leaf-most explanations first; the requested quantity last.
    #[default]
    LeafFirst,
    /// The requested quantity first, then its dependencies.
    RootFirst,
}

pub(crate) fn format_derivation(
    registry: &Registry,
    qual_name: &str,
    order: TraceOrder,
) -> Result<String, GraphError> {
    let mut tracer = Tracer {
        registry,
        seen: HashSet::new(),
        entries: Vec::new(),
    };
    tracer.collect(qual_name)?;

    let mut entries = tracer.entries;
    if order == TraceOrder::RootFirst {
        entries.reverse();
    }
    Ok(entries.join("\n"))
}

struct Tracer<'a> {
    registry: &'a Registry,
    seen: HashSet<String>,
    entries: Vec<String>,
}

impl Tracer<'_> {
    /// Depth-first collection; inputs are explained before the variable
    /// itself, so `entries` ends up leaf-most first.
    fn collect(&mut self, qual_name: &str) -> Result<(), GraphError> {
        if !self.seen.insert(qual_name.to_string()) {
            return Ok(());
        }
        let (source, name) = split_qualified(qual_name)?;
        let namespace = self
            .registry
            .namespace(source)
            .ok_or_else(|| GraphError::UnknownSource(source.to_string()))?;

        if namespace.is_external() {
            // External leaves need no registered entry to be explained.
            self.entries
                .push(format!("'{name}' comes from external source '{source}'"));
            return Ok(());
        }

        let variable = namespace
            .get(name)
            .ok_or_else(|| GraphError::UnknownVariable(qual_name.to_string()))?;

        let mut input_quals: Vec<String> = variable
            .inputs()
            .iter()
            .map(|(input_name, input_source)| qualify(input_source, input_name))
            .collect();
        for input_qual in &input_quals {
            self.collect(input_qual)?;
        }

        input_quals.sort();
        let metadata = variable.metadata().unwrap_or("<no metadata>");
        self.entries
            .push(format!("'{qual_name}' depends on {input_quals:?} via\n\n{metadata}\n"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::namespace::DeclaredNamespace;
    use crate::store::variable::VarSpec;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register_declared(
                DeclaredNamespace::new(
                    "calc",
                    vec![
                        VarSpec::new("x")
                            .input("y", "ext")
                            .formula(|args| args[0].clone())
                            .metadata("x = 2 * y"),
                        VarSpec::new("u")
                            .input("x", "calc")
                            .formula(|args| args[0].clone())
                            .metadata("u = 2 * (x - 74)"),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        registry.register_external("ext").unwrap();
        registry
    }

    #[test]
    fn leaf_first_puts_the_request_last() {
        let text = format_derivation(&registry(), "calc.u", TraceOrder::LeafFirst).unwrap();

        let external = text.find("'y' comes from external source 'ext'").unwrap();
        let x = text.find("'calc.x' depends on [\"ext.y\"] via").unwrap();
        let u = text.find("'calc.u' depends on [\"calc.x\"] via").unwrap();
        assert!(external < x);
        assert!(x < u);
        assert!(text.contains("u = 2 * (x - 74)"));
    }

    #[test]
    fn root_first_reverses() {
        let text = format_derivation(&registry(), "calc.u", TraceOrder::RootFirst).unwrap();
        let external = text.find("comes from external source").unwrap();
        let u = text.find("'calc.u' depends on").unwrap();
        assert!(u < external);
    }

    #[test]
    fn shared_dependencies_are_reported_once() {
        let mut registry = Registry::new();
        registry
            .register_declared(
                DeclaredNamespace::new(
                    "calc",
                    vec![
                        VarSpec::new("b").input("src", "ext").formula(|a| a[0].clone()),
                        VarSpec::new("c").input("src", "ext").formula(|a| a[0].clone()),
                        VarSpec::new("d")
                            .input("b", "calc")
                            .input("c", "calc")
                            .formula(|a| a[0].clone()),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        registry.register_external("ext").unwrap();

        let text = format_derivation(&registry, "calc.d", TraceOrder::LeafFirst).unwrap();
        assert_eq!(text.matches("comes from external source").count(), 1);
    }

    #[test]
    fn unknown_names_fail() {
        let registry = registry();
        assert_eq!(
            format_derivation(&registry, "nope.x", TraceOrder::LeafFirst).unwrap_err(),
            GraphError::UnknownSource("nope".to_string())
        );
        assert_eq!(
            format_derivation(&registry, "calc.nope", TraceOrder::LeafFirst).unwrap_err(),
            GraphError::UnknownVariable("calc.nope".to_string())
        );
    }
}
