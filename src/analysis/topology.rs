//! Topological ordering via depth-first search.
//!
//! Returns the requested variables and everything they depend on, ordered so
//! that every dependency appears before its consumer. Post-order DFS on the
//! input edges gives exactly that; a name on the in-progress stack that is
//! revisited signals a cycle.
//!
//! Traversal is driven by qualified names rather than pre-assigned ids:
//! resolving an input against an external namespace is what discovers and
//! registers the leaf, so the walk and the registry grow together.

use crate::error::GraphError;
use crate::store::name::{qualify, split_qualified};
use crate::store::registry::Registry;
use crate::store::variable::Variable;
use std::collections::HashMap;

#[derive(Clone, PartialEq, Eq)]
enum VisitState {
    Visiting, // Used for cycle detection
    Visited,
}

/// Result of one traversal: each entry pairs a variable with its resolved
/// inputs, dependencies first. External leaves are reported separately.
#[derive(Debug, Default)]
pub(crate) struct TopoOrder {
    pub ordered: Vec<(Variable, Vec<Variable>)>,
    pub used_externals: Vec<Variable>,
}

pub(crate) fn sort(registry: &mut Registry, required: &[String]) -> Result<TopoOrder, GraphError> {
    let mut state = HashMap::new();
    let mut out = TopoOrder::default();
    for qual_name in required {
        visit(registry, qual_name, &mut state, &mut out)?;
    }
    Ok(out)
}

fn visit(
    registry: &mut Registry,
    qual_name: &str,
    state: &mut HashMap<String, VisitState>,
    out: &mut TopoOrder,
) -> Result<(), GraphError> {
    match state.get(qual_name) {
        Some(VisitState::Visited) => return Ok(()),
        Some(VisitState::Visiting) => return Err(GraphError::Cycle(qual_name.to_string())),
        None => {
            state.insert(qual_name.to_string(), VisitState::Visiting);
        }
    }

    let (source, name) = split_qualified(qual_name)?;
    let variable = registry.resolve(source, name)?;
    if registry
        .namespace(source)
        .is_some_and(|ns| ns.is_external())
    {
        out.used_externals.push(variable.clone());
    }

    let mut inputs = Vec::with_capacity(variable.inputs().len());
    for (input_name, input_source) in variable.inputs().iter() {
        let input_qual = qualify(input_source, input_name);
        visit(registry, &input_qual, state, out)?;
        inputs.push(registry.resolve(input_source, input_name)?);
    }

    state.insert(qual_name.to_string(), VisitState::Visited);
    out.ordered.push((variable, inputs));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Value;
    use crate::store::namespace::DeclaredNamespace;
    use crate::store::variable::VarSpec;

    fn add(args: &[Value]) -> Value {
        Value::Float(args.iter().filter_map(Value::as_f64).sum())
    }

    fn registry(specs: Vec<VarSpec>) -> Registry {
        let mut registry = Registry::new();
        registry
            .register_declared(DeclaredNamespace::new("calc", specs).unwrap())
            .unwrap();
        registry.register_external("ext").unwrap();
        registry
    }

    #[test]
    fn diamond_dependency_orders_parents_first() {
        // Shape: a -> b, a -> c, b+c -> d, with a fed by ext.src.
        let mut registry = registry(vec![
            VarSpec::new("a").input("src", "ext").formula(add),
            VarSpec::new("b").input("a", "calc").formula(add),
            VarSpec::new("c").input("a", "calc").formula(add),
            VarSpec::new("d")
                .input("b", "calc")
                .input("c", "calc")
                .formula(add),
        ]);

        let topo = sort(&mut registry, &["calc.d".to_string()]).unwrap();
        let order: Vec<&str> = topo
            .ordered
            .iter()
            .map(|(var, _)| var.qual_name())
            .collect();

        let pos = |qual: &str| order.iter().position(|&q| q == qual).unwrap();
        assert!(pos("ext.src") < pos("calc.a"));
        assert!(pos("calc.a") < pos("calc.b"));
        assert!(pos("calc.a") < pos("calc.c"));
        assert!(pos("calc.b") < pos("calc.d"));
        assert!(pos("calc.c") < pos("calc.d"));
        assert_eq!(order.len(), 5);

        // The discovered external leaf was registered on the way.
        let externals: Vec<&str> = topo
            .used_externals
            .iter()
            .map(|v| v.qual_name())
            .collect();
        assert_eq!(externals, ["ext.src"]);
    }

    #[test]
    fn shared_dependency_is_visited_once() {
        let mut registry = registry(vec![
            VarSpec::new("b").input("src", "ext").formula(add),
            VarSpec::new("c").input("src", "ext").formula(add),
        ]);

        let topo = sort(
            &mut registry,
            &["calc.b".to_string(), "calc.c".to_string()],
        )
        .unwrap();
        assert_eq!(topo.ordered.len(), 3);
        assert_eq!(topo.used_externals.len(), 1);
    }

    #[test]
    fn cycle_is_detected_and_named() {
        let mut registry = registry(vec![
            VarSpec::new("p").input("q", "calc").formula(add),
            VarSpec::new("q").input("p", "calc").formula(add),
        ]);

        let err = sort(&mut registry, &["calc.p".to_string()]).unwrap_err();
        assert_eq!(err, GraphError::Cycle("calc.p".to_string()));
    }

    #[test]
    fn unknown_source_fails() {
        let mut registry = registry(vec![VarSpec::new("x")
            .input("y", "elsewhere")
            .formula(add)]);
        let err = sort(&mut registry, &["calc.x".to_string()]).unwrap_err();
        assert_eq!(err, GraphError::UnknownSource("elsewhere".to_string()));
    }
}
