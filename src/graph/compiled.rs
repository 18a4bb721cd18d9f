//! The compiled execution plan: an immutable, topologically ordered node
//! list for one requested output set, plus everything needed to run it
//! forward (`execute`) and to rerun just the affected part after a change
//! (`recompute`).

use crate::analysis::topology::TopoOrder;
use crate::compute::ledger::Values;
use crate::compute::value::Value;
use crate::compute::ExternalValues;
use crate::error::GraphError;
use crate::store::name::qualify;
use crate::store::variable::Variable;
use indexmap::IndexMap;
use log::warn;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// One scheduled variable together with its resolved inputs, in formula
/// argument order.
///
/// Identity follows the variable: two nodes for the same variable are equal
/// regardless of the input list, which is what set membership during
/// closure computation relies on.
#[derive(Debug, Clone)]
pub struct CompiledNode {
    variable: Variable,
    inputs: Vec<Variable>,
}

impl CompiledNode {
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn inputs(&self) -> &[Variable] {
        &self.inputs
    }
}

impl PartialEq for CompiledNode {
    fn eq(&self, other: &Self) -> bool {
        self.variable == other.variable
    }
}

impl Eq for CompiledNode {}

impl std::hash::Hash for CompiledNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.variable.hash(state);
    }
}

/// An immutable execution plan for one requested output set.
///
/// Built once by [`Graph::compile`](crate::graph::Graph::compile) and safe
/// to share (read-only) across independent [`Values`] stores.
#[derive(Debug)]
pub struct CompiledGraph {
    /// Every node appears after all of its inputs.
    ordered_nodes: Vec<CompiledNode>,
    /// Qualified name -> position in `ordered_nodes`.
    index: HashMap<Arc<str>, usize>,
    /// External namespace -> unqualified name -> position in `ordered_nodes`.
    required_externals: IndexMap<String, IndexMap<String, usize>>,
    /// Direct consumers per node, aligned with `ordered_nodes` and listed in
    /// topological order.
    dependents: Vec<SmallVec<[u32; 4]>>,
}

impl CompiledGraph {
    pub(crate) fn build(topo: TopoOrder) -> Self {
        let TopoOrder {
            ordered,
            used_externals,
        } = topo;

        let ordered_nodes: Vec<CompiledNode> = ordered
            .into_iter()
            .map(|(variable, inputs)| CompiledNode { variable, inputs })
            .collect();

        let mut index = HashMap::with_capacity(ordered_nodes.len());
        for (position, node) in ordered_nodes.iter().enumerate() {
            index.insert(node.variable.qual_arc().clone(), position);
        }

        let mut dependents: Vec<SmallVec<[u32; 4]>> =
            vec![SmallVec::new(); ordered_nodes.len()];
        for (position, node) in ordered_nodes.iter().enumerate() {
            for input in &node.inputs {
                dependents[index[input.qual_name()]].push(position as u32);
            }
        }

        let mut required_externals: IndexMap<String, IndexMap<String, usize>> = IndexMap::new();
        for variable in &used_externals {
            required_externals
                .entry(variable.source().to_string())
                .or_default()
                .insert(variable.name().to_string(), index[variable.qual_name()]);
        }

        Self {
            ordered_nodes,
            index,
            required_externals,
            dependents,
        }
    }

    /// Calculates every node of the plan.
    ///
    /// `external_values` may be a superset of what the plan needs; unused
    /// entries are ignored. Mutates `values` and nothing else.
    pub fn execute(
        &self,
        external_values: &ExternalValues,
        values: &mut Values,
    ) -> Result<(), GraphError> {
        self.assign_external_values(external_values, values)?;
        self.calculate(0..self.ordered_nodes.len(), values);
        Ok(())
    }

    /// Applies a set of changed values and recalculates only their
    /// transitive dependents; everything else keeps its prior value.
    ///
    /// Changed names are resolved against the plan: required externals and
    /// internal nodes alike (the latter permits what-if overrides of derived
    /// values — such an override lasts until its own upstream inputs are
    /// next recomputed). A name outside the plan is logged and skipped.
    pub fn recompute(&self, changed: &ExternalValues, values: &mut Values) {
        let mut changed_nodes = Vec::new();
        for (source_name, variables) in changed.iter() {
            for (var_name, value) in variables {
                let qual_name = qualify(source_name, var_name);
                match self.index.get(qual_name.as_str()) {
                    Some(&position) => {
                        values.set(&self.ordered_nodes[position].variable, value.clone());
                        changed_nodes.push(position);
                    }
                    None => {
                        warn!("'{qual_name}' is not in the calculation path, update has no effect")
                    }
                }
            }
        }

        let affected = self.collect_affected(&changed_nodes);
        for &position in &affected {
            values.reset(&self.ordered_nodes[position].variable);
        }
        self.calculate(affected.iter().copied(), values);
    }

    fn assign_external_values(
        &self,
        external_values: &ExternalValues,
        values: &mut Values,
    ) -> Result<(), GraphError> {
        for (source_name, variables) in &self.required_externals {
            let provided = external_values
                .source(source_name)
                .ok_or_else(|| GraphError::MissingExternalSource(source_name.clone()))?;
            for (var_name, &position) in variables {
                let value = provided.get(var_name).ok_or_else(|| {
                    GraphError::MissingExternalValue(qualify(source_name, var_name))
                })?;
                values.set(&self.ordered_nodes[position].variable, value.clone());
            }
        }
        Ok(())
    }

    /// Runs the given (topologically ordered) subset of nodes.
    ///
    /// Leaves are skipped: external ones were assigned beforehand, and a
    /// non-external leaf reaching a consumer uncalculated is a configuration
    /// error surfaced by the invariant check below.
    fn calculate<I>(&self, nodes: I, values: &mut Values)
    where
        I: IntoIterator<Item = usize>,
    {
        let mut args: SmallVec<[Value; 4]> = SmallVec::new();
        for position in nodes {
            let node = &self.ordered_nodes[position];
            let Some(formula) = node.variable.formula() else {
                continue;
            };

            args.clear();
            for input in &node.inputs {
                let value = values.get(input.qual_name()).unwrap_or_else(|| {
                    panic!(
                        "BUG: uninitialized input '{}' for '{}' despite topological order",
                        input.qual_name(),
                        node.variable.qual_name()
                    )
                });
                args.push(value.clone());
            }

            if node.variable.cacheable() {
                if let Some(hit) = values.cache_lookup(&node.variable, &args) {
                    let hit = hit.clone();
                    values.set(&node.variable, hit);
                    continue;
                }
            }
            let result = formula.call(&args);
            if node.variable.cacheable() {
                values.cache_store(&node.variable, &args, result.clone());
            }
            values.set(&node.variable, result);
        }
    }

    /// Transitive closure of direct consumers, as positions into
    /// `ordered_nodes` in ascending (hence topological) order. The changed
    /// nodes themselves are not part of the result — their values were just
    /// assigned.
    fn collect_affected(&self, changed: &[usize]) -> Vec<usize> {
        let mut affected = vec![false; self.ordered_nodes.len()];
        let mut stack: Vec<usize> = changed.to_vec();
        while let Some(position) = stack.pop() {
            for &dependent in &self.dependents[position] {
                let dependent = dependent as usize;
                if !affected[dependent] {
                    affected[dependent] = true;
                    stack.push(dependent);
                }
            }
        }
        (0..self.ordered_nodes.len())
            .filter(|&position| affected[position])
            .collect()
    }

    pub fn nodes(&self) -> &[CompiledNode] {
        &self.ordered_nodes
    }

    pub fn node_count(&self) -> usize {
        self.ordered_nodes.len()
    }

    pub fn contains(&self, qual_name: &str) -> bool {
        self.index.contains_key(qual_name)
    }

    /// The external leaves this plan consumes, as (namespace, name) pairs
    /// grouped by namespace.
    pub fn required_external_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.required_externals
            .iter()
            .flat_map(|(source, variables)| {
                variables.keys().map(move |name| (source.as_str(), name.as_str()))
            })
    }
}
