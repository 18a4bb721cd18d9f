//! Registry-wide reverse-dependency index.
//!
//! Answers "what breaks if I change X" over the entire registry,
//! independently of any compiled plan. Edges point input -> consumer, so the
//! dependents closure is a plain forward traversal.

use crate::store::name::qualify;
use crate::store::registry::Registry;
use petgraph::graph::NodeIndex;
use petgraph::prelude::StableDiGraph;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub(crate) struct DependentsIndex {
    graph: StableDiGraph<String, ()>,
    ids: HashMap<String, NodeIndex>,
}

impl DependentsIndex {
    /// Scans every registered variable's declared inputs once. Names are
    /// kept as plain strings: an input may reference an external leaf that
    /// no compilation has materialized yet.
    pub(crate) fn build(registry: &Registry) -> Self {
        let mut index = Self {
            graph: StableDiGraph::new(),
            ids: HashMap::new(),
        };
        for variable in registry.iter_variables() {
            let consumer = index.intern(variable.qual_name());
            for (input_name, input_source) in variable.inputs().iter() {
                let input = index.intern(&qualify(input_source, input_name));
                index.graph.add_edge(input, consumer, ());
            }
        }
        index
    }

    fn intern(&mut self, qual_name: &str) -> NodeIndex {
        if let Some(&ix) = self.ids.get(qual_name) {
            return ix;
        }
        let ix = self.graph.add_node(qual_name.to_string());
        self.ids.insert(qual_name.to_string(), ix);
        ix
    }

    /// Seeds plus every variable that directly or transitively consumes one
    /// of them. Seeds unknown to the registry contribute only themselves.
    pub(crate) fn dependents_of<I>(&self, seeds: I) -> HashSet<String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut result = HashSet::new();
        let mut stack = Vec::new();
        for seed in seeds {
            if let Some(&ix) = self.ids.get(&seed) {
                stack.push(ix);
            }
            result.insert(seed);
        }
        while let Some(ix) = stack.pop() {
            for neighbor in self.graph.neighbors_directed(ix, Direction::Outgoing) {
                if result.insert(self.graph[neighbor].clone()) {
                    stack.push(neighbor);
                }
            }
        }
        result
    }
}
