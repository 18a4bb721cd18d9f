//! The graph registry: owns all namespaces, compiles requests into
//! executable plans, and answers registry-wide dependency queries.

use crate::analysis::dependents::DependentsIndex;
use crate::analysis::topology;
use crate::display::trace::{self, TraceOrder};
use crate::error::GraphError;
use crate::graph::compiled::CompiledGraph;
use crate::store::namespace::DeclaredNamespace;
use crate::store::registry::Registry;
use crate::store::variable::VarSpec;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The registry of all namespaces, declared and external.
///
/// Compiled plans are cached per distinct requested output set and handed
/// out as shared `Arc`s; the registry itself is fixed after construction
/// apart from external leaves discovered during compilation.
#[derive(Debug)]
pub struct Graph {
    registry: Registry,
    external_source_names: Vec<String>,
    compiled: HashMap<Vec<String>, Arc<CompiledGraph>>,
    // Built lazily on the first dependents query. Declared inputs are fixed
    // at construction, so the index cannot go stale.
    reverse: Option<DependentsIndex>,
}

impl Graph {
    /// Builds the registry from declared namespaces (namespace name to its
    /// variable declarations) and the names of the external namespaces that
    /// may supply inputs.
    pub fn new<D, K, E, S>(declared: D, external_sources: E) -> Result<Self, GraphError>
    where
        D: IntoIterator<Item = (K, Vec<VarSpec>)>,
        K: AsRef<str>,
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Registry::new();
        for (name, specs) in declared {
            registry.register_declared(DeclaredNamespace::new(name.as_ref(), specs)?)?;
        }
        let mut external_source_names: Vec<String> = Vec::new();
        for source in external_sources {
            let source = source.into();
            registry.register_external(&source)?;
            if !external_source_names.contains(&source) {
                external_source_names.push(source);
            }
        }
        Ok(Self {
            registry,
            external_source_names,
            compiled: HashMap::new(),
            reverse: None,
        })
    }

    /// Compiles the requested qualified names into an execution plan.
    ///
    /// Requests are cached order-independently: compiling an equal set again
    /// returns the identical plan.
    pub fn compile<I, S>(&mut self, required: I) -> Result<Arc<CompiledGraph>, GraphError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut request: Vec<String> = required.into_iter().map(Into::into).collect();
        request.sort();
        request.dedup();

        if let Some(compiled) = self.compiled.get(&request) {
            return Ok(Arc::clone(compiled));
        }

        let topo = topology::sort(&mut self.registry, &request)?;
        let compiled = Arc::new(CompiledGraph::build(topo));
        debug!(
            "compiled plan for {:?}: {} nodes, {} external inputs",
            request,
            compiled.node_count(),
            compiled.required_external_names().count()
        );
        self.compiled.insert(request, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Qualified names that directly or transitively depend on any of the
    /// given names, seeds included. Spans the whole registry, not a compiled
    /// plan.
    pub fn dependents_of<I, S>(&mut self, names: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = &self.registry;
        let index = self
            .reverse
            .get_or_insert_with(|| DependentsIndex::build(registry));
        index.dependents_of(names.into_iter().map(Into::into))
    }

    /// Derivation trace for a variable, leaf-most explanations first.
    pub fn explain(&self, qual_name: &str) -> Result<String, GraphError> {
        self.explain_ordered(qual_name, TraceOrder::LeafFirst)
    }

    pub fn explain_ordered(
        &self,
        qual_name: &str,
        order: TraceOrder,
    ) -> Result<String, GraphError> {
        trace::format_derivation(&self.registry, qual_name, order)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn external_source_names(&self) -> &[String] {
        &self.external_source_names
    }
}
