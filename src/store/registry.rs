//! The merged lookup space of all namespaces, declared and external.

use crate::error::GraphError;
use crate::store::name::qualify;
use crate::store::namespace::{DeclaredNamespace, ExternalNamespace, Namespace};
use crate::store::variable::Variable;
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct Registry {
    namespaces: IndexMap<String, Namespace>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_declared(&mut self, ns: DeclaredNamespace) -> Result<(), GraphError> {
        let name = ns.name().to_string();
        if self.namespaces.contains_key(&name) {
            return Err(GraphError::DuplicateNamespace(name));
        }
        self.namespaces.insert(name, Namespace::Declared(ns));
        Ok(())
    }

    /// Registers an external namespace. Re-registering the same external
    /// name is a no-op; colliding with a declared namespace is an error.
    pub fn register_external(&mut self, name: &str) -> Result<(), GraphError> {
        match self.namespaces.get(name) {
            Some(Namespace::External(_)) => Ok(()),
            Some(Namespace::Declared(_)) => Err(GraphError::DuplicateNamespace(name.to_string())),
            None => {
                let ns = ExternalNamespace::new(name)?;
                self.namespaces
                    .insert(name.to_string(), Namespace::External(ns));
                Ok(())
            }
        }
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// Resolves `source.name` to a variable.
    ///
    /// Looking up an unknown name in an external namespace mints and
    /// registers a fresh leaf; in a declared namespace it is an error.
    pub fn resolve(&mut self, source: &str, name: &str) -> Result<Variable, GraphError> {
        match self.namespaces.get_mut(source) {
            None => Err(GraphError::UnknownSource(source.to_string())),
            Some(Namespace::Declared(ns)) => ns
                .get(name)
                .cloned()
                .ok_or_else(|| GraphError::UnknownVariable(qualify(source, name))),
            Some(Namespace::External(ns)) => Ok(ns.get_or_insert(name).clone()),
        }
    }

    /// Iterates every registered variable across all namespaces.
    pub fn iter_variables(&self) -> impl Iterator<Item = &Variable> {
        self.namespaces.values().flat_map(|ns| ns.iter())
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }
}
