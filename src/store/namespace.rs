//! Namespaces: named scopes owning sets of variables.

use crate::error::GraphError;
use crate::store::name::{check_bare_name, qualify};
use crate::store::variable::{VarSpec, Variable};
use indexmap::IndexMap;
use std::sync::Arc;

/// A named scope owning variables.
///
/// *Declared* namespaces are fixed at construction. *External* namespaces
/// start empty and register a fresh leaf whenever an unknown name is looked
/// up — this is how compilation discovers which upstream inputs a requested
/// calculation needs without requiring them to be pre-declared.
#[derive(Debug)]
pub enum Namespace {
    Declared(DeclaredNamespace),
    External(ExternalNamespace),
}

impl Namespace {
    pub fn name(&self) -> &str {
        match self {
            Namespace::Declared(ns) => &ns.name,
            Namespace::External(ns) => &ns.name,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Namespace::External(_))
    }

    /// Read-only lookup by unqualified name. Never registers anything, even
    /// on external namespaces.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        match self {
            Namespace::Declared(ns) => ns.variables.get(name),
            Namespace::External(ns) => ns.variables.get(name),
        }
    }

    /// Iterates variables in declaration (or discovery) order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        match self {
            Namespace::Declared(ns) => ns.variables.values(),
            Namespace::External(ns) => ns.variables.values(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Namespace::Declared(ns) => ns.variables.len(),
            Namespace::External(ns) => ns.variables.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A namespace fixed at construction from a list of variable declarations.
#[derive(Debug)]
pub struct DeclaredNamespace {
    name: Arc<str>,
    variables: IndexMap<String, Variable>,
}

impl DeclaredNamespace {
    /// Mints one `Variable` per spec. Duplicate names within the namespace
    /// are a registration error.
    pub fn new(name: &str, specs: Vec<VarSpec>) -> Result<Self, GraphError> {
        check_bare_name(name)?;
        let mut variables = IndexMap::with_capacity(specs.len());
        for spec in specs {
            let var = Variable::from_spec(name, spec)?;
            let key = var.name().to_string();
            if variables.contains_key(&key) {
                return Err(GraphError::DuplicateVariable(qualify(name, &key)));
            }
            variables.insert(key, var);
        }
        Ok(Self {
            name: name.into(),
            variables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }
}

/// A namespace that grows on demand.
#[derive(Debug)]
pub struct ExternalNamespace {
    name: Arc<str>,
    variables: IndexMap<String, Variable>,
}

impl ExternalNamespace {
    pub fn new(name: &str) -> Result<Self, GraphError> {
        check_bare_name(name)?;
        Ok(Self {
            name: name.into(),
            variables: IndexMap::new(),
        })
    }

    /// Looks up `name`, minting and registering a fresh leaf when absent.
    pub fn get_or_insert(&mut self, name: &str) -> &Variable {
        if !self.variables.contains_key(name) {
            let var = Variable::leaf(&self.name, name);
            self.variables.insert(name.to_string(), var);
        }
        &self.variables[name]
    }
}
