//! Defines `Variable`, the immutable descriptor of one named quantity, and
//! `VarSpec`, the declaration it is minted from.

use crate::compute::Value;
use crate::error::GraphError;
use crate::store::name::{check_bare_name, qualify};
use indexmap::IndexMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A pure derivation function.
///
/// Receives one value per declared input, in declaration order. Formulas are
/// required to be deterministic and side-effect free; the result cache relies
/// on this contract.
#[derive(Clone)]
pub struct Formula(Arc<dyn Fn(&[Value]) -> Value + Send + Sync>);

impl Formula {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formula(..)")
    }
}

/// Declaration of a single variable inside a namespace.
///
/// Input order is declaration order and doubles as the formula's argument
/// order.
#[derive(Debug, Clone, Default)]
pub struct VarSpec {
    pub(crate) name: String,
    pub(crate) inputs: IndexMap<String, String>,
    pub(crate) formula: Option<Formula>,
    pub(crate) metadata: Option<String>,
    pub(crate) cacheable: bool,
}

impl VarSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declares an input: the unqualified `name` of another variable and the
    /// namespace `source` that supplies it.
    pub fn input(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.inputs.insert(name.into(), source.into());
        self
    }

    pub fn formula<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.formula = Some(Formula::new(f));
        self
    }

    /// Attaches descriptive text (e.g., the source expression) used by the
    /// derivation trace.
    pub fn metadata(mut self, text: impl Into<String>) -> Self {
        self.metadata = Some(text.into());
        self
    }

    /// Marks the variable's results as reusable for identical argument
    /// tuples. Use sparingly: the cache is never evicted.
    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }
}

/// An immutable descriptor of one named quantity: anything that can be
/// calculated from the values of its declared inputs by the attached
/// formula, or — for leaves — anything supplied from the outside.
///
/// Two `Variable`s compare equal when they share a namespace and a name,
/// regardless of formula or inputs. This identity is what value storage and
/// set membership during dependency-closure computation key on.
#[derive(Clone)]
pub struct Variable {
    name: Arc<str>,
    source: Arc<str>,
    qual: Arc<str>,
    inputs: Arc<IndexMap<String, String>>,
    formula: Option<Formula>,
    metadata: Option<Arc<str>>,
    cacheable: bool,
}

impl Variable {
    /// Mints a variable from its declaration within the namespace named
    /// `source`. Validates names and the formula/inputs invariant eagerly.
    pub(crate) fn from_spec(source: &str, spec: VarSpec) -> Result<Self, GraphError> {
        check_bare_name(&spec.name)?;
        for (input_name, input_source) in &spec.inputs {
            check_bare_name(input_name)?;
            check_bare_name(input_source)?;
        }
        let qual = qualify(source, &spec.name);
        if spec.formula.is_some() && spec.inputs.is_empty() {
            return Err(GraphError::FormulaWithoutInputs(qual));
        }
        Ok(Self {
            name: spec.name.into(),
            source: source.into(),
            qual: qual.into(),
            inputs: Arc::new(spec.inputs),
            formula: spec.formula,
            metadata: spec.metadata.map(Into::into),
            cacheable: spec.cacheable,
        })
    }

    /// Mints a bare leaf, as external namespaces do on demand.
    pub(crate) fn leaf(source: &str, name: &str) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            qual: qualify(source, name).into(),
            inputs: Arc::new(IndexMap::new()),
            formula: None,
            metadata: None,
            cacheable: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning namespace.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Qualified name, `"<namespace>.<variable>"`.
    pub fn qual_name(&self) -> &str {
        &self.qual
    }

    pub(crate) fn qual_arc(&self) -> &Arc<str> {
        &self.qual
    }

    /// Declared inputs in declaration order: unqualified name to supplying
    /// namespace name.
    pub fn inputs(&self) -> &IndexMap<String, String> {
        &self.inputs
    }

    pub fn formula(&self) -> Option<&Formula> {
        self.formula.as_ref()
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    pub fn cacheable(&self) -> bool {
        self.cacheable
    }

    /// A leaf (or "end") variable has no formula and must be supplied a
    /// value externally.
    pub fn is_leaf(&self) -> bool {
        self.formula.is_none()
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("qual", &self.qual)
            .field("inputs", &self.inputs)
            .field("formula", &self.formula)
            .field("cacheable", &self.cacheable)
            .finish()
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.qual == other.qual
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qual.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_builder_round_trip() {
        let spec = VarSpec::new("x")
            .input("y", "ext")
            .formula(|args| Value::Float(args[0].as_f64().unwrap() * 2.0))
            .metadata("x = 2 * y")
            .cacheable();
        let var = Variable::from_spec("calc", spec).unwrap();

        assert_eq!(var.qual_name(), "calc.x");
        assert_eq!(var.source(), "calc");
        assert_eq!(var.inputs().get_index(0), Some((&"y".to_string(), &"ext".to_string())));
        assert!(var.cacheable());
        assert!(!var.is_leaf());
        let out = var.formula().unwrap().call(&[Value::Int(3)]);
        assert_eq!(out, Value::Float(6.0));
    }

    #[test]
    fn formula_requires_inputs() {
        let spec = VarSpec::new("c").formula(|_| Value::Int(1));
        assert_eq!(
            Variable::from_spec("calc", spec).unwrap_err(),
            GraphError::FormulaWithoutInputs("calc.c".to_string())
        );
    }

    #[test]
    fn identity_ignores_formula_and_inputs() {
        let derived = Variable::from_spec(
            "calc",
            VarSpec::new("x").input("y", "ext").formula(|_| Value::Null),
        )
        .unwrap();
        let bare = Variable::leaf("calc", "x");

        assert_eq!(derived, bare);
        assert_ne!(bare, Variable::leaf("other", "x"));
    }

    #[test]
    fn separator_in_name_is_rejected() {
        let err = Variable::from_spec("calc", VarSpec::new("a.b")).unwrap_err();
        assert_eq!(err, GraphError::InvalidName("a.b".to_string()));
    }
}
