//! Run-time storage of variable values and the formula result cache.

use crate::compute::value::Value;
use crate::store::variable::Variable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Storage state of one variable.
///
/// `Uncalculated` is deliberately distinct from `Value::Null`: a calculated
/// null is a real result.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Uncalculated,
    Ready(Value),
}

/// Argument tuple of a formula invocation, keyed by payload bits.
#[derive(Debug, Clone)]
pub(crate) struct ArgsKey(SmallVec<[Value; 4]>);

impl ArgsKey {
    fn from_args(args: &[Value]) -> Self {
        Self(args.iter().cloned().collect())
    }
}

impl PartialEq for ArgsKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.bits_eq(b))
    }
}

impl Eq for ArgsKey {}

impl Hash for ArgsKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for value in &self.0 {
            value.hash_bits(state);
        }
    }
}

/// Values of all variables touched by a calculation, computed and external.
///
/// One instance per independent run; a compiled plan may be shared across
/// many of these. The secondary cache memoizes (variable, argument tuple)
/// results for cacheable variables and survives recompute cycles — only the
/// per-variable slots are reset during invalidation.
#[derive(Debug, Clone, Default)]
pub struct Values {
    slots: HashMap<Arc<str>, Slot>,
    cache: HashMap<(Arc<str>, ArgsKey), Value>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// The calculated value of `qual_name`, or `None` when the variable is
    /// absent or not yet calculated.
    pub fn get(&self, qual_name: &str) -> Option<&Value> {
        match self.slots.get(qual_name) {
            Some(Slot::Ready(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_calculated(&self, qual_name: &str) -> bool {
        matches!(self.slots.get(qual_name), Some(Slot::Ready(_)))
    }

    /// Raw slot state, distinguishing "never stored" (`None`) from
    /// "stored but reset" (`Some(Slot::Uncalculated)`).
    pub fn slot(&self, qual_name: &str) -> Option<&Slot> {
        self.slots.get(qual_name)
    }

    /// Number of variables with a slot, calculated or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn set(&mut self, variable: &Variable, value: Value) {
        self.slots
            .insert(variable.qual_arc().clone(), Slot::Ready(value));
    }

    pub(crate) fn reset(&mut self, variable: &Variable) {
        self.slots
            .insert(variable.qual_arc().clone(), Slot::Uncalculated);
    }

    pub(crate) fn cache_lookup(&self, variable: &Variable, args: &[Value]) -> Option<&Value> {
        let key = (variable.qual_arc().clone(), ArgsKey::from_args(args));
        self.cache.get(&key)
    }

    pub(crate) fn cache_store(&mut self, variable: &Variable, args: &[Value], result: Value) {
        let key = (variable.qual_arc().clone(), ArgsKey::from_args(args));
        self.cache.insert(key, result);
    }
}

/// External inputs for a run: namespace name to variable name to value.
///
/// The same shape carries the changed set handed to `recompute`. A superset
/// of what the plan needs is always acceptable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalValues(IndexMap<String, IndexMap<String, Value>>);

impl ExternalValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(
        mut self,
        source: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.set(source, name, value);
        self
    }

    pub fn set(
        &mut self,
        source: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.0
            .entry(source.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    pub fn source(&self, source: &str) -> Option<&IndexMap<String, Value>> {
        self.0.get(source)
    }

    pub fn get(&self, source: &str, name: &str) -> Option<&Value> {
        self.0.get(source)?.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, Value>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses a scenario document of the form
    /// `{"namespace": {"variable": value, ...}, ...}`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(qual: &str) -> Variable {
        let (source, name) = crate::store::name::split_qualified(qual).unwrap();
        Variable::leaf(source, name)
    }

    #[test]
    fn slot_states_are_distinct() {
        let mut values = Values::new();
        let y = leaf("ext.y");

        assert!(values.get("ext.y").is_none());

        values.set(&y, Value::Null);
        // A calculated null is a real result.
        assert!(values.is_calculated("ext.y"));
        assert_eq!(values.get("ext.y"), Some(&Value::Null));

        values.reset(&y);
        assert!(!values.is_calculated("ext.y"));
        assert!(values.get("ext.y").is_none());
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn cache_survives_slot_reset() {
        let mut values = Values::new();
        let x = leaf("calc.x");
        let args = [Value::Int(1), Value::Float(2.0)];

        assert!(values.cache_lookup(&x, &args).is_none());
        values.cache_store(&x, &args, Value::Int(42));
        values.reset(&x);
        assert_eq!(values.cache_lookup(&x, &args), Some(&Value::Int(42)));

        // A different tuple misses.
        assert!(values
            .cache_lookup(&x, &[Value::Int(1), Value::Float(3.0)])
            .is_none());
        assert_eq!(values.cache_len(), 1);
    }

    #[test]
    fn external_values_from_json() {
        let parsed = ExternalValues::from_json(
            r#"{"ext": {"y": 137, "rate": 0.25}, "fx": {"pair": "EURUSD"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.get("ext", "y"), Some(&Value::Int(137)));
        assert_eq!(parsed.get("ext", "rate"), Some(&Value::Float(0.25)));
        assert_eq!(parsed.get("fx", "pair"), Some(&Value::Str("EURUSD".into())));
        assert!(parsed.get("fx", "other").is_none());
        assert!(parsed.source("nope").is_none());
    }
}
