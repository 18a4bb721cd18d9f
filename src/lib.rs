//! calcgraph
//!
//! An incremental computation engine over declared dependency graphs.
//! Quantities are declared as named variables in namespaces — either derived
//! by a pure formula of other quantities or supplied externally — and
//! registered into a [`Graph`]. Compiling a set of requested outputs yields
//! an immutable, topologically ordered [`CompiledGraph`]; executing it fills
//! a [`Values`] store; changing a subset of inputs and calling
//! [`CompiledGraph::recompute`] recalculates only the transitive dependents
//! of the change.
//!
//! # Example
//!
//! ```
//! use calcgraph::{ExternalValues, Graph, Value, Values, VarSpec};
//!
//! let mut graph = Graph::new(
//!     [(
//!         "calc",
//!         vec![
//!             VarSpec::new("x")
//!                 .input("y", "ext")
//!                 .formula(|args| Value::Float(args[0].as_f64().unwrap() * 2.0))
//!                 .metadata("x = 2 * y"),
//!         ],
//!     )],
//!     ["ext"],
//! )?;
//!
//! let compiled = graph.compile(["calc.x"])?;
//! let mut values = Values::new();
//! compiled.execute(&ExternalValues::new().with("ext", "y", 137), &mut values)?;
//! assert_eq!(values.get("calc.x"), Some(&Value::Float(274.0)));
//!
//! compiled.recompute(&ExternalValues::new().with("ext", "y", 1), &mut values);
//! assert_eq!(values.get("calc.x"), Some(&Value::Float(2.0)));
//! # Ok::<(), calcgraph::GraphError>(())
//! ```

mod analysis;
pub mod compute;
mod display;
pub mod error;
pub mod graph;
pub mod store;

pub use compute::{ExternalValues, Slot, Value, Values};
pub use display::TraceOrder;
pub use error::GraphError;
pub use graph::{CompiledGraph, CompiledNode, Graph};
pub use store::{qualify, split_qualified, VarSpec, Variable, QUAL_SEP};
