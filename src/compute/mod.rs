//! Run-time side of the engine: value payloads and their storage.
pub mod ledger;
pub mod value;

pub use ledger::{ExternalValues, Slot, Values};
pub use value::Value;
