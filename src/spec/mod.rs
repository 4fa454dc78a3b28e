//! Spec layer: JSON schemas + validated in-memory structures.
//!
//! This module is intentionally separate from measurement parsing and
//! judgment. It owns:
//! - sign / operator / verdict tokens
//! - nested JSON shapes and the relational (row) form
//! - the arena loader that validates a tree before anything evaluates it

#[cfg(test)]
pub(crate) mod arbitrary;
pub mod arena;
pub mod condition;
pub mod raw;
pub mod sign;
pub mod table;

pub use arena::{Expression, NodeId, SpecNode, SpecTree};
pub use condition::{DefectCondition, DefectType, MeasurementCondition};
pub use raw::{RawDefectCondition, RawDefectType, RawExpression, RawMeasurementCondition, RawSpecification};
pub use sign::{InequalitySign, LogicalOperator, Verdict};
pub use table::SpecTables;
