//! Judgment layer: evaluates loaded rules against a measurement bag.
//!
//! Pure and synchronous. Loaded rules are only read, so one `DefectCondition`
//! can be shared across any number of threads judging different bags.

pub mod condition;
pub mod expr;
pub mod trace;
pub mod tree;

pub use condition::{evaluate_measurement_condition, judge, judge_defect_type};
pub use trace::{Judgment, Reason, TraceEntry};
pub use tree::{Outcome, evaluate_specification};
