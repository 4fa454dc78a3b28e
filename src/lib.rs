//! Measurement-based defect judgment.
//!
//! Stored per-customer rules (defect condition -> measurement conditions ->
//! specification trees -> threshold expressions) are loaded once into an
//! immutable, validated form and then evaluated against the measurements of
//! each detected defect instance, producing OK / NG / INDETERMINATE plus a
//! trace of which branches decided it.

pub mod config;
pub mod error;
pub mod judge;
pub mod measure;
pub mod render;
pub mod service;
pub mod spec;

pub use config::EngineConfig;
pub use error::{Malformation, SchemaError};
pub use judge::{Judgment, judge, judge_defect_type};
pub use measure::{MeasurementBag, MeasurementValue};
pub use spec::{DefectCondition, DefectType, SpecTables, Verdict};
