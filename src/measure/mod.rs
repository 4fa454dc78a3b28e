//! Measurement input: the per-inference bag of named readings.

pub mod bag;
pub mod parse;

pub use bag::{MeasurementBag, MeasurementValue};
pub use parse::{parse_assignment, parse_measurement_file, parse_measurement_text};
