//! Judgment results and the explanation attached to them.

use crate::spec::sign::Verdict;
use serde::Serialize;

/// Why a measurement condition (or the whole judgment) resolved the way it did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// The bag carried no values; the defect condition's default applied.
    NoMeasurements,
    /// The named measurement was not in the bag; the condition's default applied.
    MeasurementMissing { measurement: String },
    /// The applicability guard did not hold; the condition's default applied.
    GuardNotApplicable { value: f64, guard: String },
    /// The rule could not be evaluated confidently; resolved NG.
    Malformed { issues: Vec<String> },
    /// A defect-confirming range matched. `path` is the deciding branch.
    Matched { value: f64, path: Vec<i64> },
    /// No defect-confirming range matched. `path` is the deciding branch.
    NotMatched { value: f64, path: Vec<i64> },
    /// A defect type had no condition for the requested machine.
    NoConditionForMachine { machine_type: String },
}

impl Reason {
    pub fn summary(&self) -> String {
        match self {
            Reason::NoMeasurements => "no measurements supplied, default applied".to_string(),
            Reason::MeasurementMissing { measurement } => {
                format!("default applied, measurement {:?} missing", measurement)
            }
            Reason::GuardNotApplicable { value, guard } => {
                format!("default applied, guard {} not met by {}", guard, value)
            }
            Reason::Malformed { issues } => format!("fail-closed: {}", issues.join("; ")),
            Reason::Matched { value, path } => {
                format!("{} matched via specification path {}", value, render_path(path))
            }
            Reason::NotMatched { value, path } => {
                format!("{} did not match (decided at {})", value, render_path(path))
            }
            Reason::NoConditionForMachine { machine_type } => {
                format!("no defect condition for machine type {:?}", machine_type)
            }
        }
    }
}

pub(crate) fn render_path(path: &[i64]) -> String {
    if path.is_empty() {
        return "-".to_string();
    }
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" > ")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub measurement_condition_id: Option<i64>,
    pub verdict: Verdict,
    pub reason: Reason,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Judgment {
    pub verdict: Verdict,
    pub defect_condition_id: Option<i64>,
    /// The measurement condition that produced an NG, if any.
    pub decided_by: Option<i64>,
    pub trace: Vec<TraceEntry>,
}

impl Judgment {
    /// The trace entry of the deciding condition.
    pub fn deciding_entry(&self) -> Option<&TraceEntry> {
        let id = self.decided_by?;
        self.trace
            .iter()
            .find(|e| e.measurement_condition_id == Some(id))
    }
}
