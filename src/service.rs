//! Request/response envelope for exposing the engine over a transport.
//!
//! Request:  { "defect_condition": { ... }, "measurements": [ { "name", "value" } ] }
//! Response: { "verdict": "OK"|"NG"|"INDETERMINATE", "decided_by": id|null, "trace": [ ... ] }
//!
//! Judgment outcomes are never errors. `Err` means the request could not be
//! parsed into something judgeable.

use crate::config::EngineConfig;
use crate::error::SchemaError;
use crate::judge::{self, TraceEntry};
use crate::measure::{MeasurementBag, MeasurementValue};
use crate::spec::{DefectCondition, RawDefectCondition, Verdict};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JudgeRequest {
    pub defect_condition: RawDefectCondition,
    #[serde(default)]
    pub measurements: Vec<MeasurementValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgeResponse {
    pub verdict: Verdict,
    pub decided_by: Option<i64>,
    pub trace: Vec<TraceEntry>,
}

pub fn handle(request: JudgeRequest, cfg: &EngineConfig) -> Result<JudgeResponse, SchemaError> {
    let dc = DefectCondition::from_raw(&request.defect_condition, cfg)?;
    let bag = MeasurementBag::from_values(request.measurements, cfg.strict_measurements)?;
    let judgment = judge::judge(&dc, &bag, cfg);
    Ok(JudgeResponse {
        verdict: judgment.verdict,
        decided_by: judgment.decided_by,
        trace: judgment.trace,
    })
}

pub fn handle_request(json: &str, cfg: &EngineConfig) -> Result<JudgeResponse, SchemaError> {
    let request: JudgeRequest = serde_json::from_str(json)?;
    handle(request, cfg)
}
