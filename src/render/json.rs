use crate::judge::Judgment;

/// Render a judgment as pretty JSON:
/// { "verdict": "NG", "defect_condition_id": 1, "decided_by": 11,
///   "trace": [ { "measurement_condition_id": 11, "verdict": "NG",
///                "reason": { "kind": "matched", "value": 20.0, "path": [100] } } ] }
///
/// Non-finite values in reasons serialize as `null`.
pub fn render_json(judgment: &Judgment) -> serde_json::Result<String> {
    serde_json::to_string_pretty(judgment)
}
