use crate::judge::Judgment;
use std::fmt::Write;

/// Render a judgment for a terminal:
///
/// verdict: NG (decided by measurement condition 11)
///   [10] OK  default applied, measurement "area" missing
///   [11] NG  20 matched via specification path 100 > 101
///        warning: ...
pub fn render_text(judgment: &Judgment) -> String {
    let mut out = String::new();

    let _ = write!(out, "verdict: {}", judgment.verdict);
    if let Some(id) = judgment.decided_by {
        let _ = write!(out, " (decided by measurement condition {})", id);
    }
    out.push('\n');

    for entry in &judgment.trace {
        let tag = entry
            .measurement_condition_id
            .map(|id| format!("[{}]", id))
            .unwrap_or_else(|| "[-]".to_string());
        let _ = writeln!(
            out,
            "  {} {:<2}  {}",
            tag,
            entry.verdict.as_str(),
            entry.reason.summary()
        );
        for w in &entry.warnings {
            let _ = writeln!(out, "       warning: {}", w);
        }
    }

    out
}
