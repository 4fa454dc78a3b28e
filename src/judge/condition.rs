use crate::config::EngineConfig;
use crate::error::Malformation;
use crate::judge::expr;
use crate::judge::trace::{Judgment, Reason, TraceEntry};
use crate::judge::tree::{Outcome, eval_node, non_finite_warning};
use crate::measure::MeasurementBag;
use crate::spec::condition::{DefectCondition, DefectType, MeasurementCondition};
use crate::spec::sign::{LogicalOperator, Verdict};
use tracing::{debug, warn};

/// Judge one measurement condition.
///
/// Order of checks:
/// 1) measurement missing   -> condition default
/// 2) guard incomplete      -> NG
/// 3) guard not met         -> condition default
/// 4) any other malformation -> NG
/// 5) specifications combined under the root operator; match -> NG
pub fn evaluate_measurement_condition(
    mc: &MeasurementCondition,
    bag: &MeasurementBag,
    cfg: &EngineConfig,
) -> TraceEntry {
    let entry = |verdict, reason, warnings| TraceEntry {
        measurement_condition_id: Some(mc.id),
        verdict,
        reason,
        warnings,
    };
    let malformed = |issues: &[Malformation]| Reason::Malformed {
        issues: issues.iter().map(|i| i.to_string()).collect(),
    };

    let Some(actual) = bag.get(&mc.measurement_name) else {
        return entry(
            mc.default_result,
            Reason::MeasurementMissing {
                measurement: mc.measurement_name.clone(),
            },
            vec![],
        );
    };

    let mut warnings = Vec::new();
    if !actual.is_finite() {
        warn!(condition = mc.id, measurement = %mc.measurement_name, actual, "non-finite measurement");
        warnings.push(non_finite_warning(actual));
    }

    let guard_issues: Vec<Malformation> = mc
        .issues()
        .iter()
        .filter(|i| matches!(i, Malformation::IncompleteGuard { .. }))
        .cloned()
        .collect();
    if !guard_issues.is_empty() {
        return entry(Verdict::Ng, malformed(&guard_issues), warnings);
    }

    if let Some(guard) = &mc.guard {
        if !expr::evaluate(guard, actual) {
            return entry(
                mc.default_result,
                Reason::GuardNotApplicable {
                    value: actual,
                    guard: format!("{} {}", guard.sign, guard.threshold),
                },
                warnings,
            );
        }
    }

    if mc.is_malformed() {
        return entry(Verdict::Ng, malformed(mc.issues()), warnings);
    }

    // At most one root when the operator is absent (checked at load time).
    let op = mc.root_operator.unwrap_or(LogicalOperator::And);
    let mut decided: Option<Outcome> = None;
    for &root in mc.tree.roots() {
        let o = eval_node(&mc.tree, root, actual, 1, cfg.max_depth, &mut warnings);
        let stop = match op {
            LogicalOperator::And => !o.matched,
            LogicalOperator::Or => o.matched,
        };
        if stop {
            decided = Some(o);
            break;
        }
        decided.get_or_insert(o);
    }

    let (matched, path) = match decided {
        Some(o) => (o.matched, o.path),
        None => (false, vec![]),
    };
    let reason = if matched {
        Reason::Matched {
            value: actual,
            path,
        }
    } else {
        Reason::NotMatched {
            value: actual,
            path,
        }
    };
    entry(Verdict::from_match(matched), reason, warnings)
}

/// Judge one defect condition: the first NG measurement condition decides.
pub fn judge(dc: &DefectCondition, bag: &MeasurementBag, cfg: &EngineConfig) -> Judgment {
    if bag.is_empty() {
        debug!(defect_condition = dc.id, verdict = %dc.no_measurement_default, "no measurements");
        return Judgment {
            verdict: dc.no_measurement_default,
            defect_condition_id: Some(dc.id),
            decided_by: None,
            trace: vec![TraceEntry {
                measurement_condition_id: None,
                verdict: dc.no_measurement_default,
                reason: Reason::NoMeasurements,
                warnings: vec![],
            }],
        };
    }

    let mut trace = Vec::with_capacity(dc.conditions.len());
    let mut indeterminate = false;
    for mc in &dc.conditions {
        let entry = evaluate_measurement_condition(mc, bag, cfg);
        debug!(
            defect_condition = dc.id,
            condition = mc.id,
            verdict = %entry.verdict,
            reason = %entry.reason.summary(),
            "measurement condition"
        );
        match entry.verdict {
            Verdict::Ng => {
                trace.push(entry);
                return Judgment {
                    verdict: Verdict::Ng,
                    defect_condition_id: Some(dc.id),
                    decided_by: Some(mc.id),
                    trace,
                };
            }
            Verdict::Indeterminate => indeterminate = true,
            Verdict::Ok => {}
        }
        trace.push(entry);
    }

    Judgment {
        verdict: if indeterminate {
            Verdict::Indeterminate
        } else {
            Verdict::Ok
        },
        defect_condition_id: Some(dc.id),
        decided_by: None,
        trace,
    }
}

/// Pick the condition for `machine_type`, then judge it.
pub fn judge_defect_type(
    dt: &DefectType,
    machine_type: &str,
    bag: &MeasurementBag,
    cfg: &EngineConfig,
) -> Judgment {
    match dt.select(machine_type) {
        Some(dc) => judge(dc, bag, cfg),
        None => {
            warn!(ai_code = %dt.ai_code, machine_type, "no defect condition for machine type");
            Judgment {
                verdict: Verdict::Indeterminate,
                defect_condition_id: None,
                decided_by: None,
                trace: vec![TraceEntry {
                    measurement_condition_id: None,
                    verdict: Verdict::Indeterminate,
                    reason: Reason::NoConditionForMachine {
                        machine_type: machine_type.to_string(),
                    },
                    warnings: vec![],
                }],
            }
        }
    }
}
