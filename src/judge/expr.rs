use crate::spec::arena::Expression;
use crate::spec::sign::InequalitySign;

/// Compare `actual` against one threshold.
///
/// Equality is exact; callers are expected to supply already-quantized
/// readings. A non-finite `actual` never satisfies any sign, `!=` included.
pub fn evaluate(expr: &Expression, actual: f64) -> bool {
    if !actual.is_finite() {
        return false;
    }
    let t = expr.threshold;
    match expr.sign {
        InequalitySign::Lt => actual < t,
        InequalitySign::Le => actual <= t,
        InequalitySign::Gt => actual > t,
        InequalitySign::Ge => actual >= t,
        InequalitySign::Eq => actual == t,
        InequalitySign::Ne => actual != t,
    }
}
