//! Builders and proptest strategies for specification trees, shared by the
//! unit tests of the loader and the evaluator.

use crate::spec::raw::{RawExpression, RawSpecification};
use crate::spec::sign::{InequalitySign, LogicalOperator};
use proptest::prelude::*;

pub fn leaf(id: i64, exprs: &[(InequalitySign, f64)]) -> RawSpecification {
    RawSpecification {
        id: Some(id),
        measurement_name: "area".to_string(),
        unit: None,
        sub_logical_operator: None,
        expressions: exprs
            .iter()
            .map(|&(inequality_sign, value)| RawExpression {
                id: None,
                value,
                inequality_sign,
            })
            .collect(),
        sub_specifications: vec![],
    }
}

pub fn branch(
    id: i64,
    op: Option<LogicalOperator>,
    exprs: &[(InequalitySign, f64)],
    children: Vec<RawSpecification>,
) -> RawSpecification {
    RawSpecification {
        sub_logical_operator: op,
        sub_specifications: children,
        ..leaf(id, exprs)
    }
}

fn strip_ids(mut spec: RawSpecification) -> RawSpecification {
    spec.id = None;
    spec.sub_specifications = spec.sub_specifications.into_iter().map(strip_ids).collect();
    spec
}

pub fn arb_sign() -> impl Strategy<Value = InequalitySign> {
    prop::sample::select(InequalitySign::ALL.to_vec())
}

/// One to two expressions over small integer thresholds.
pub fn arb_exprs() -> impl Strategy<Value = Vec<(InequalitySign, f64)>> {
    prop::collection::vec((arb_sign(), (0i32..20).prop_map(f64::from)), 1..3)
}

/// Well-formed trees without ids: every branch has an operator and every
/// leaf has expressions.
pub fn arb_spec() -> impl Strategy<Value = RawSpecification> {
    let leaf_strategy = arb_exprs().prop_map(|e| leaf(0, &e));
    leaf_strategy
        .prop_recursive(4, 32, 4, |inner| {
            (
                prop::sample::select(vec![LogicalOperator::And, LogicalOperator::Or]),
                prop::option::of(arb_exprs()),
                prop::collection::vec(inner, 1..4),
            )
                .prop_map(|(op, exprs, children)| {
                    branch(0, Some(op), &exprs.unwrap_or_default(), children)
                })
        })
        .prop_map(strip_ids)
}
