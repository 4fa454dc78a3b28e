//! Recursive evaluation of one specification tree against a single reading.
//!
//! Per node:
//! - expressions are OR-combined (alternative defect ranges)
//! - children combine under `sub_logical_operator`
//! - a node with both treats its expression result as one more branch
//!
//! Evaluation short-circuits and is total: malformed or too-deep nodes
//! evaluate to `false` and leave a warning instead of failing.

use crate::judge::expr;
use crate::spec::arena::{NodeId, SpecTree};
use crate::spec::sign::LogicalOperator;
use tracing::trace;

/// Result of a subtree plus the branch that decided it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub matched: bool,
    /// Specification ids from the evaluated node down to the deciding node.
    pub path: Vec<i64>,
}

impl Outcome {
    fn at(matched: bool, id: i64) -> Self {
        Self {
            matched,
            path: vec![id],
        }
    }

    fn through(id: i64, below: Outcome) -> Self {
        let mut path = Vec::with_capacity(below.path.len() + 1);
        path.push(id);
        path.extend(below.path);
        Self {
            matched: below.matched,
            path,
        }
    }
}

/// Evaluate the subtree rooted at `node` against `actual`.
pub fn evaluate_specification(
    tree: &SpecTree,
    node: NodeId,
    actual: f64,
    max_depth: usize,
    warnings: &mut Vec<String>,
) -> Outcome {
    if !actual.is_finite() {
        warnings.push(non_finite_warning(actual));
    }
    eval_node(tree, node, actual, 1, max_depth, warnings)
}

pub(crate) fn non_finite_warning(actual: f64) -> String {
    format!("measurement value {} is not finite; every comparison is false", actual)
}

pub(crate) fn eval_node(
    tree: &SpecTree,
    node: NodeId,
    actual: f64,
    depth: usize,
    max_depth: usize,
    warnings: &mut Vec<String>,
) -> Outcome {
    let n = tree.node(node);

    if depth > max_depth {
        warnings.push(format!(
            "specification {} exceeds max depth {}; evaluated as false",
            n.id, max_depth
        ));
        return Outcome::at(false, n.id);
    }
    if let Some(defect) = &n.defect {
        warnings.push(format!("{}; evaluated as false", defect));
        return Outcome::at(false, n.id);
    }

    let leaf = (!n.expressions.is_empty())
        .then(|| n.expressions.iter().any(|e| expr::evaluate(e, actual)));
    trace!(spec = n.id, ?leaf, depth, "specification");

    if n.children.is_empty() {
        return Outcome::at(leaf.unwrap_or(false), n.id);
    }

    let Some(op) = n.operator else {
        // Load-time validation flags this; keep evaluation total regardless.
        warnings.push(format!(
            "specification {} has sub-specifications but no operator; evaluated as false",
            n.id
        ));
        return Outcome::at(false, n.id);
    };

    match op {
        LogicalOperator::And => {
            if leaf == Some(false) {
                return Outcome::at(false, n.id);
            }
            for &c in &n.children {
                let o = eval_node(tree, c, actual, depth + 1, max_depth, warnings);
                if !o.matched {
                    return Outcome::through(n.id, o);
                }
            }
            Outcome::at(true, n.id)
        }
        LogicalOperator::Or => {
            if leaf == Some(true) {
                return Outcome::at(true, n.id);
            }
            for &c in &n.children {
                let o = eval_node(tree, c, actual, depth + 1, max_depth, warnings);
                if o.matched {
                    return Outcome::through(n.id, o);
                }
            }
            Outcome::at(false, n.id)
        }
    }
}
