//! Error taxonomy.
//!
//! `SchemaError` is the only thing ever returned as `Err`: the input could not
//! be turned into a judgeable structure at all. Problems inside an otherwise
//! loadable tree are `Malformation`s; they are kept on the loaded tree and
//! resolved fail-closed at evaluation time.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown inequality sign: {0:?}")]
    UnknownSign(String),

    #[error("unknown logical operator: {0:?}")]
    UnknownOperator(String),

    #[error("unknown verdict: {0:?}")]
    UnknownVerdict(String),

    #[error("duplicate {table} id {id}")]
    DuplicateId { table: &'static str, id: i64 },

    #[error("specification {spec} references missing parent specification {parent}")]
    DanglingParent { spec: i64, parent: i64 },

    #[error("specification {spec} has parent {parent} from a different measurement condition")]
    CrossConditionParent { spec: i64, parent: i64 },

    #[error("{table} row {id} references missing {target} {target_id}")]
    DanglingReference {
        table: &'static str,
        id: i64,
        target: &'static str,
        target_id: i64,
    },

    #[error("no defect condition with id {0}")]
    UnknownDefectCondition(i64),

    #[error("specifications unreachable from any root (cyclic parents): {0:?}")]
    Unreachable(Vec<i64>),

    #[error("no free {table} id above {max}")]
    IdExhausted { table: &'static str, max: i64 },

    #[error("specification {spec} is nested deeper than {limit}")]
    NestingTooDeep { spec: i64, limit: usize },

    #[error("duplicate measurement {0:?}")]
    DuplicateMeasurement(String),

    #[error("measurement parse error at {location}: {message}")]
    Measurement { location: String, message: String },
}

/// Structural defects found while loading a tree. Never returned as `Err`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Malformation {
    #[error("specification {spec} has sub-specifications but no sub_logical_operator")]
    MissingOperator { spec: i64 },

    #[error("specification {spec} has neither expressions nor sub-specifications")]
    EmptyLeaf { spec: i64 },

    #[error("specification cycle: {}", join_ids(.path))]
    Cycle { path: Vec<i64> },

    #[error("specification {spec} at depth {depth} exceeds max depth {limit}")]
    DepthExceeded { spec: i64, depth: usize, limit: usize },

    #[error("measurement condition {condition} has {roots} specifications but no root_logical_operator")]
    MissingRootOperator { condition: i64, roots: usize },

    #[error("measurement condition {condition} has no specifications")]
    NoSpecifications { condition: i64 },

    #[error("measurement condition {condition} has an incomplete guard (value and sign must both be set)")]
    IncompleteGuard { condition: i64 },
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
