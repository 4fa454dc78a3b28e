//! Nested JSON shapes of stored judgment rules.
//!
//! Two spellings exist in the wild and both load here:
//!
//! API shape:
//! {
//!   "id": 7, "idx": 0, "no_measurement_default_result": "AI_OK",
//!   "measurement_conditions": [{
//!     "measurement_name": "longest", "default_result_value": "OK",
//!     "root_logical_operator": "AND",
//!     "specifications": [{
//!       "measurement_name": "longest", "unit": "MicroMeter",
//!       "sub_logical_operator": "None",
//!       "expressions": [{ "value": 15, "inequality_sign": "gte" }],
//!       "child_specifications": []
//!     }]
//!   }]
//! }
//!
//! Export shape: the same with `MeasurementConditions`, `Specifications`,
//! `Expression` and `SubSpecifications` keys.
//!
//! Signs, operators and verdicts are parsed into closed enums during
//! deserialization; an unknown token fails the whole document.

use crate::spec::sign::{InequalitySign, LogicalOperator, Verdict, deserialize_optional_operator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawExpression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(alias = "threshold")]
    pub value: f64,

    #[serde(alias = "sign")]
    pub inequality_sign: InequalitySign,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawSpecification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub measurement_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_operator")]
    pub sub_logical_operator: Option<LogicalOperator>,

    #[serde(default, alias = "Expression", alias = "Expressions")]
    pub expressions: Vec<RawExpression>,

    #[serde(
        default,
        alias = "SubSpecifications",
        alias = "child_specifications"
    )]
    pub sub_specifications: Vec<RawSpecification>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawMeasurementCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub idx: i64,

    pub measurement_name: String,

    pub default_result_value: Verdict,

    #[serde(default, deserialize_with = "deserialize_optional_operator")]
    pub root_logical_operator: Option<LogicalOperator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_condition_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_condition_unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_condition_inequality_sign: Option<InequalitySign>,

    #[serde(default, alias = "Specifications")]
    pub specifications: Vec<RawSpecification>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawDefectCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub idx: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metal_value_percent: Option<f64>,

    pub no_measurement_default_result: Verdict,

    #[serde(default, alias = "MeasurementConditions")]
    pub measurement_conditions: Vec<RawMeasurementCondition>,
}

/// One defect type of a customer spec, holding a condition per machine type.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawDefectType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub ai_code: String,

    #[serde(default)]
    pub defect_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    #[serde(default, alias = "DefectConditions")]
    pub defect_conditions: Vec<RawDefectCondition>,
}
