//! Loaded, immutable judgment rules.
//!
//! Everything here is built once per stored rule and then only read. Both
//! input forms (nested JSON and relational rows) go through `from_tables`, so
//! they share one validation path.

use crate::config::EngineConfig;
use crate::error::{Malformation, SchemaError};
use crate::spec::arena::{Expression, SpecTree};
use crate::spec::raw::{RawDefectCondition, RawDefectType};
use crate::spec::sign::{LogicalOperator, Verdict};
use crate::spec::table::{ExpressionRow, MeasurementConditionRow, SpecTables};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct MeasurementCondition {
    pub id: i64,
    pub idx: i64,
    pub measurement_name: String,
    pub default_result: Verdict,
    pub root_operator: Option<LogicalOperator>,
    /// Applicability gate checked before the specifications.
    pub guard: Option<Expression>,
    pub guard_unit: Option<String>,
    pub tree: SpecTree,
    issues: Vec<Malformation>,
}

impl MeasurementCondition {
    fn load(
        row: &MeasurementConditionRow,
        tables: &SpecTables,
        exprs: &BTreeMap<i64, Vec<&ExpressionRow>>,
        cfg: &EngineConfig,
    ) -> Result<Self, SchemaError> {
        let tree = SpecTree::build(&tables.specifications_of(row.id), exprs, cfg.max_depth)?;

        let mut issues = Vec::new();
        let guard = match (
            row.measurement_condition_value,
            row.measurement_condition_inequality_sign,
        ) {
            (Some(threshold), Some(sign)) => Some(Expression { threshold, sign }),
            (None, None) => None,
            _ => {
                issues.push(Malformation::IncompleteGuard { condition: row.id });
                None
            }
        };

        let roots = tree.roots().len();
        if roots == 0 && tree.is_empty() {
            issues.push(Malformation::NoSpecifications { condition: row.id });
        }
        if roots > 1 && row.root_logical_operator.is_none() {
            issues.push(Malformation::MissingRootOperator {
                condition: row.id,
                roots,
            });
        }
        issues.extend(tree.issues().iter().cloned());

        for issue in &issues {
            warn!(condition = row.id, %issue, "malformed measurement condition");
        }

        Ok(MeasurementCondition {
            id: row.id,
            idx: row.idx,
            measurement_name: row.measurement_name.clone(),
            default_result: row.default_result_value,
            root_operator: row.root_logical_operator,
            guard,
            guard_unit: row.measurement_condition_unit.clone(),
            tree,
            issues,
        })
    }

    /// Condition-level and tree-level malformations, in discovery order.
    pub fn issues(&self) -> &[Malformation] {
        &self.issues
    }

    pub fn is_malformed(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DefectCondition {
    pub id: i64,
    pub idx: i64,
    pub machine_type: Option<String>,
    pub metal_value_percent: Option<f64>,
    pub no_measurement_default: Verdict,
    /// Sorted by `idx`; ties keep row order.
    pub conditions: Vec<MeasurementCondition>,
}

impl DefectCondition {
    /// Load one defect condition out of a relational snapshot.
    pub fn from_tables(
        tables: &SpecTables,
        dc_id: i64,
        cfg: &EngineConfig,
    ) -> Result<Self, SchemaError> {
        tables.check_references()?;
        let row = tables.defect_condition(dc_id)?;
        let exprs = tables.expressions_by_spec();

        let mut conditions = tables
            .measurement_conditions_of(dc_id)
            .into_iter()
            .map(|mc| MeasurementCondition::load(mc, tables, &exprs, cfg))
            .collect::<Result<Vec<_>, _>>()?;
        conditions.sort_by_key(|c| c.idx);

        Ok(DefectCondition {
            id: row.id,
            idx: row.idx,
            machine_type: row.machine_type.clone(),
            metal_value_percent: row.metal_value_percent,
            no_measurement_default: row.no_measurement_default_result,
            conditions,
        })
    }

    pub fn from_raw(raw: &RawDefectCondition, cfg: &EngineConfig) -> Result<Self, SchemaError> {
        let tables = SpecTables::flatten(raw)?;
        let id = tables.defect_conditions[0].id;
        Self::from_tables(&tables, id, cfg)
    }

    pub fn from_json(text: &str, cfg: &EngineConfig) -> Result<Self, SchemaError> {
        let raw: RawDefectCondition = serde_json::from_str(text)?;
        Self::from_raw(&raw, cfg)
    }

    /// Every malformation, tagged with the owning measurement condition id.
    pub fn issues(&self) -> Vec<(i64, &Malformation)> {
        self.conditions
            .iter()
            .flat_map(|mc| mc.issues().iter().map(move |i| (mc.id, i)))
            .collect()
    }

    /// Empty, absent and the stored `"None"` placeholder all mean "any machine".
    pub fn is_machine_agnostic(&self) -> bool {
        match self.machine_type.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(m) => m.eq_ignore_ascii_case("none"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DefectType {
    pub id: Option<i64>,
    pub ai_code: String,
    pub defect_name: String,
    /// Sorted by `idx`.
    pub conditions: Vec<DefectCondition>,
}

impl DefectType {
    pub fn from_raw(raw: &RawDefectType, cfg: &EngineConfig) -> Result<Self, SchemaError> {
        let mut conditions = raw
            .defect_conditions
            .iter()
            .map(|dc| DefectCondition::from_raw(dc, cfg))
            .collect::<Result<Vec<_>, _>>()?;
        conditions.sort_by_key(|dc| dc.idx);
        Ok(DefectType {
            id: raw.id,
            ai_code: raw.ai_code.clone(),
            defect_name: raw.defect_name.clone(),
            conditions,
        })
    }

    pub fn from_json(text: &str, cfg: &EngineConfig) -> Result<Self, SchemaError> {
        let raw: RawDefectType = serde_json::from_str(text)?;
        Self::from_raw(&raw, cfg)
    }

    /// The condition for `machine_type`: an exact match first, then the first
    /// machine-agnostic condition.
    pub fn select(&self, machine_type: &str) -> Option<&DefectCondition> {
        self.conditions
            .iter()
            .find(|dc| dc.machine_type.as_deref() == Some(machine_type))
            .or_else(|| self.conditions.iter().find(|dc| dc.is_machine_agnostic()))
    }
}
