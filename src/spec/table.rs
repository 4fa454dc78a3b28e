//! Relational form of stored rules.
//!
//! Mirrors the persisted layout: one table per level, children pointing at
//! their parent by id, and specifications nesting through `parent_spec_id`.
//! Row order is significant: siblings keep the order their rows appear in.

use crate::error::SchemaError;
use crate::spec::raw::{
    RawDefectCondition, RawExpression, RawMeasurementCondition, RawSpecification,
};
use crate::spec::sign::{InequalitySign, LogicalOperator, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DefectConditionRow {
    pub id: i64,
    pub idx: i64,
    pub machine_type: Option<String>,
    pub metal_value_percent: Option<f64>,
    pub no_measurement_default_result: Verdict,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MeasurementConditionRow {
    pub id: i64,
    pub defect_condition_id: i64,
    pub idx: i64,
    pub measurement_name: String,
    pub default_result_value: Verdict,
    #[serde(default, deserialize_with = "crate::spec::sign::deserialize_optional_operator")]
    pub root_logical_operator: Option<LogicalOperator>,
    pub measurement_condition_value: Option<f64>,
    pub measurement_condition_unit: Option<String>,
    pub measurement_condition_inequality_sign: Option<InequalitySign>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpecificationRow {
    pub id: i64,
    pub measurement_condition_id: i64,
    pub parent_spec_id: Option<i64>,
    #[serde(default)]
    pub measurement_name: String,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "crate::spec::sign::deserialize_optional_operator")]
    pub sub_logical_operator: Option<LogicalOperator>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExpressionRow {
    pub id: i64,
    pub specification_id: i64,
    pub value: f64,
    pub inequality_sign: InequalitySign,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SpecTables {
    #[serde(default)]
    pub defect_conditions: Vec<DefectConditionRow>,
    #[serde(default)]
    pub measurement_conditions: Vec<MeasurementConditionRow>,
    #[serde(default)]
    pub specifications: Vec<SpecificationRow>,
    #[serde(default)]
    pub expressions: Vec<ExpressionRow>,
}

/// Hands out ids for nodes that arrive without one. Starts above the largest
/// id already present so fresh ids never collide with stored ones.
struct IdAllocator {
    table: &'static str,
    max_seen: i64,
    /// `None` once the id space above `max_seen` is used up.
    next: Option<i64>,
}

impl IdAllocator {
    fn above(table: &'static str, max_seen: Option<i64>) -> Self {
        Self {
            table,
            max_seen: max_seen.unwrap_or(0),
            next: max_seen.map_or(Some(1), |m| m.checked_add(1)),
        }
    }

    fn take(&mut self, existing: Option<i64>) -> Result<i64, SchemaError> {
        if let Some(id) = existing {
            return Ok(id);
        }
        let id = self.next.ok_or(SchemaError::IdExhausted {
            table: self.table,
            max: self.max_seen,
        })?;
        self.next = id.checked_add(1);
        Ok(id)
    }
}

fn max_spec_id(spec: &RawSpecification) -> Option<i64> {
    spec.id
        .into_iter()
        .chain(spec.sub_specifications.iter().filter_map(max_spec_id))
        .max()
}

fn max_expr_id(spec: &RawSpecification) -> Option<i64> {
    spec.expressions
        .iter()
        .filter_map(|e| e.id)
        .chain(spec.sub_specifications.iter().filter_map(max_expr_id))
        .max()
}

impl SpecTables {
    /// Flatten one nested defect condition into rows.
    pub fn flatten(raw: &RawDefectCondition) -> Result<Self, SchemaError> {
        let mcs = &raw.measurement_conditions;
        let mut dc_ids = IdAllocator::above("defect_conditions", raw.id);
        let mut mc_ids = IdAllocator::above(
            "measurement_conditions",
            mcs.iter().filter_map(|m| m.id).max(),
        );
        let mut spec_ids = IdAllocator::above(
            "specifications",
            mcs.iter()
                .flat_map(|m| m.specifications.iter())
                .filter_map(max_spec_id)
                .max(),
        );
        let mut expr_ids = IdAllocator::above(
            "expressions",
            mcs.iter()
                .flat_map(|m| m.specifications.iter())
                .filter_map(max_expr_id)
                .max(),
        );

        let mut out = SpecTables::default();
        let dc_id = dc_ids.take(raw.id)?;
        out.defect_conditions.push(DefectConditionRow {
            id: dc_id,
            idx: raw.idx,
            machine_type: raw.machine_type.clone(),
            metal_value_percent: raw.metal_value_percent,
            no_measurement_default_result: raw.no_measurement_default_result,
        });

        for mc in mcs {
            let mc_id = mc_ids.take(mc.id)?;
            out.measurement_conditions.push(MeasurementConditionRow {
                id: mc_id,
                defect_condition_id: dc_id,
                idx: mc.idx,
                measurement_name: mc.measurement_name.clone(),
                default_result_value: mc.default_result_value,
                root_logical_operator: mc.root_logical_operator,
                measurement_condition_value: mc.measurement_condition_value,
                measurement_condition_unit: mc.measurement_condition_unit.clone(),
                measurement_condition_inequality_sign: mc.measurement_condition_inequality_sign,
            });

            for spec in &mc.specifications {
                out.push_spec(spec, mc_id, None, &mut spec_ids, &mut expr_ids)?;
            }
        }

        Ok(out)
    }

    /// Flatten a bare specification forest as rows of condition `mc_id`.
    pub fn flatten_specifications(
        specs: &[RawSpecification],
        mc_id: i64,
    ) -> Result<Self, SchemaError> {
        let mut spec_ids =
            IdAllocator::above("specifications", specs.iter().filter_map(max_spec_id).max());
        let mut expr_ids =
            IdAllocator::above("expressions", specs.iter().filter_map(max_expr_id).max());
        let mut out = SpecTables::default();
        for spec in specs {
            out.push_spec(spec, mc_id, None, &mut spec_ids, &mut expr_ids)?;
        }
        Ok(out)
    }

    fn push_spec(
        &mut self,
        spec: &RawSpecification,
        mc_id: i64,
        parent: Option<i64>,
        spec_ids: &mut IdAllocator,
        expr_ids: &mut IdAllocator,
    ) -> Result<(), SchemaError> {
        let id = spec_ids.take(spec.id)?;
        self.specifications.push(SpecificationRow {
            id,
            measurement_condition_id: mc_id,
            parent_spec_id: parent,
            measurement_name: spec.measurement_name.clone(),
            unit: spec.unit.clone(),
            sub_logical_operator: spec.sub_logical_operator,
        });
        for expr in &spec.expressions {
            self.expressions.push(ExpressionRow {
                id: expr_ids.take(expr.id)?,
                specification_id: id,
                value: expr.value,
                inequality_sign: expr.inequality_sign,
            });
        }
        for child in &spec.sub_specifications {
            self.push_spec(child, mc_id, Some(id), spec_ids, expr_ids)?;
        }
        Ok(())
    }

    pub fn defect_condition(&self, id: i64) -> Result<&DefectConditionRow, SchemaError> {
        self.defect_conditions
            .iter()
            .find(|d| d.id == id)
            .ok_or(SchemaError::UnknownDefectCondition(id))
    }

    /// Measurement condition rows of one defect condition, in row order.
    pub fn measurement_conditions_of(&self, dc_id: i64) -> Vec<&MeasurementConditionRow> {
        self.measurement_conditions
            .iter()
            .filter(|m| m.defect_condition_id == dc_id)
            .collect()
    }

    /// Specification rows of one measurement condition, in row order.
    pub fn specifications_of(&self, mc_id: i64) -> Vec<&SpecificationRow> {
        self.specifications
            .iter()
            .filter(|s| s.measurement_condition_id == mc_id)
            .collect()
    }

    /// Expression rows grouped by specification id, each group in row order.
    pub fn expressions_by_spec(&self) -> BTreeMap<i64, Vec<&ExpressionRow>> {
        let mut out: BTreeMap<i64, Vec<&ExpressionRow>> = BTreeMap::new();
        for e in &self.expressions {
            out.entry(e.specification_id).or_default().push(e);
        }
        out
    }

    /// Reject id collisions and rows pointing at ids that do not exist.
    pub fn check_references(&self) -> Result<(), SchemaError> {
        fn unique<'a>(
            table: &'static str,
            ids: impl Iterator<Item = i64> + 'a,
        ) -> Result<BTreeSet<i64>, SchemaError> {
            let mut seen = BTreeSet::new();
            for id in ids {
                if !seen.insert(id) {
                    return Err(SchemaError::DuplicateId { table, id });
                }
            }
            Ok(seen)
        }

        let dcs = unique("defect_conditions", self.defect_conditions.iter().map(|r| r.id))?;
        let mcs = unique(
            "measurement_conditions",
            self.measurement_conditions.iter().map(|r| r.id),
        )?;
        let specs = unique("specifications", self.specifications.iter().map(|r| r.id))?;
        unique("expressions", self.expressions.iter().map(|r| r.id))?;

        for mc in &self.measurement_conditions {
            if !dcs.contains(&mc.defect_condition_id) {
                return Err(SchemaError::DanglingReference {
                    table: "measurement_conditions",
                    id: mc.id,
                    target: "defect condition",
                    target_id: mc.defect_condition_id,
                });
            }
        }

        let owner: BTreeMap<i64, i64> = self
            .specifications
            .iter()
            .map(|s| (s.id, s.measurement_condition_id))
            .collect();
        for spec in &self.specifications {
            if !mcs.contains(&spec.measurement_condition_id) {
                return Err(SchemaError::DanglingReference {
                    table: "specifications",
                    id: spec.id,
                    target: "measurement condition",
                    target_id: spec.measurement_condition_id,
                });
            }
            if let Some(parent) = spec.parent_spec_id {
                match owner.get(&parent) {
                    None => {
                        return Err(SchemaError::DanglingParent {
                            spec: spec.id,
                            parent,
                        });
                    }
                    Some(mc) if *mc != spec.measurement_condition_id => {
                        return Err(SchemaError::CrossConditionParent {
                            spec: spec.id,
                            parent,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        for expr in &self.expressions {
            if !specs.contains(&expr.specification_id) {
                return Err(SchemaError::DanglingReference {
                    table: "expressions",
                    id: expr.id,
                    target: "specification",
                    target_id: expr.specification_id,
                });
            }
        }

        Ok(())
    }

    /// Rebuild the nested form of one defect condition.
    ///
    /// Specification rows whose parent chain never reaches a root can only be
    /// part of a parent cycle; they cannot be nested and are reported. Chains
    /// longer than `max_depth` are rejected before any nesting happens.
    pub fn assemble(&self, dc_id: i64, max_depth: usize) -> Result<RawDefectCondition, SchemaError> {
        self.check_references()?;
        let dc = self.defect_condition(dc_id)?;
        let exprs = self.expressions_by_spec();

        let mut measurement_conditions = Vec::new();
        for mc in self.measurement_conditions_of(dc_id) {
            let rows = self.specifications_of(mc.id);

            let mut children: BTreeMap<i64, Vec<&SpecificationRow>> = BTreeMap::new();
            let mut roots = Vec::new();
            for row in rows.iter().copied() {
                match row.parent_spec_id {
                    Some(p) => children.entry(p).or_default().push(row),
                    None => roots.push(row),
                }
            }

            // Iterative walk first, so `nest` only ever sees bounded chains.
            let mut placed = BTreeSet::new();
            let mut stack: Vec<(&SpecificationRow, usize)> = roots.iter().map(|&r| (r, 1)).collect();
            while let Some((row, depth)) = stack.pop() {
                if depth > max_depth {
                    return Err(SchemaError::NestingTooDeep {
                        spec: row.id,
                        limit: max_depth,
                    });
                }
                placed.insert(row.id);
                if let Some(kids) = children.get(&row.id) {
                    stack.extend(kids.iter().map(|&k| (k, depth + 1)));
                }
            }

            let specifications = roots.iter().map(|r| nest(r, &children, &exprs)).collect();

            let unreachable: Vec<i64> = rows
                .iter()
                .map(|r| r.id)
                .filter(|id| !placed.contains(id))
                .collect();
            if !unreachable.is_empty() {
                return Err(SchemaError::Unreachable(unreachable));
            }

            measurement_conditions.push(RawMeasurementCondition {
                id: Some(mc.id),
                idx: mc.idx,
                measurement_name: mc.measurement_name.clone(),
                default_result_value: mc.default_result_value,
                root_logical_operator: mc.root_logical_operator,
                measurement_condition_value: mc.measurement_condition_value,
                measurement_condition_unit: mc.measurement_condition_unit.clone(),
                measurement_condition_inequality_sign: mc.measurement_condition_inequality_sign,
                specifications,
            });
        }

        Ok(RawDefectCondition {
            id: Some(dc.id),
            idx: dc.idx,
            machine_type: dc.machine_type.clone(),
            metal_value_percent: dc.metal_value_percent,
            no_measurement_default_result: dc.no_measurement_default_result,
            measurement_conditions,
        })
    }
}

// Rows reachable from a root form a forest (one parent each) whose depth was
// checked by the caller, so this recursion terminates within the limit.
fn nest(
    row: &SpecificationRow,
    children: &BTreeMap<i64, Vec<&SpecificationRow>>,
    exprs: &BTreeMap<i64, Vec<&ExpressionRow>>,
) -> RawSpecification {
    RawSpecification {
        id: Some(row.id),
        measurement_name: row.measurement_name.clone(),
        unit: row.unit.clone(),
        sub_logical_operator: row.sub_logical_operator,
        expressions: exprs
            .get(&row.id)
            .map(|es| {
                es.iter()
                    .map(|e| RawExpression {
                        id: Some(e.id),
                        value: e.value,
                        inequality_sign: e.inequality_sign,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        sub_specifications: children
            .get(&row.id)
            .map(|kids| {
                kids.iter()
                    .map(|k| nest(k, children, exprs))
                    .collect()
            })
            .unwrap_or_default(),
    }
}
