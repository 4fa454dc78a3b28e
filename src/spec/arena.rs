//! Validated specification tree, stored as an arena.
//!
//! Nodes live in one flat vector in row order; children are indices into it.
//! Loading never recurses, so a hostile parent chain cannot blow the stack.
//!
//! Hard errors (the tree cannot be built):
//! - duplicate specification ids
//! - a parent id that does not exist
//!
//! Recorded malformations (the tree is built, evaluation fails closed):
//! - a parent cycle (rows that never reach a root)
//! - a node deeper than the configured max depth
//! - a branch node without an operator, or a node with nothing to evaluate

use crate::error::{Malformation, SchemaError};
use crate::spec::raw::RawSpecification;
use crate::spec::sign::{InequalitySign, LogicalOperator};
use crate::spec::table::{ExpressionRow, SpecTables, SpecificationRow};
use std::collections::BTreeMap;

pub type NodeId = usize;

/// A single threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expression {
    pub threshold: f64,
    pub sign: InequalitySign,
}

#[derive(Debug, Clone)]
pub struct SpecNode {
    pub id: i64,
    pub measurement_name: String,
    pub unit: Option<String>,
    pub operator: Option<LogicalOperator>,
    pub expressions: Vec<Expression>,
    pub children: Vec<NodeId>,
    /// 1 for roots; 0 for rows that are not reachable from any root.
    pub depth: usize,
    pub defect: Option<Malformation>,
}

#[derive(Debug, Clone, Default)]
pub struct SpecTree {
    nodes: Vec<SpecNode>,
    roots: Vec<NodeId>,
    issues: Vec<Malformation>,
}

impl SpecTree {
    /// Build from the specification rows of one measurement condition.
    pub fn build(
        rows: &[&SpecificationRow],
        exprs: &BTreeMap<i64, Vec<&ExpressionRow>>,
        max_depth: usize,
    ) -> Result<Self, SchemaError> {
        // 1) Nodes, keyed by id.
        let mut index: BTreeMap<i64, NodeId> = BTreeMap::new();
        let mut nodes = Vec::with_capacity(rows.len());
        for row in rows {
            if index.insert(row.id, nodes.len()).is_some() {
                return Err(SchemaError::DuplicateId {
                    table: "specifications",
                    id: row.id,
                });
            }
            nodes.push(SpecNode {
                id: row.id,
                measurement_name: row.measurement_name.clone(),
                unit: row.unit.clone(),
                operator: row.sub_logical_operator,
                expressions: exprs
                    .get(&row.id)
                    .map(|es| {
                        es.iter()
                            .map(|e| Expression {
                                threshold: e.value,
                                sign: e.inequality_sign,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                children: Vec::new(),
                depth: 0,
                defect: None,
            });
        }

        // 2) Edges from parent pointers; roots have none.
        let mut parent: Vec<Option<NodeId>> = vec![None; nodes.len()];
        let mut roots = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            match row.parent_spec_id {
                Some(pid) => {
                    let p = *index.get(&pid).ok_or(SchemaError::DanglingParent {
                        spec: row.id,
                        parent: pid,
                    })?;
                    nodes[p].children.push(i);
                    parent[i] = Some(p);
                }
                None => roots.push(i),
            }
        }

        let mut issues = Vec::new();

        // 3) Depth of everything reachable from a root.
        let mut stack: Vec<(NodeId, usize)> = roots.iter().rev().map(|&r| (r, 1)).collect();
        while let Some((v, depth)) = stack.pop() {
            nodes[v].depth = depth;
            // Roots start at 1.
            if depth - 1 == max_depth {
                nodes[v].defect = Some(Malformation::DepthExceeded {
                    spec: nodes[v].id,
                    depth,
                    limit: max_depth,
                });
            }
            for &c in nodes[v].children.iter().rev() {
                stack.push((c, depth + 1));
            }
        }

        // 4) Shape of each reachable node, in row order.
        for node in nodes.iter_mut().filter(|n| n.depth > 0) {
            if node.defect.is_some() {
                continue;
            }
            if !node.children.is_empty() && node.operator.is_none() {
                node.defect = Some(Malformation::MissingOperator { spec: node.id });
            } else if node.children.is_empty() && node.expressions.is_empty() {
                node.defect = Some(Malformation::EmptyLeaf { spec: node.id });
            }
        }
        issues.extend(nodes.iter().filter_map(|n| n.defect.clone()));

        // 5) Unreachable rows: every parent exists, so walking up from one
        //    must eventually revisit a node. Report each cycle once.
        #[derive(Copy, Clone, PartialEq, Eq)]
        enum Mark {
            Temp,
            Perm,
        }

        let mut marks: Vec<Option<Mark>> = nodes
            .iter()
            .map(|n| (n.depth > 0).then_some(Mark::Perm))
            .collect();
        for start in 0..nodes.len() {
            if marks[start].is_some() {
                continue;
            }
            let mut path: Vec<NodeId> = Vec::new();
            let mut v = start;
            loop {
                match marks[v] {
                    Some(Mark::Perm) => break,
                    Some(Mark::Temp) => {
                        let from = path.iter().position(|&p| p == v).unwrap_or(0);
                        let mut cycle: Vec<i64> = path[from..].iter().map(|&p| nodes[p].id).collect();
                        cycle.push(nodes[v].id);
                        issues.push(Malformation::Cycle { path: cycle });
                        break;
                    }
                    None => {
                        marks[v] = Some(Mark::Temp);
                        path.push(v);
                        match parent[v] {
                            Some(p) => v = p,
                            None => break,
                        }
                    }
                }
            }
            for p in path {
                marks[p] = Some(Mark::Perm);
            }
        }

        Ok(SpecTree {
            nodes,
            roots,
            issues,
        })
    }

    /// Build a standalone tree from nested specifications.
    pub fn from_raw(specs: &[RawSpecification], max_depth: usize) -> Result<Self, SchemaError> {
        let tables = SpecTables::flatten_specifications(specs, 0)?;
        let rows: Vec<&SpecificationRow> = tables.specifications.iter().collect();
        Self::build(&rows, &tables.expressions_by_spec(), max_depth)
    }

    pub fn node(&self, id: NodeId) -> &SpecNode {
        &self.nodes[id]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn issues(&self) -> &[Malformation] {
        &self.issues
    }

    pub fn is_malformed(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
