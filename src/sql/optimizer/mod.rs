//! Physical planning.
//!
//! There is no cost model yet: DDL passes through untouched and query plans
//! are mapped operator for operator, with table references resolved to
//! catalog ids so execution does not have to look names up again.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    sql::{
        catalog::{Catalog, ObjectId, system::SystemTable},
        parser::ast::Expression,
        plan::LogicalPlan,
        types::DataSchema,
    },
};

/// Planner hints keyed by name. Accepted for future cost-based decisions.
pub type Statistics = BTreeMap<String, serde_json::Value>;

/// Executable plan
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalPlan {
    /// DDL, run directly against the catalog
    Utility(LogicalPlan),
    Scan(ScanExec),
    Insert(InsertExec),
    Filter {
        source: Box<PhysicalPlan>,
        predicate: Expression,
    },
    Order {
        source: Box<PhysicalPlan>,
        order_by: Vec<(Expression, bool)>,
    },
    Offset {
        source: Box<PhysicalPlan>,
        offset: u64,
    },
    Limit {
        source: Box<PhysicalPlan>,
        limit: u64,
    },
    Projection {
        source: Box<PhysicalPlan>,
        exprs: Vec<Expression>,
        output: DataSchema,
    },
}

impl PhysicalPlan {
    pub fn schema(&self) -> Option<DataSchema> {
        match self {
            PhysicalPlan::Utility(plan) => plan.schema(),
            PhysicalPlan::Scan(scan) => Some(scan.output.clone()),
            PhysicalPlan::Insert(_) => None,
            PhysicalPlan::Projection { output, .. } => Some(output.clone()),
            PhysicalPlan::Filter { source, .. }
            | PhysicalPlan::Order { source, .. }
            | PhysicalPlan::Offset { source, .. }
            | PhysicalPlan::Limit { source, .. } => source.schema(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PhysicalPlan::Utility(_) => "Utility",
            PhysicalPlan::Scan(_) => "Scan",
            PhysicalPlan::Insert(_) => "Insert",
            PhysicalPlan::Filter { .. } => "Filter",
            PhysicalPlan::Order { .. } => "Order",
            PhysicalPlan::Offset { .. } => "Offset",
            PhysicalPlan::Limit { .. } => "Limit",
            PhysicalPlan::Projection { .. } => "Projection",
        }
    }
}

/// Full scan of one table
#[derive(Debug, Clone, PartialEq)]
pub struct ScanExec {
    pub schema_id: ObjectId,
    pub table_id: ObjectId,
    pub table_name: String,
    /// The table's columns, in catalog order
    pub output: DataSchema,
    /// Set for information_schema tables, whose rows come from the catalog
    pub system: Option<SystemTable>,
}

/// Insert of fully bound rows into one table
#[derive(Debug, Clone, PartialEq)]
pub struct InsertExec {
    pub schema_id: ObjectId,
    pub table_id: ObjectId,
    pub schema_name: String,
    pub table_name: String,
    /// Record layout rows are encoded with
    pub layout: DataSchema,
    /// One expression per layout column
    pub rows: Vec<Vec<Expression>>,
}

pub struct Optimizer<'a> {
    catalog: &'a Catalog,
}

impl<'a> Optimizer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    pub fn optimize(&self, plan: LogicalPlan, stats: &Statistics) -> Result<PhysicalPlan> {
        trace!(hints = stats.len(), "optimizing {}", plan.kind());
        let physical = self.build(plan)?;
        debug!(plan = physical.kind(), "physical plan built");
        Ok(physical)
    }

    fn build(&self, plan: LogicalPlan) -> Result<PhysicalPlan> {
        Ok(match plan {
            plan if plan.is_utility() => PhysicalPlan::Utility(plan),
            LogicalPlan::Insert {
                schema,
                table,
                rows,
            } => {
                let root = self.catalog.lock()?;
                let s = root.must_get_schema(&schema)?;
                let t = s.must_get_table(&table)?;
                let layout = t.data_schema();
                if let Some(row) = rows.iter().find(|r| r.len() != layout.len()) {
                    return Err(Error::Optimize(format!(
                        "insert row has {} values but table {} has {} columns",
                        row.len(),
                        table,
                        layout.len()
                    )));
                }
                PhysicalPlan::Insert(InsertExec {
                    schema_id: s.id,
                    table_id: t.id,
                    schema_name: schema,
                    table_name: table,
                    layout,
                    rows,
                })
            }
            LogicalPlan::Scan {
                schema,
                table,
                output,
            } => {
                let root = self.catalog.lock()?;
                let s = root.must_get_schema(&schema)?;
                let t = s.must_get_table(&table)?;
                if t.data_schema() != output {
                    return Err(Error::Optimize(format!(
                        "table {}.{} changed while the query was planned",
                        schema, table
                    )));
                }
                PhysicalPlan::Scan(ScanExec {
                    schema_id: s.id,
                    table_id: t.id,
                    output,
                    system: SystemTable::lookup(&schema, &table),
                    table_name: table,
                })
            }
            LogicalPlan::Filter { source, predicate } => PhysicalPlan::Filter {
                source: Box::new(self.build(*source)?),
                predicate,
            },
            LogicalPlan::Order { source, order_by } => PhysicalPlan::Order {
                source: Box::new(self.build(*source)?),
                order_by,
            },
            LogicalPlan::Offset { source, offset } => PhysicalPlan::Offset {
                source: Box::new(self.build(*source)?),
                offset,
            },
            LogicalPlan::Limit { source, limit } => PhysicalPlan::Limit {
                source: Box::new(self.build(*source)?),
                limit,
            },
            LogicalPlan::Projection {
                source,
                exprs,
                output,
            } => PhysicalPlan::Projection {
                source: Box::new(self.build(*source)?),
                exprs,
                output,
            },
            plan => {
                return Err(Error::Optimize(format!(
                    "no physical plan for {}",
                    plan.kind()
                )));
            }
        })
    }
}
