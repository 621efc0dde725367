use std::cmp::Ordering;

use tracing::{debug, info};

use crate::{
    context::CancellationToken,
    error::{Error, Result},
    sql::{
        catalog::Catalog,
        optimizer::PhysicalPlan,
        parser::ast::Expression,
        types::{DataChunk, DataRow, DataSchema, Value},
    },
    storage::{Storage, engine::Engine},
};

pub mod eval;
mod insert;
mod scan;
mod utility;

use eval::evaluate;

/// Runs physical plans against a catalog and storage
pub struct Executor<'a, E: Engine> {
    catalog: &'a Catalog,
    storage: &'a Storage<E>,
}

impl<'a, E: Engine> Executor<'a, E> {
    pub fn new(catalog: &'a Catalog, storage: &'a Storage<E>) -> Self {
        Self { catalog, storage }
    }

    /// Executes `plan`. Queries return a chunk; DDL and INSERT return `None`.
    pub fn execute(
        &self,
        plan: PhysicalPlan,
        token: &CancellationToken,
    ) -> Result<Option<DataChunk>> {
        debug!(plan = plan.kind(), "executing");
        token.check()?;
        match plan {
            PhysicalPlan::Utility(plan) => {
                utility::execute(plan, self.catalog, self.storage)?;
                Ok(None)
            }
            PhysicalPlan::Insert(insert) => {
                let count = insert.execute(self.catalog, self.storage, token)?;
                info!(count, "insert finished");
                Ok(None)
            }
            plan => self.query(plan, token).map(Some),
        }
    }

    fn query(&self, plan: PhysicalPlan, token: &CancellationToken) -> Result<DataChunk> {
        match plan {
            PhysicalPlan::Scan(scan) => scan.execute(self.catalog, self.storage, token),
            PhysicalPlan::Filter { source, predicate } => {
                let chunk = self.query(*source, token)?;
                let schema = chunk.schema().clone();
                let mut rows = Vec::new();
                for row in chunk.into_rows() {
                    token.check()?;
                    match evaluate(&predicate, &row, &schema)? {
                        Value::Bool(true) => rows.push(row),
                        Value::Bool(false) => {}
                        v => {
                            return Err(Error::Execution(format!(
                                "filter predicate returned {}, expected BOOL",
                                v.datatype()
                            )));
                        }
                    }
                }
                Ok(DataChunk::with_rows(schema, rows))
            }
            PhysicalPlan::Order { source, order_by } => {
                let chunk = self.query(*source, token)?;
                let schema = chunk.schema().clone();
                let mut keyed = chunk
                    .into_rows()
                    .into_iter()
                    .map(|row| {
                        let keys = order_by
                            .iter()
                            .map(|(expr, _)| evaluate(expr, &row, &schema))
                            .collect::<Result<Vec<_>>>()?;
                        Ok((keys, row))
                    })
                    .collect::<Result<Vec<_>>>()?;

                // Compare key by key; equal or incomparable keys fall through
                // to the next one.
                keyed.sort_by(|(a, _), (b, _)| {
                    for ((x, y), (_, ascending)) in a.iter().zip(b).zip(&order_by) {
                        match compare_keys(x, y) {
                            Ordering::Equal => {}
                            o if *ascending => return o,
                            o => return o.reverse(),
                        }
                    }
                    Ordering::Equal
                });
                let rows = keyed.into_iter().map(|(_, row)| row).collect();
                Ok(DataChunk::with_rows(schema, rows))
            }
            PhysicalPlan::Offset { source, offset } => {
                let chunk = self.query(*source, token)?;
                let schema = chunk.schema().clone();
                let rows = chunk.into_rows().into_iter().skip(clamp(offset)).collect();
                Ok(DataChunk::with_rows(schema, rows))
            }
            PhysicalPlan::Limit { source, limit } => {
                let chunk = self.query(*source, token)?;
                let schema = chunk.schema().clone();
                let rows = chunk.into_rows().into_iter().take(clamp(limit)).collect();
                Ok(DataChunk::with_rows(schema, rows))
            }
            PhysicalPlan::Projection {
                source,
                exprs,
                output,
            } => {
                let chunk = self.query(*source, token)?;
                let mut projected = DataChunk::new(output);
                for row in chunk.rows() {
                    token.check()?;
                    projected.append_row(project(&exprs, row, chunk.schema())?);
                }
                Ok(projected)
            }
            plan => Err(Error::Execution(format!(
                "{} does not produce rows",
                plan.kind()
            ))),
        }
    }
}

fn project(exprs: &[Expression], row: &DataRow, schema: &DataSchema) -> Result<DataRow> {
    exprs
        .iter()
        .map(|expr| evaluate(expr, row, schema))
        .collect::<Result<Vec<_>>>()
        .map(DataRow::new)
}

/// Sort order of two key values. FLOAT pairs use `total_cmp`, so NaN sorts
/// after every other float.
fn compare_keys(x: &Value, y: &Value) -> Ordering {
    match (x, y) {
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        _ => x.partial_cmp(y).unwrap_or(Ordering::Equal),
    }
}

fn clamp(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
