use crate::sql::{
    parser::ast::{ColumnDef, Expression},
    types::DataSchema,
};

pub mod planner;

pub use planner::Planner;

/// Logical plan: what a statement means once names are resolved
///
/// DDL variants are carried to execution unchanged; catalog checks for them
/// happen under the catalog lock at execution time. Query variants form a
/// tree rooted at the outermost operator.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    CreateSchema {
        name: String,
        if_not_exists: bool,
    },
    DropSchema {
        name: String,
    },
    CreateTable {
        schema: String,
        name: String,
        columns: Vec<ColumnDef>,
        /// Column-level and table-level primary keys, merged
        primary_keys: Vec<String>,
        if_not_exists: bool,
    },
    DropTable {
        schema: String,
        name: String,
    },
    /// Rows are expressions bound to the table's columns, in column order
    Insert {
        schema: String,
        table: String,
        rows: Vec<Vec<Expression>>,
    },
    Scan {
        schema: String,
        table: String,
        output: DataSchema,
    },
    Filter {
        source: Box<LogicalPlan>,
        predicate: Expression,
    },
    /// (expression, ascending) keys, most significant first
    Order {
        source: Box<LogicalPlan>,
        order_by: Vec<(Expression, bool)>,
    },
    Offset {
        source: Box<LogicalPlan>,
        offset: u64,
    },
    Limit {
        source: Box<LogicalPlan>,
        limit: u64,
    },
    Projection {
        source: Box<LogicalPlan>,
        exprs: Vec<Expression>,
        output: DataSchema,
    },
}

impl LogicalPlan {
    /// Shape of the rows the plan produces; `None` when there is no result set
    pub fn schema(&self) -> Option<DataSchema> {
        match self {
            LogicalPlan::CreateSchema { .. }
            | LogicalPlan::DropSchema { .. }
            | LogicalPlan::CreateTable { .. }
            | LogicalPlan::DropTable { .. }
            | LogicalPlan::Insert { .. } => None,
            LogicalPlan::Scan { output, .. } | LogicalPlan::Projection { output, .. } => {
                Some(output.clone())
            }
            LogicalPlan::Filter { source, .. }
            | LogicalPlan::Order { source, .. }
            | LogicalPlan::Offset { source, .. }
            | LogicalPlan::Limit { source, .. } => source.schema(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LogicalPlan::CreateSchema { .. } => "CreateSchema",
            LogicalPlan::DropSchema { .. } => "DropSchema",
            LogicalPlan::CreateTable { .. } => "CreateTable",
            LogicalPlan::DropTable { .. } => "DropTable",
            LogicalPlan::Insert { .. } => "Insert",
            LogicalPlan::Scan { .. } => "Scan",
            LogicalPlan::Filter { .. } => "Filter",
            LogicalPlan::Order { .. } => "Order",
            LogicalPlan::Offset { .. } => "Offset",
            LogicalPlan::Limit { .. } => "Limit",
            LogicalPlan::Projection { .. } => "Projection",
        }
    }

    /// DDL plans run directly against the catalog
    pub fn is_utility(&self) -> bool {
        matches!(
            self,
            LogicalPlan::CreateSchema { .. }
                | LogicalPlan::DropSchema { .. }
                | LogicalPlan::CreateTable { .. }
                | LogicalPlan::DropTable { .. }
        )
    }
}
