use tracing::debug;

use crate::{
    error::{Error, Result},
    sql::{
        catalog::{Catalog, system::INFORMATION_SCHEMA},
        executor::eval::infer_type,
        parser::ast::{Expression, Statement, TableName},
        plan::LogicalPlan,
        types::{DataColumn, DataSchema, DataType},
    },
};

/// Query planner - binds AST statements against the catalog
pub struct Planner<'a> {
    catalog: &'a Catalog,
    /// Schema for table names written without one
    default_schema: &'a str,
}

impl<'a> Planner<'a> {
    pub fn new(catalog: &'a Catalog, default_schema: &'a str) -> Self {
        Self {
            catalog,
            default_schema,
        }
    }

    /// Builds the logical plan of one statement
    pub fn build(&self, stmt: Statement) -> Result<LogicalPlan> {
        let kind = stmt.kind();
        let plan = match stmt {
            Statement::CreateSchema {
                name,
                if_not_exists,
            } => LogicalPlan::CreateSchema {
                name,
                if_not_exists,
            },
            Statement::DropSchema { name } => LogicalPlan::DropSchema { name },
            Statement::CreateTable {
                name,
                columns,
                if_not_exists,
                primary_keys,
            } => {
                let (schema, name) = self.resolve(name);
                let mut merged: Vec<String> = columns
                    .iter()
                    .filter(|c| c.constraint.primary_key)
                    .map(|c| c.name.clone())
                    .collect();
                for key in primary_keys {
                    if !merged.contains(&key) {
                        merged.push(key);
                    }
                }
                LogicalPlan::CreateTable {
                    schema,
                    name,
                    columns,
                    primary_keys: merged,
                    if_not_exists,
                }
            }
            Statement::DropTable { name } => {
                let (schema, name) = self.resolve(name);
                LogicalPlan::DropTable { schema, name }
            }
            Statement::Insert {
                table,
                columns,
                rows,
            } => self.build_insert(table, columns, rows)?,
            Statement::Select {
                columns,
                from,
                where_clause,
                group_by,
                order_by,
                limit,
                offset,
            } => {
                if !group_by.is_empty() {
                    return Err(Error::Plan(format!(
                        "unsupported statement type: {} with GROUP BY",
                        kind
                    )));
                }
                self.build_select(columns, from, where_clause, order_by, limit, offset)?
            }
        };
        debug!(statement = kind, plan = plan.kind(), "statement planned");
        Ok(plan)
    }

    fn resolve(&self, name: TableName) -> (String, String) {
        let schema = name.schema.unwrap_or_else(|| self.default_schema.to_string());
        (schema, name.name)
    }

    /// Row layout of an existing table
    fn table_schema(&self, schema: &str, table: &str) -> Result<DataSchema> {
        let root = self.catalog.lock()?;
        Ok(root.must_get_schema(schema)?.must_get_table(table)?.data_schema())
    }

    fn build_insert(
        &self,
        table: TableName,
        columns: Vec<String>,
        rows: Vec<Vec<Expression>>,
    ) -> Result<LogicalPlan> {
        let (schema, table) = self.resolve(table);
        if schema == INFORMATION_SCHEMA {
            return Err(Error::Plan(format!("{} is read-only", INFORMATION_SCHEMA)));
        }
        let layout = self.table_schema(&schema, &table)?;

        // positions[i] is the table column written by the i-th value of a row
        let positions = if columns.is_empty() {
            (0..layout.len()).collect::<Vec<_>>()
        } else {
            let mut positions = Vec::with_capacity(columns.len());
            for name in &columns {
                let index = layout.must_index_of(name)?;
                if positions.contains(&index) {
                    return Err(Error::Plan(format!("column {} is listed twice", name)));
                }
                positions.push(index);
            }
            positions
        };
        if let Some(missing) = (0..layout.len()).find(|i| !positions.contains(i)) {
            return Err(Error::Plan(format!(
                "no value for column {}; NULL values are not supported",
                layout.columns[missing].name
            )));
        }

        let mut bound = Vec::with_capacity(rows.len());
        for (n, row) in rows.into_iter().enumerate() {
            if row.len() != positions.len() {
                return Err(Error::Plan(format!(
                    "row {} has {} values, expected {}",
                    n + 1,
                    row.len(),
                    positions.len()
                )));
            }
            let mut slots: Vec<Option<Expression>> = vec![None; layout.len()];
            for (expr, &index) in row.into_iter().zip(&positions) {
                slots[index] = Some(expr);
            }
            bound.push(slots.into_iter().flatten().collect());
        }

        Ok(LogicalPlan::Insert {
            schema,
            table,
            rows: bound,
        })
    }

    fn build_select(
        &self,
        columns: Vec<Expression>,
        from: TableName,
        where_clause: Option<Expression>,
        order_by: Vec<Expression>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<LogicalPlan> {
        let (schema, table) = self.resolve(from);
        let input = self.table_schema(&schema, &table)?;
        let mut node = LogicalPlan::Scan {
            schema,
            table,
            output: input.clone(),
        };

        if let Some(predicate) = where_clause {
            let t = infer_type(&predicate, &input)?;
            if t != DataType::Bool {
                return Err(Error::Plan(format!("WHERE clause must be BOOL, got {}", t)));
            }
            node = LogicalPlan::Filter {
                source: Box::new(node),
                predicate,
            };
        }

        if !order_by.is_empty() {
            let mut keys = Vec::with_capacity(order_by.len());
            for item in order_by {
                let (expr, ascending) = match item {
                    Expression::Sort { expr, ascending } => (*expr, ascending),
                    expr => (expr, true),
                };
                infer_type(&expr, &input)?;
                keys.push((expr, ascending));
            }
            node = LogicalPlan::Order {
                source: Box::new(node),
                order_by: keys,
            };
        }

        if let Some(offset) = offset {
            node = LogicalPlan::Offset {
                source: Box::new(node),
                offset,
            };
        }
        if let Some(limit) = limit {
            node = LogicalPlan::Limit {
                source: Box::new(node),
                limit,
            };
        }

        let mut exprs = Vec::new();
        let mut output = Vec::new();
        for item in columns {
            match item {
                Expression::Wildcard => {
                    for column in &input.columns {
                        exprs.push(Expression::Identifier(column.name.clone()));
                        output.push(column.clone());
                    }
                }
                Expression::Alias { alias, expr } => {
                    output.push(DataColumn::new(alias, infer_type(&expr, &input)?));
                    exprs.push(*expr);
                }
                expr => {
                    output.push(DataColumn::new(expr.to_string(), infer_type(&expr, &input)?));
                    exprs.push(expr);
                }
            }
        }

        Ok(LogicalPlan::Projection {
            source: Box::new(node),
            exprs,
            output: DataSchema::new(output),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Planner;
    use crate::{
        error::{Error, Result},
        sql::{
            catalog::{Catalog, ColumnConstraint},
            parser::{Parser, ast::Expression},
            plan::LogicalPlan,
            types::{DataColumn, DataSchema, DataType},
        },
    };

    fn catalog() -> Result<Catalog> {
        let catalog = Catalog::new()?;
        {
            let mut root = catalog.lock()?;
            let table = root.add_schema("public")?.add_table("t")?;
            table.add_column("a", DataType::Int, ColumnConstraint::default())?;
            table.add_column("b", DataType::Text, ColumnConstraint::default())?;
        }
        Ok(catalog)
    }

    fn plan(catalog: &Catalog, sql: &str) -> Result<LogicalPlan> {
        let mut program = Parser::new(sql).parse()?;
        Planner::new(catalog, "public").build(program.statements.remove(0))
    }

    #[test]
    fn test_plan_create_schema() -> Result<()> {
        let catalog = catalog()?;
        let plan = plan(&catalog, "CREATE SCHEMA IF NOT EXISTS x;")?;
        assert_eq!(
            plan,
            LogicalPlan::CreateSchema {
                name: "x".into(),
                if_not_exists: true,
            }
        );
        assert_eq!(plan.schema(), None);
        assert!(plan.is_utility());
        Ok(())
    }

    #[test]
    fn test_plan_create_table_merges_keys() -> Result<()> {
        let catalog = catalog()?;
        let plan = plan(
            &catalog,
            "CREATE TABLE s.u (a INT PRIMARY KEY, b INT, PRIMARY KEY (b, a));",
        )?;
        let LogicalPlan::CreateTable {
            schema,
            primary_keys,
            ..
        } = plan
        else {
            panic!("expected create table");
        };
        assert_eq!(schema, "s");
        assert_eq!(primary_keys, ["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_plan_insert_binds_columns() -> Result<()> {
        let catalog = catalog()?;
        let insert = plan(&catalog, r#"INSERT INTO t (b, a) VALUES ("x", 1);"#)?;
        assert_eq!(
            insert,
            LogicalPlan::Insert {
                schema: "public".into(),
                table: "t".into(),
                rows: vec![vec![
                    Expression::IntegerLiteral(1),
                    Expression::StringLiteral("x".into()),
                ]],
            }
        );

        let err = |sql| plan(&catalog, sql).unwrap_err();
        assert!(matches!(err("INSERT INTO t (a) VALUES (1);"), Error::Plan(_)));
        assert!(matches!(err("INSERT INTO t (a, a) VALUES (1, 2);"), Error::Plan(_)));
        assert!(matches!(err("INSERT INTO t VALUES (1);"), Error::Plan(_)));
        assert!(matches!(err("INSERT INTO t (c) VALUES (1);"), Error::NotFound(_)));
        assert!(matches!(err("INSERT INTO nope VALUES (1);"), Error::NotFound(_)));
        assert!(matches!(
            err("INSERT INTO information_schema.schemas VALUES (1, \"x\");"),
            Error::Plan(_)
        ));
        Ok(())
    }

    #[test]
    fn test_plan_select_tree() -> Result<()> {
        let catalog = catalog()?;
        let plan = plan(
            &catalog,
            "SELECT *, a * 2 AS double, a + 1 FROM t WHERE a > 1 ORDER BY b DESC LIMIT 3 OFFSET 1;",
        )?;
        assert_eq!(
            plan.schema(),
            Some(DataSchema::new(vec![
                DataColumn::new("a", DataType::Int),
                DataColumn::new("b", DataType::Text),
                DataColumn::new("double", DataType::Int),
                DataColumn::new("(a + 1)", DataType::Int),
            ]))
        );

        let mut kinds = Vec::new();
        let mut node = &plan;
        loop {
            kinds.push(node.kind());
            node = match node {
                LogicalPlan::Projection { source, .. }
                | LogicalPlan::Limit { source, .. }
                | LogicalPlan::Offset { source, .. }
                | LogicalPlan::Order { source, .. }
                | LogicalPlan::Filter { source, .. } => source.as_ref(),
                _ => break,
            };
        }
        assert_eq!(kinds, ["Projection", "Limit", "Offset", "Order", "Filter", "Scan"]);
        Ok(())
    }

    #[test]
    fn test_plan_select_errors() -> Result<()> {
        let catalog = catalog()?;
        let err = |sql| plan(&catalog, sql).unwrap_err();
        assert!(matches!(err("SELECT a FROM t GROUP BY a;"), Error::Plan(_)));
        assert!(matches!(err("SELECT a FROM t WHERE a + 1;"), Error::Plan(_)));
        assert!(matches!(err("SELECT c FROM t;"), Error::NotFound(_)));
        assert!(matches!(err("SELECT a FROM x.t;"), Error::NotFound(_)));
        assert!(matches!(err("SELECT b - 1 FROM t;"), Error::Plan(_)));
        Ok(())
    }
}
