use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::sql::types::DataType;

/// Abstract Syntax Tree (AST) node definitions for SQL statements.
///
/// Each statement renders back to canonical SQL through `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE SCHEMA [IF NOT EXISTS] name
    CreateSchema { name: String, if_not_exists: bool },
    /// DROP SCHEMA name
    DropSchema { name: String },
    /// CREATE TABLE [IF NOT EXISTS] name (columns)
    CreateTable {
        name: TableName,
        columns: Vec<ColumnDef>,
        if_not_exists: bool,
        /// Table-level PRIMARY KEY (a, b) list
        primary_keys: Vec<String>,
    },
    /// DROP TABLE name
    DropTable { name: TableName },
    /// INSERT INTO table [(columns)] VALUES (..), (..)
    Insert {
        table: TableName,
        columns: Vec<String>,
        rows: Vec<Vec<Expression>>,
    },
    /// SELECT statement
    Select {
        columns: Vec<Expression>,
        from: TableName,
        where_clause: Option<Expression>,
        group_by: Vec<Expression>,
        /// Always `Expression::Sort` items
        order_by: Vec<Expression>,
        limit: Option<u64>,
        offset: Option<u64>,
    },
}

impl Statement {
    /// Variant name, used in planner errors and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateSchema { .. } => "CreateSchemaStatement",
            Statement::DropSchema { .. } => "DropSchemaStatement",
            Statement::CreateTable { .. } => "CreateTableStatement",
            Statement::DropTable { .. } => "DropTableStatement",
            Statement::Insert { .. } => "InsertStatement",
            Statement::Select { .. } => "SelectStatement",
        }
    }
}

/// Ordered sequence of parsed statements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// Possibly schema-qualified table reference
#[derive(Debug, Clone, PartialEq)]
pub struct TableName {
    pub schema: Option<String>,
    pub name: String,
}

impl TableName {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }
}

impl From<&str> for TableName {
    fn from(value: &str) -> Self {
        match value.split_once('.') {
            Some((schema, name)) => Self::new(Some(schema.to_string()), name),
            None => Self::new(None, value),
        }
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Column definition for CREATE TABLE statements
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub constraint: Constraint,
}

/// Column-level constraints, accepted in any order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Constraint {
    pub primary_key: bool,
    pub unique: bool,
    pub not_null: bool,
}

/// Expression types
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    StringLiteral(String),
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BooleanLiteral(bool),
    NullLiteral,
    /// `*` in a select list
    Wildcard,
    Alias {
        alias: String,
        expr: Box<Expression>,
    },
    Cast {
        expr: Box<Expression>,
        data_type: DataType,
    },
    Sort {
        expr: Box<Expression>,
        ascending: bool,
    },
    Prefix {
        operator: PrefixOperator,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: InfixOperator,
        right: Box<Expression>,
    },
    Call {
        function: Box<Expression>,
        args: Vec<Expression>,
    },
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrefixOperator {
    /// -a
    Minus,
    /// !a or NOT a
    Not,
}

impl Display for PrefixOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            PrefixOperator::Minus => "-",
            PrefixOperator::Not => "!",
        })
    }
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl Display for InfixOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Equal => "=",
            InfixOperator::NotEqual => "!=",
            InfixOperator::LessThan => "<",
            InfixOperator::LessThanOrEqual => "<=",
            InfixOperator::GreaterThan => ">",
            InfixOperator::GreaterThanOrEqual => ">=",
            InfixOperator::And => "AND",
            InfixOperator::Or => "OR",
        })
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Expression::Identifier(name) => f.write_str(name),
            Expression::StringLiteral(s) => write!(f, "\"{}\"", s),
            Expression::IntegerLiteral(i) => write!(f, "{}", i),
            Expression::FloatLiteral(v) => write!(f, "{:.6}", v),
            Expression::BooleanLiteral(b) => write!(f, "{}", b),
            Expression::NullLiteral => f.write_str("NULL"),
            Expression::Wildcard => f.write_str("*"),
            Expression::Alias { alias, expr } => write!(f, "{} AS {}", expr, alias),
            Expression::Cast { expr, data_type } => write!(f, "CAST({} AS {})", expr, data_type),
            Expression::Sort { expr, ascending } => {
                write!(f, "{} {}", expr, if *ascending { "ASC" } else { "DESC" })
            }
            Expression::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::Call { function, args } => {
                write!(f, "{}(", function)?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Statement::CreateSchema {
                name,
                if_not_exists,
            } => {
                f.write_str("CREATE SCHEMA ")?;
                if *if_not_exists {
                    f.write_str("IF NOT EXISTS ")?;
                }
                write!(f, "{};", name)
            }
            Statement::DropSchema { name } => write!(f, "DROP SCHEMA {};", name),
            Statement::CreateTable {
                name,
                columns,
                if_not_exists,
                primary_keys,
            } => {
                f.write_str("CREATE TABLE ")?;
                if *if_not_exists {
                    f.write_str("IF NOT EXISTS ")?;
                }
                write!(f, "{} (", name)?;
                for (i, col) in columns.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", col.name, col.data_type)?;
                    if col.constraint.primary_key {
                        f.write_str(" PRIMARY KEY")?;
                    }
                    if col.constraint.unique {
                        f.write_str(" UNIQUE")?;
                    }
                    if col.constraint.not_null {
                        f.write_str(" NOT NULL")?;
                    }
                }
                if !primary_keys.is_empty() {
                    write!(f, ", PRIMARY KEY ({})", primary_keys.join(", "))?;
                }
                f.write_str(");")
            }
            Statement::DropTable { name } => write!(f, "DROP TABLE {};", name),
            Statement::Insert {
                table,
                columns,
                rows,
            } => {
                write!(f, "INSERT INTO {}", table)?;
                if !columns.is_empty() {
                    write!(f, " ({})", columns.join(", "))?;
                }
                f.write_str(" VALUES ")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("(")?;
                    write_list(f, row)?;
                    f.write_str(")")?;
                }
                f.write_str(";")
            }
            Statement::Select {
                columns,
                from,
                where_clause,
                group_by,
                order_by,
                limit,
                offset,
            } => {
                f.write_str("SELECT ")?;
                write_list(f, columns)?;
                write!(f, " FROM {}", from)?;
                if let Some(expr) = where_clause {
                    write!(f, " WHERE {}", expr)?;
                }
                if !group_by.is_empty() {
                    f.write_str(" GROUP BY ")?;
                    write_list(f, group_by)?;
                }
                if !order_by.is_empty() {
                    f.write_str(" ORDER BY ")?;
                    write_list(f, order_by)?;
                }
                if let Some(limit) = limit {
                    write!(f, " LIMIT {}", limit)?;
                }
                if let Some(offset) = offset {
                    write!(f, " OFFSET {}", offset)?;
                }
                f.write_str(";")
            }
        }
    }
}

fn write_list(f: &mut Formatter<'_>, exprs: &[Expression]) -> FmtResult {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", expr)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ColumnDef, Constraint, Expression, InfixOperator, Statement, TableName};
    use crate::sql::types::DataType;

    #[test]
    fn test_render_create_table() {
        let stmt = Statement::CreateTable {
            name: TableName::from("s.users"),
            columns: vec![
                ColumnDef {
                    name: "id".into(),
                    data_type: DataType::Int,
                    constraint: Constraint {
                        primary_key: true,
                        ..Default::default()
                    },
                },
                ColumnDef {
                    name: "email".into(),
                    data_type: DataType::Text,
                    constraint: Constraint {
                        unique: true,
                        not_null: true,
                        ..Default::default()
                    },
                },
            ],
            if_not_exists: true,
            primary_keys: vec!["email".into()],
        };
        assert_eq!(
            stmt.to_string(),
            "CREATE TABLE IF NOT EXISTS s.users (id INT PRIMARY KEY, email TEXT UNIQUE NOT NULL, PRIMARY KEY (email));"
        );
    }

    #[test]
    fn test_render_expressions() {
        let expr = Expression::Infix {
            left: Box::new(Expression::Identifier("a".into())),
            operator: InfixOperator::And,
            right: Box::new(Expression::Call {
                function: Box::new(Expression::Identifier("f".into())),
                args: vec![
                    Expression::StringLiteral("x".into()),
                    Expression::FloatLiteral(1.5),
                    Expression::BooleanLiteral(false),
                ],
            }),
        };
        assert_eq!(expr.to_string(), r#"(a AND f("x", 1.500000, false))"#);
        assert_eq!(
            Statement::DropTable {
                name: "t".into()
            }
            .to_string(),
            "DROP TABLE t;"
        );
    }
}
