//! Expression typing and evaluation over rows.
//!
//! `infer_type` runs at plan time and reports problems as plan errors;
//! `evaluate` runs per row and reports them as execution errors.

use std::cmp::Ordering;

use crate::{
    error::{Error, Result},
    sql::{
        parser::ast::{Expression, InfixOperator, PrefixOperator},
        types::{DataRow, DataSchema, DataType, Value},
    },
};

/// Result type of `expr` over rows of `schema`
pub fn infer_type(expr: &Expression, schema: &DataSchema) -> Result<DataType> {
    Ok(match expr {
        Expression::Identifier(name) => schema.columns[schema.must_index_of(name)?].data_type,
        Expression::StringLiteral(_) => DataType::Text,
        Expression::IntegerLiteral(_) => DataType::Int,
        Expression::FloatLiteral(_) => DataType::Float,
        Expression::BooleanLiteral(_) => DataType::Bool,
        Expression::NullLiteral => return Err(Error::Plan("NULL values are not supported".into())),
        Expression::Cast { expr, data_type } => {
            infer_type(expr, schema)?;
            *data_type
        }
        Expression::Prefix { operator, right } => {
            let t = infer_type(right, schema)?;
            match (operator, t) {
                (PrefixOperator::Minus, DataType::Int | DataType::Float) => t,
                (PrefixOperator::Not, DataType::Bool) => DataType::Bool,
                _ => {
                    return Err(Error::Plan(format!(
                        "operator {} cannot be applied to {}",
                        operator, t
                    )));
                }
            }
        }
        Expression::Infix {
            left,
            operator,
            right,
        } => {
            let (l, r) = (infer_type(left, schema)?, infer_type(right, schema)?);
            infix_type(*operator, l, r).ok_or_else(|| {
                Error::Plan(format!("operator {} cannot be applied to {} and {}", operator, l, r))
            })?
        }
        Expression::Call { function, .. } => {
            return Err(Error::Plan(format!("unknown function {}", function)));
        }
        Expression::Wildcard | Expression::Alias { .. } | Expression::Sort { .. } => {
            return Err(Error::Plan(format!("{} is not allowed here", expr)));
        }
    })
}

fn infix_type(operator: InfixOperator, l: DataType, r: DataType) -> Option<DataType> {
    use DataType::*;
    use InfixOperator::*;
    match operator {
        Add | Subtract | Multiply | Divide => match (l, r) {
            (Int, Int) => Some(Int),
            (Int | Float, Int | Float) => Some(Float),
            _ => None,
        },
        Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            match (l, r) {
                (Int | Float, Int | Float) => Some(Bool),
                _ if l == r => Some(Bool),
                _ => None,
            }
        }
        And | Or => (l == Bool && r == Bool).then_some(Bool),
    }
}

/// Evaluates `expr` against one row laid out by `schema`
pub fn evaluate(expr: &Expression, row: &DataRow, schema: &DataSchema) -> Result<Value> {
    match expr {
        Expression::Identifier(name) => {
            let index = schema.must_index_of(name)?;
            row.get(index)
                .cloned()
                .ok_or_else(|| Error::Execution(format!("row has no value for column {}", name)))
        }
        Expression::StringLiteral(s) => Ok(Value::Text(s.clone())),
        Expression::IntegerLiteral(i) => Ok(Value::Int(*i)),
        Expression::FloatLiteral(f) => Ok(Value::Float(*f)),
        Expression::BooleanLiteral(b) => Ok(Value::Bool(*b)),
        Expression::NullLiteral => Err(Error::Execution("NULL values are not supported".into())),
        Expression::Alias { expr, .. } | Expression::Sort { expr, .. } => {
            evaluate(expr, row, schema)
        }
        Expression::Cast { expr, data_type } => cast(evaluate(expr, row, schema)?, *data_type),
        Expression::Prefix { operator, right } => {
            match (operator, evaluate(right, row, schema)?) {
                (PrefixOperator::Minus, Value::Int(i)) => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| Error::Execution("integer overflow".into())),
                (PrefixOperator::Minus, Value::Float(f)) => Ok(Value::Float(-f)),
                (PrefixOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (operator, v) => Err(Error::Execution(format!(
                    "operator {} cannot be applied to {}",
                    operator,
                    v.datatype()
                ))),
            }
        }
        Expression::Infix {
            left,
            operator: op @ (InfixOperator::And | InfixOperator::Or),
            right,
        } => {
            let l = as_bool(*op, evaluate(left, row, schema)?)?;
            // short-circuit
            if (*op == InfixOperator::And && !l) || (*op == InfixOperator::Or && l) {
                return Ok(Value::Bool(l));
            }
            Ok(Value::Bool(as_bool(*op, evaluate(right, row, schema)?)?))
        }
        Expression::Infix {
            left,
            operator,
            right,
        } => {
            let l = evaluate(left, row, schema)?;
            let r = evaluate(right, row, schema)?;
            binary(*operator, l, r)
        }
        Expression::Call { function, .. } => {
            Err(Error::Execution(format!("unknown function {}", function)))
        }
        Expression::Wildcard => Err(Error::Execution("* cannot be evaluated".into())),
    }
}

fn as_bool(op: InfixOperator, v: Value) -> Result<bool> {
    match v {
        Value::Bool(b) => Ok(b),
        v => Err(Error::Execution(format!(
            "operator {} expects BOOL, got {}",
            op,
            v.datatype()
        ))),
    }
}

fn binary(op: InfixOperator, l: Value, r: Value) -> Result<Value> {
    use InfixOperator::*;
    let mismatch = |l: &Value, r: &Value| {
        Error::Execution(format!(
            "operator {} cannot be applied to {} and {}",
            op,
            l.datatype(),
            r.datatype()
        ))
    };

    match op {
        Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            let ordering = l.partial_cmp(&r).ok_or_else(|| mismatch(&l, &r))?;
            Ok(Value::Bool(match op {
                Equal => ordering == Ordering::Equal,
                NotEqual => ordering != Ordering::Equal,
                LessThan => ordering == Ordering::Less,
                LessThanOrEqual => ordering != Ordering::Greater,
                GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        Add | Subtract | Multiply | Divide => match (&l, &r) {
            (Value::Int(a), Value::Int(b)) => {
                let (a, b) = (*a, *b);
                let result = match op {
                    Add => a.checked_add(b),
                    Subtract => a.checked_sub(b),
                    Multiply => a.checked_mul(b),
                    _ if b == 0 => return Err(Error::Execution("division by zero".into())),
                    _ => a.checked_div(b),
                };
                result
                    .map(Value::Int)
                    .ok_or_else(|| Error::Execution("integer overflow".into()))
            }
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let (a, b) = (as_float(&l), as_float(&r));
                Ok(Value::Float(match op {
                    Add => a + b,
                    Subtract => a - b,
                    Multiply => a * b,
                    _ if b == 0.0 => return Err(Error::Execution("division by zero".into())),
                    _ => a / b,
                }))
            }
            _ => Err(mismatch(&l, &r)),
        },
        And | Or => Err(mismatch(&l, &r)),
    }
}

fn as_float(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

/// Converts a value to `target`.
///
/// FLOAT to INT truncates toward zero; TEXT parses; BOOL and INT convert as
/// 0/1; anything converts to TEXT through its display form.
pub fn cast(value: Value, target: DataType) -> Result<Value> {
    let failed = |v: &Value| {
        Error::Execution(format!("cannot cast {} {} to {}", v.datatype(), v, target))
    };
    Ok(match (target, value) {
        (DataType::Int, Value::Int(i)) => Value::Int(i),
        (DataType::Int, Value::Float(f)) => {
            if !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
                return Err(failed(&Value::Float(f)));
            }
            Value::Int(f.trunc() as i64)
        }
        (DataType::Int, Value::Bool(b)) => Value::Int(b as i64),
        (DataType::Int, Value::Text(s)) => match s.trim().parse::<i64>() {
            Ok(i) => Value::Int(i),
            Err(_) => return Err(failed(&Value::Text(s))),
        },
        (DataType::Float, Value::Int(i)) => Value::Float(i as f64),
        (DataType::Float, Value::Float(f)) => Value::Float(f),
        (DataType::Float, Value::Bool(b)) => Value::Float(if b { 1.0 } else { 0.0 }),
        (DataType::Float, Value::Text(s)) => match s.trim().parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => return Err(failed(&Value::Text(s))),
        },
        (DataType::Bool, Value::Bool(b)) => Value::Bool(b),
        (DataType::Bool, Value::Int(i)) => Value::Bool(i != 0),
        (DataType::Bool, Value::Float(f)) => Value::Bool(f != 0.0),
        (DataType::Bool, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => return Err(failed(&Value::Text(s))),
        },
        (DataType::Text, Value::Text(s)) => Value::Text(s),
        (DataType::Text, v) => Value::Text(v.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::{cast, evaluate, infer_type};
    use crate::{
        error::{Error, Result},
        sql::{
            parser::Parser,
            parser::ast::{Expression, Statement},
            types::{DataColumn, DataRow, DataSchema, DataType, Value},
        },
    };

    fn schema() -> DataSchema {
        DataSchema::new(vec![
            DataColumn::new("a", DataType::Int),
            DataColumn::new("f", DataType::Float),
            DataColumn::new("t", DataType::Text),
            DataColumn::new("b", DataType::Bool),
        ])
    }

    fn row() -> DataRow {
        DataRow::new(vec![
            Value::Int(7),
            Value::Float(0.5),
            Value::Text("hi".into()),
            Value::Bool(true),
        ])
    }

    /// Parses `expr` through a one-column select
    fn expr(text: &str) -> Expression {
        let sql = format!("SELECT {} FROM t;", text);
        let program = Parser::new(&sql).parse().unwrap();
        match program.statements.into_iter().next() {
            Some(Statement::Select { mut columns, .. }) => columns.remove(0),
            other => panic!("unexpected {:?}", other),
        }
    }

    fn eval(text: &str) -> Result<Value> {
        evaluate(&expr(text), &row(), &schema())
    }

    #[test]
    fn test_evaluate_arithmetic() -> Result<()> {
        assert_eq!(eval("a + 1 * 2")?, Value::Int(9));
        assert_eq!(eval("a / 2")?, Value::Int(3));
        assert_eq!(eval("a + f")?, Value::Float(7.5));
        assert_eq!(eval("-a")?, Value::Int(-7));
        assert_eq!(eval("-f * 2")?, Value::Float(-1.0));
        assert!(matches!(eval("a / 0"), Err(Error::Execution(_))));
        assert!(matches!(eval("f / 0"), Err(Error::Execution(_))));
        assert!(eval("9223372036854775807 + a").is_err());
        Ok(())
    }

    #[test]
    fn test_evaluate_logic_and_comparison() -> Result<()> {
        assert_eq!(eval("a > 5 AND b")?, Value::Bool(true));
        assert_eq!(eval("a = 7.0")?, Value::Bool(true));
        assert_eq!(eval("t != \"hi\" OR NOT b")?, Value::Bool(false));
        assert_eq!(eval("a <= 6 OR f >= 0.5")?, Value::Bool(true));
        // right side is never reached
        assert_eq!(eval("false AND 1 / 0 = 1")?, Value::Bool(false));
        assert!(eval("t = 1").is_err());
        assert!(eval("a AND b").is_err());
        Ok(())
    }

    #[test]
    fn test_evaluate_errors() {
        assert!(matches!(eval("missing"), Err(Error::NotFound(_))));
        assert!(matches!(eval("null"), Err(Error::Execution(_))));
        assert!(matches!(eval("f(a)"), Err(Error::Execution(_))));
    }

    #[test]
    fn test_cast() -> Result<()> {
        assert_eq!(eval("CAST(f AS INT)")?, Value::Int(0));
        assert_eq!(eval("CAST(a AS TEXT)")?, Value::Text("7".into()));
        assert_eq!(eval("CAST(\" 42 \" AS INT)")?, Value::Int(42));
        assert_eq!(eval("CAST(b AS TEXT)")?, Value::Text("TRUE".into()));
        assert_eq!(cast(Value::Text("FALSE".into()), DataType::Bool)?, Value::Bool(false));
        assert_eq!(cast(Value::Float(-2.9), DataType::Int)?, Value::Int(-2));
        assert!(cast(Value::Text("x".into()), DataType::Float).is_err());
        assert!(cast(Value::Float(f64::NAN), DataType::Int).is_err());
        Ok(())
    }

    #[test]
    fn test_infer_type() -> Result<()> {
        let schema = schema();
        let infer = |text: &str| infer_type(&expr(text), &schema);
        assert_eq!(infer("a * 2")?, DataType::Int);
        assert_eq!(infer("a * 2.0")?, DataType::Float);
        assert_eq!(infer("a > f AND b")?, DataType::Bool);
        assert_eq!(infer("t = \"x\"")?, DataType::Bool);
        assert_eq!(infer("CAST(t AS FLOAT)")?, DataType::Float);
        assert!(matches!(infer("t + 1"), Err(Error::Plan(_))));
        assert!(matches!(infer("-t"), Err(Error::Plan(_))));
        assert!(matches!(infer("NOT a"), Err(Error::Plan(_))));
        assert!(matches!(infer("f(a)"), Err(Error::Plan(_))));
        assert!(matches!(infer("nope"), Err(Error::NotFound(_))));
        Ok(())
    }
}
