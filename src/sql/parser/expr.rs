//! Expression parser module
//!
//! Precedence climbing over the token stream. Each token type has at most one
//! prefix behaviour and at most one infix behaviour; `parse_expression` keeps
//! extending the left operand while the next operator binds tighter than the
//! caller's precedence.
//!
//! Unlike the statement parser, expression parsers leave `current` on the
//! last token of the expression they consumed.

use crate::sql::parser::{
    Parser,
    ast::{Expression, InfixOperator, PrefixOperator},
    token::TokenType,
};

/// Operator binding power, low to high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// AND, OR
    AndOr,
    /// =, !=, <, <=, >, >=
    Comparison,
    /// +, -
    Sum,
    /// *, /
    Product,
    /// -x, !x, NOT x
    Prefix,
    /// f(x)
    Call,
    /// a[i]
    Index,
}

impl Precedence {
    /// Binding power of a token in infix position
    pub fn of(kind: TokenType) -> Precedence {
        match kind {
            TokenType::And | TokenType::Or => Precedence::AndOr,
            TokenType::Eq
            | TokenType::NotEq
            | TokenType::Lt
            | TokenType::LtEq
            | TokenType::Gt
            | TokenType::GtEq => Precedence::Comparison,
            TokenType::Plus | TokenType::Minus => Precedence::Sum,
            TokenType::Asterisk | TokenType::Slash => Precedence::Product,
            TokenType::LParen => Precedence::Call,
            TokenType::LBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

fn infix_operator(kind: TokenType) -> Option<InfixOperator> {
    Some(match kind {
        TokenType::Plus => InfixOperator::Add,
        TokenType::Minus => InfixOperator::Subtract,
        TokenType::Asterisk => InfixOperator::Multiply,
        TokenType::Slash => InfixOperator::Divide,
        TokenType::Eq => InfixOperator::Equal,
        TokenType::NotEq => InfixOperator::NotEqual,
        TokenType::Lt => InfixOperator::LessThan,
        TokenType::LtEq => InfixOperator::LessThanOrEqual,
        TokenType::Gt => InfixOperator::GreaterThan,
        TokenType::GtEq => InfixOperator::GreaterThanOrEqual,
        TokenType::And => InfixOperator::And,
        TokenType::Or => InfixOperator::Or,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left = match self.current.kind {
            TokenType::Ident => Some(Expression::Identifier(self.current.literal.clone())),
            TokenType::Int
            | TokenType::Float
            | TokenType::String
            | TokenType::Null
            | TokenType::True
            | TokenType::False => self.parse_literal(),
            TokenType::Minus | TokenType::Bang | TokenType::Not => self.parse_prefix(),
            TokenType::LParen => self.parse_grouped(),
            TokenType::Cast => self.parse_cast(),
            kind => {
                self.errors
                    .push(format!("no prefix parse function for {} found", kind));
                None
            }
        }?;

        while !self.peek_is(TokenType::Semicolon) && precedence < Precedence::of(self.peek.kind) {
            left = if let Some(operator) = infix_operator(self.peek.kind) {
                self.next_token();
                self.parse_infix(left, operator)?
            } else if self.peek_is(TokenType::LParen) {
                self.next_token();
                self.parse_call(left)?
            } else {
                return Some(left);
            };
        }
        Some(left)
    }

    fn parse_literal(&mut self) -> Option<Expression> {
        let literal = &self.current.literal;
        Some(match self.current.kind {
            TokenType::Int => match literal.parse::<i64>() {
                Ok(v) => Expression::IntegerLiteral(v),
                Err(err) => {
                    self.errors
                        .push(format!("could not parse integer literal {}: {}", literal, err));
                    return None;
                }
            },
            TokenType::Float => match literal.parse::<f64>() {
                Ok(v) => Expression::FloatLiteral(v),
                Err(err) => {
                    self.errors
                        .push(format!("could not parse float literal {}: {}", literal, err));
                    return None;
                }
            },
            TokenType::String => Expression::StringLiteral(literal.clone()),
            TokenType::True => Expression::BooleanLiteral(true),
            TokenType::False => Expression::BooleanLiteral(false),
            _ => Expression::NullLiteral,
        })
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let operator = match self.current.kind {
            TokenType::Minus => PrefixOperator::Minus,
            _ => PrefixOperator::Not,
        };
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped(&mut self) -> Option<Expression> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RParen)?;
        Some(expr)
    }

    /// CAST ( expr AS type )
    fn parse_cast(&mut self) -> Option<Expression> {
        self.expect_peek(TokenType::LParen)?;
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::As)?;
        self.next_token();
        let data_type = self.data_type(None)?;
        self.expect_peek(TokenType::RParen)?;
        Some(Expression::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    fn parse_infix(&mut self, left: Expression, operator: InfixOperator) -> Option<Expression> {
        let precedence = Precedence::of(self.current.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_call(&mut self, function: Expression) -> Option<Expression> {
        let args = self.parse_expression_list(TokenType::RParen)?;
        Some(Expression::Call {
            function: Box::new(function),
            args,
        })
    }

    /// Comma-separated expressions up to `stop`; `current` is the opening token
    fn parse_expression_list(&mut self, stop: TokenType) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_is(stop) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(stop)?;
        Some(list)
    }
}

#[cfg(test)]
mod tests {
    use super::Precedence;
    use crate::sql::parser::{
        Parser,
        ast::{Expression, InfixOperator, PrefixOperator},
        token::TokenType,
    };

    fn parse(input: &str) -> Expression {
        let mut parser = Parser::new(input);
        let expr = parser.parse_expression(Precedence::Lowest);
        assert!(parser.errors().is_empty(), "{:?}", parser.errors());
        expr.unwrap()
    }

    #[test]
    fn test_precedence_order() {
        assert!(Precedence::Lowest < Precedence::AndOr);
        assert!(Precedence::AndOr < Precedence::Comparison);
        assert!(Precedence::Product < Precedence::Prefix);
        assert_eq!(Precedence::of(TokenType::Slash), Precedence::Product);
        assert_eq!(Precedence::of(TokenType::Ident), Precedence::Lowest);
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let expr = parse("1 + 2 * 3");
        assert_eq!(expr.to_string(), "(1 + (2 * 3))");
        assert_eq!(
            expr,
            Expression::Infix {
                left: Box::new(Expression::IntegerLiteral(1)),
                operator: InfixOperator::Add,
                right: Box::new(Expression::Infix {
                    left: Box::new(Expression::IntegerLiteral(2)),
                    operator: InfixOperator::Multiply,
                    right: Box::new(Expression::IntegerLiteral(3)),
                }),
            }
        );
    }

    #[test]
    fn test_operator_precedence_rendering() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!x", "(!x)"),
            ("NOT x", "(!x)"),
            ("a + b + c", "((a + b) + c)"),
            ("a - b * c / d", "(a - ((b * c) / d))"),
            ("a + b <= c * d", "((a + b) <= (c * d))"),
            ("a = 1 and b <> 2 or c", "(((a = 1) AND (b != 2)) OR c)"),
            ("(a + b) * c", "((a + b) * c)"),
            ("-(1 + 2)", "(-(1 + 2))"),
            ("f(a, b + 1, g())", "f(a, (b + 1), g())"),
            ("a * f(b)", "(a * f(b))"),
            (r#""x" != 1.5"#, r#"("x" != 1.500000)"#),
            ("cast(a as float) / 2", "(CAST(a AS FLOAT) / 2)"),
            ("true = null", "(true = NULL)"),
        ];
        for (input, expected) in cases {
            assert_eq!(parse(input).to_string(), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_prefix_operator_kind() {
        assert_eq!(
            parse("-5"),
            Expression::Prefix {
                operator: PrefixOperator::Minus,
                right: Box::new(Expression::IntegerLiteral(5)),
            }
        );
    }

    #[test]
    fn test_expression_errors() {
        let mut parser = Parser::new(")");
        assert!(parser.parse_expression(Precedence::Lowest).is_none());
        assert_eq!(parser.errors(), ["no prefix parse function for ) found"]);

        let mut parser = Parser::new("(1 + 2");
        assert!(parser.parse_expression(Precedence::Lowest).is_none());
        assert_eq!(parser.errors().len(), 1);

        let mut parser = Parser::new("99999999999999999999");
        assert!(parser.parse_expression(Precedence::Lowest).is_none());
        assert!(parser.errors()[0].starts_with("could not parse integer literal"));
    }
}
