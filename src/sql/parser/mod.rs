use std::mem;

use crate::error::{Error, Result};
use crate::sql::parser::{
    ast::{ColumnDef, Constraint, Expression, Program, Statement, TableName},
    expr::Precedence,
    lexer::Lexer,
    token::{Token, TokenType},
};
use crate::sql::types::DataType;

pub mod ast;
mod expr;
pub mod lexer;
pub mod token;

/// SQL Parser - Converts tokens into Abstract Syntax Tree (AST)
///
/// Errors are collected rather than returned: a statement that fails midway
/// is dropped, the parser skips past the next `;`, and parsing resumes with
/// the following statement. Statement parsers finish with `current` on the
/// terminating semicolon.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    errors: Vec<String>,
    current: Token,
    peek: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given SQL input
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            errors: Vec::new(),
            current,
            peek,
        }
    }

    /// Errors accumulated so far, in the order they were hit
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Parses every statement in the input. The returned program may hold
    /// fewer statements than the input when errors occurred; check `errors`.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.current_is(TokenType::Eof) {
            match self.parse_statement() {
                Some(stmt) => program.statements.push(stmt),
                None => self.synchronize(),
            }
            self.next_token();
        }
        program
    }

    /// Parses the input, failing if any error was recorded
    pub fn parse(&mut self) -> Result<Program> {
        let program = self.parse_program();
        if !self.errors.is_empty() {
            return Err(Error::Parse(self.errors.join("\n")));
        }
        Ok(program)
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenType::Create => self.parse_create(),
            TokenType::Drop => self.parse_drop(),
            TokenType::Insert => self.parse_insert(),
            TokenType::Select => self.parse_select(),
            _ => {
                let msg = format!("unknown statement: {}", describe(&self.current));
                self.errors.push(msg);
                None
            }
        }
    }

    fn parse_create(&mut self) -> Option<Statement> {
        self.next_token();
        match self.current.kind {
            TokenType::Schema => self.parse_create_schema(),
            TokenType::Table => self.parse_create_table(),
            TokenType::Index => self.unsupported("CREATE INDEX"),
            _ => {
                let msg = format!(
                    "expected SCHEMA, TABLE or INDEX after CREATE, got {} instead",
                    describe(&self.current)
                );
                self.errors.push(msg);
                None
            }
        }
    }

    fn parse_drop(&mut self) -> Option<Statement> {
        self.next_token();
        match self.current.kind {
            TokenType::Schema => {
                self.next_token();
                let name = self.expect_ident()?;
                self.expect_terminator()?;
                Some(Statement::DropSchema { name })
            }
            TokenType::Table => {
                self.next_token();
                let name = self.parse_table_name()?;
                self.expect_terminator()?;
                Some(Statement::DropTable { name })
            }
            TokenType::Index => self.unsupported("DROP INDEX"),
            _ => {
                let msg = format!(
                    "expected SCHEMA, TABLE or INDEX after DROP, got {} instead",
                    describe(&self.current)
                );
                self.errors.push(msg);
                None
            }
        }
    }

    /// CREATE SCHEMA [IF NOT EXISTS] name;
    fn parse_create_schema(&mut self) -> Option<Statement> {
        self.next_token();
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.expect_ident()?;
        self.expect_terminator()?;
        Some(Statement::CreateSchema {
            name,
            if_not_exists,
        })
    }

    /// CREATE TABLE [IF NOT EXISTS] name (column_def [, ...] [, PRIMARY KEY (a, ...)]);
    fn parse_create_table(&mut self) -> Option<Statement> {
        self.next_token();
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_table_name()?;
        self.expect(TokenType::LParen)?;

        let mut columns = Vec::new();
        let mut primary_keys = Vec::new();
        loop {
            if self.current_is(TokenType::Primary) {
                self.next_token();
                self.expect(TokenType::Key)?;
                self.expect(TokenType::LParen)?;
                primary_keys.extend(self.parse_ident_list()?);
                self.expect(TokenType::RParen)?;
            } else {
                columns.push(self.parse_column_def()?);
            }

            match self.current.kind {
                TokenType::Comma => self.next_token(),
                TokenType::RParen => break,
                _ => {
                    let msg = format!(
                        "expected , or ) in column list, got {} instead",
                        describe(&self.current)
                    );
                    self.errors.push(msg);
                    return None;
                }
            }
        }
        self.next_token();
        self.expect_terminator()?;

        Some(Statement::CreateTable {
            name,
            columns,
            if_not_exists,
            primary_keys,
        })
    }

    /// name type [PRIMARY KEY | NOT NULL | UNIQUE]*
    fn parse_column_def(&mut self) -> Option<ColumnDef> {
        let name = self.expect_ident()?;
        let data_type = self.data_type(Some(&name))?;
        self.next_token();

        let mut constraint = Constraint::default();
        while !self.current_is(TokenType::Comma) && !self.current_is(TokenType::RParen) {
            let mut matched = false;
            while self.current_is(TokenType::Primary) {
                self.next_token();
                self.expect(TokenType::Key)?;
                constraint.primary_key = true;
                matched = true;
            }
            while self.current_is(TokenType::Not) {
                self.next_token();
                self.expect(TokenType::Null)?;
                constraint.not_null = true;
                matched = true;
            }
            while self.current_is(TokenType::Unique) {
                self.next_token();
                constraint.unique = true;
                matched = true;
            }
            if !matched {
                let msg = format!(
                    "unexpected {} in definition of column {}",
                    describe(&self.current),
                    name
                );
                self.errors.push(msg);
                return None;
            }
        }

        Some(ColumnDef {
            name,
            data_type,
            constraint,
        })
    }

    /// INSERT INTO table [(a, b)] VALUES (expr, ...) [, (expr, ...)]*;
    fn parse_insert(&mut self) -> Option<Statement> {
        self.next_token();
        self.expect(TokenType::Into)?;
        let table = self.parse_table_name()?;

        let mut columns = Vec::new();
        if self.current_is(TokenType::LParen) {
            self.next_token();
            columns = self.parse_ident_list()?;
            self.expect(TokenType::RParen)?;
        }

        self.expect(TokenType::Values)?;
        let mut rows = Vec::new();
        loop {
            self.expect(TokenType::LParen)?;
            let mut row = Vec::new();
            while !self.current_is(TokenType::RParen) {
                row.push(self.parse_expression_and_advance()?);
                if !self.current_is(TokenType::Comma) {
                    break;
                }
                self.next_token();
            }
            self.expect(TokenType::RParen)?;
            rows.push(row);

            if !self.current_is(TokenType::Comma) {
                break;
            }
            self.next_token();
        }
        self.expect_terminator()?;

        Some(Statement::Insert {
            table,
            columns,
            rows,
        })
    }

    /// SELECT items FROM table [WHERE expr] [GROUP BY exprs] [ORDER BY sorts]
    /// [LIMIT n] [OFFSET n];
    fn parse_select(&mut self) -> Option<Statement> {
        self.next_token();
        let mut columns = vec![self.parse_select_item()?];
        while self.current_is(TokenType::Comma) {
            self.next_token();
            columns.push(self.parse_select_item()?);
        }

        self.expect(TokenType::From)?;
        let from = self.parse_table_name()?;

        let mut where_clause = None;
        if self.current_is(TokenType::Where) {
            self.next_token();
            where_clause = Some(self.parse_expression_and_advance()?);
        }

        let mut group_by = Vec::new();
        if self.current_is(TokenType::Group) {
            self.next_token();
            self.expect(TokenType::By)?;
            loop {
                group_by.push(self.parse_expression_and_advance()?);
                if !self.current_is(TokenType::Comma) {
                    break;
                }
                self.next_token();
            }
        }

        let mut order_by = Vec::new();
        if self.current_is(TokenType::Order) {
            self.next_token();
            self.expect(TokenType::By)?;
            loop {
                let expr = self.parse_expression_and_advance()?;
                let ascending = match self.current.kind {
                    TokenType::Asc => {
                        self.next_token();
                        true
                    }
                    TokenType::Desc => {
                        self.next_token();
                        false
                    }
                    _ => true,
                };
                order_by.push(Expression::Sort {
                    expr: Box::new(expr),
                    ascending,
                });
                if !self.current_is(TokenType::Comma) {
                    break;
                }
                self.next_token();
            }
        }

        let mut limit = None;
        if self.current_is(TokenType::Limit) {
            self.next_token();
            limit = Some(self.parse_count()?);
        }
        let mut offset = None;
        if self.current_is(TokenType::Offset) {
            self.next_token();
            offset = Some(self.parse_count()?);
        }
        self.expect_terminator()?;

        Some(Statement::Select {
            columns,
            from,
            where_clause,
            group_by,
            order_by,
            limit,
            offset,
        })
    }

    /// `*` or `expr [AS alias]`
    fn parse_select_item(&mut self) -> Option<Expression> {
        if self.current_is(TokenType::Asterisk) {
            self.next_token();
            return Some(Expression::Wildcard);
        }
        let expr = self.parse_expression_and_advance()?;
        if self.current_is(TokenType::As) {
            self.next_token();
            let alias = self.expect_ident()?;
            return Some(Expression::Alias {
                alias,
                expr: Box::new(expr),
            });
        }
        Some(expr)
    }

    /// Non-negative integer operand of LIMIT / OFFSET
    fn parse_count(&mut self) -> Option<u64> {
        if !self.current_is(TokenType::Int) {
            self.current_error(TokenType::Int);
            return None;
        }
        match self.current.literal.parse::<u64>() {
            Ok(n) => {
                self.next_token();
                Some(n)
            }
            Err(err) => {
                let msg = format!("invalid count {}: {}", self.current.literal, err);
                self.errors.push(msg);
                None
            }
        }
    }

    /// [IF NOT EXISTS], all three tokens or none
    fn parse_if_not_exists(&mut self) -> Option<bool> {
        if !self.current_is(TokenType::If) {
            return Some(false);
        }
        self.next_token();
        self.expect(TokenType::Not)?;
        self.expect(TokenType::Exists)?;
        Some(true)
    }

    /// name or schema.name
    fn parse_table_name(&mut self) -> Option<TableName> {
        let first = self.expect_ident()?;
        if self.current_is(TokenType::Dot) {
            self.next_token();
            let name = self.expect_ident()?;
            return Some(TableName::new(Some(first), name));
        }
        Some(TableName::new(None, first))
    }

    fn parse_ident_list(&mut self) -> Option<Vec<String>> {
        let mut idents = vec![self.expect_ident()?];
        while self.current_is(TokenType::Comma) {
            self.next_token();
            idents.push(self.expect_ident()?);
        }
        Some(idents)
    }

    /// Runs the expression parser and steps past the expression's last token
    fn parse_expression_and_advance(&mut self) -> Option<Expression> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.next_token();
        Some(expr)
    }

    /// Maps the current type keyword to a data type without consuming it
    fn data_type(&mut self, column: Option<&str>) -> Option<DataType> {
        let data_type = match self.current.kind {
            TokenType::IntType => DataType::Int,
            TokenType::FloatType => DataType::Float,
            TokenType::BoolType => DataType::Bool,
            TokenType::TextType => DataType::Text,
            _ => {
                let found = describe(&self.current);
                let msg = match column {
                    Some(column) => format!(
                        "expected data type for column {}, got {} instead",
                        column, found
                    ),
                    None => format!("expected data type, got {} instead", found),
                };
                self.errors.push(msg);
                return None;
            }
        };
        Some(data_type)
    }

    fn unsupported(&mut self, what: &str) -> Option<Statement> {
        self.errors.push(format!("{} is not supported", what));
        None
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.current = mem::replace(&mut self.peek, next);
    }

    fn current_is(&self, kind: TokenType) -> bool {
        self.current.kind == kind
    }

    fn peek_is(&self, kind: TokenType) -> bool {
        self.peek.kind == kind
    }

    /// Consumes the current token if it has the given type
    fn expect(&mut self, kind: TokenType) -> Option<Token> {
        if !self.current_is(kind) {
            self.current_error(kind);
            return None;
        }
        let next = self.lexer.next_token();
        let token = mem::replace(&mut self.current, mem::replace(&mut self.peek, next));
        Some(token)
    }

    fn expect_ident(&mut self) -> Option<String> {
        self.expect(TokenType::Ident).map(|t| t.literal)
    }

    /// Advances onto the peeked token if it has the given type
    fn expect_peek(&mut self, kind: TokenType) -> Option<()> {
        if !self.peek_is(kind) {
            let msg = format!(
                "expected next token to be {}, got {} instead",
                kind,
                describe(&self.peek)
            );
            self.errors.push(msg);
            return None;
        }
        self.next_token();
        Some(())
    }

    /// Checks, without consuming, that the statement ends here
    fn expect_terminator(&mut self) -> Option<()> {
        if !self.current_is(TokenType::Semicolon) {
            self.current_error(TokenType::Semicolon);
            return None;
        }
        Some(())
    }

    fn current_error(&mut self, kind: TokenType) {
        let msg = format!(
            "expected token to be {}, got {} instead",
            kind,
            describe(&self.current)
        );
        self.errors.push(msg);
    }

    /// Skips to the end of a failed statement
    fn synchronize(&mut self) {
        while !self.current_is(TokenType::Semicolon) && !self.current_is(TokenType::Eof) {
            self.next_token();
        }
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenType::Illegal => format!("ILLEGAL {:?}", token.literal),
        TokenType::Ident | TokenType::Int | TokenType::Float | TokenType::String => {
            format!("{} {:?}", token.kind, token.literal)
        }
        kind => kind.to_string(),
    }
}
