use std::fmt::Display;

/// Token type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Illegal,
    Eof,

    // Operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Bang,
    Eq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    /// `!=` or `<>`
    NotEq,

    // Delimiters
    Comma,
    Semicolon,
    Dot,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Symbols
    At,
    Pound,
    Question,
    Ampersand,

    // Identifiers and literals
    Int,
    Float,
    String,
    Ident,

    // Keywords
    True,
    False,
    Null,
    And,
    Or,
    Not,
    If,
    Exists,
    Primary,
    Key,
    Unique,
    Create,
    Drop,
    Schema,
    Table,
    Index,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    Group,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Offset,
    As,
    Cast,
    Update,
    Delete,
    IntType,
    FloatType,
    BoolType,
    TextType,
}

impl TokenType {
    /// Looks up an identifier in the keyword table.
    ///
    /// Matching is exact: a keyword is recognized in its all-lowercase or
    /// all-uppercase spelling only, mixed case stays an identifier.
    pub fn lookup_ident(ident: &str) -> TokenType {
        let keyword = if !ident.bytes().any(|c| c.is_ascii_uppercase()) {
            ident.to_string()
        } else if !ident.bytes().any(|c| c.is_ascii_lowercase()) {
            ident.to_ascii_lowercase()
        } else {
            return TokenType::Ident;
        };
        match keyword.as_str() {
            "true" => TokenType::True,
            "false" => TokenType::False,
            "null" => TokenType::Null,
            "and" => TokenType::And,
            "or" => TokenType::Or,
            "not" => TokenType::Not,
            "if" => TokenType::If,
            "exists" => TokenType::Exists,
            "primary" => TokenType::Primary,
            "key" => TokenType::Key,
            "unique" => TokenType::Unique,
            "create" => TokenType::Create,
            "drop" => TokenType::Drop,
            "schema" => TokenType::Schema,
            "table" => TokenType::Table,
            "index" => TokenType::Index,
            "insert" => TokenType::Insert,
            "into" => TokenType::Into,
            "values" => TokenType::Values,
            "select" => TokenType::Select,
            "from" => TokenType::From,
            "where" => TokenType::Where,
            "group" => TokenType::Group,
            "order" => TokenType::Order,
            "by" => TokenType::By,
            "asc" => TokenType::Asc,
            "desc" => TokenType::Desc,
            "limit" => TokenType::Limit,
            "offset" => TokenType::Offset,
            "as" => TokenType::As,
            "cast" => TokenType::Cast,
            "update" => TokenType::Update,
            "delete" => TokenType::Delete,
            "int" => TokenType::IntType,
            "float" => TokenType::FloatType,
            "bool" => TokenType::BoolType,
            "text" => TokenType::TextType,
            _ => TokenType::Ident,
        }
    }

    /// Classifies a numeric literal by the presence of a decimal point
    pub fn lookup_number(literal: &str) -> TokenType {
        if literal.contains('.') {
            TokenType::Float
        } else {
            TokenType::Int
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            TokenType::Illegal => "ILLEGAL",
            TokenType::Eof => "EOF",
            TokenType::Plus => "+",
            TokenType::Minus => "-",
            TokenType::Asterisk => "*",
            TokenType::Slash => "/",
            TokenType::Bang => "!",
            TokenType::Eq => "=",
            TokenType::Lt => "<",
            TokenType::Gt => ">",
            TokenType::LtEq => "<=",
            TokenType::GtEq => ">=",
            TokenType::NotEq => "!=",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::Dot => ".",
            TokenType::Colon => ":",
            TokenType::LParen => "(",
            TokenType::RParen => ")",
            TokenType::LBrace => "{",
            TokenType::RBrace => "}",
            TokenType::LBracket => "[",
            TokenType::RBracket => "]",
            TokenType::At => "@",
            TokenType::Pound => "#",
            TokenType::Question => "?",
            TokenType::Ampersand => "&",
            TokenType::Int => "INT",
            TokenType::Float => "FLOAT",
            TokenType::String => "STRING",
            TokenType::Ident => "IDENT",
            TokenType::True => "TRUE",
            TokenType::False => "FALSE",
            TokenType::Null => "NULL",
            TokenType::And => "AND",
            TokenType::Or => "OR",
            TokenType::Not => "NOT",
            TokenType::If => "IF",
            TokenType::Exists => "EXISTS",
            TokenType::Primary => "PRIMARY",
            TokenType::Key => "KEY",
            TokenType::Unique => "UNIQUE",
            TokenType::Create => "CREATE",
            TokenType::Drop => "DROP",
            TokenType::Schema => "SCHEMA",
            TokenType::Table => "TABLE",
            TokenType::Index => "INDEX",
            TokenType::Insert => "INSERT",
            TokenType::Into => "INTO",
            TokenType::Values => "VALUES",
            TokenType::Select => "SELECT",
            TokenType::From => "FROM",
            TokenType::Where => "WHERE",
            TokenType::Group => "GROUP",
            TokenType::Order => "ORDER",
            TokenType::By => "BY",
            TokenType::Asc => "ASC",
            TokenType::Desc => "DESC",
            TokenType::Limit => "LIMIT",
            TokenType::Offset => "OFFSET",
            TokenType::As => "AS",
            TokenType::Cast => "CAST",
            TokenType::Update => "UPDATE",
            TokenType::Delete => "DELETE",
            TokenType::IntType => "INT_TYPE",
            TokenType::FloatType => "FLOAT_TYPE",
            TokenType::BoolType => "BOOL_TYPE",
            TokenType::TextType => "TEXT_TYPE",
        }
    }
}

impl Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A lexed token: its type tag plus the exact matched text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenType,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenType, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }

    pub fn eof() -> Self {
        Self::new(TokenType::Eof, "")
    }
}

#[cfg(test)]
mod tests {
    use super::TokenType;

    #[test]
    fn test_lookup_ident() {
        assert_eq!(TokenType::lookup_ident("create"), TokenType::Create);
        assert_eq!(TokenType::lookup_ident("CREATE"), TokenType::Create);
        assert_eq!(TokenType::lookup_ident("Create"), TokenType::Ident);
        assert_eq!(TokenType::lookup_ident("int"), TokenType::IntType);
        assert_eq!(TokenType::lookup_ident("creates"), TokenType::Ident);
        assert_eq!(TokenType::lookup_ident("_x"), TokenType::Ident);
    }

    #[test]
    fn test_lookup_number() {
        assert_eq!(TokenType::lookup_number("42"), TokenType::Int);
        assert_eq!(TokenType::lookup_number("4.2"), TokenType::Float);
        assert_eq!(TokenType::lookup_number("4."), TokenType::Float);
    }
}
