//! SQL Lexer - Tokenizes SQL input text into a stream of tokens

use crate::sql::parser::token::{Token, TokenType};

/// SQL lexical analyzer over a byte cursor.
///
/// Tokens are produced lazily, one per `next_token` call, with a single
/// character of lookahead. Unknown characters become ILLEGAL tokens rather
/// than errors; the parser reports them.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

/// Yields tokens until (not including) EOF
impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        (token.kind != TokenType::Eof).then_some(token)
    }
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given SQL text
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Scans and returns the next token. Repeats EOF once input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let Some(c) = self.ch() else {
            return Token::eof();
        };

        match c {
            b'+' => self.single(TokenType::Plus),
            b'-' => self.single(TokenType::Minus),
            b'*' => self.single(TokenType::Asterisk),
            b'/' => self.single(TokenType::Slash),
            b'!' => self.pair(&[(b'=', TokenType::NotEq)], TokenType::Bang),
            b'=' => self.single(TokenType::Eq),
            b'<' => self.pair(
                &[(b'=', TokenType::LtEq), (b'>', TokenType::NotEq)],
                TokenType::Lt,
            ),
            b'>' => self.pair(&[(b'=', TokenType::GtEq)], TokenType::Gt),
            b',' => self.single(TokenType::Comma),
            b';' => self.single(TokenType::Semicolon),
            b'.' => self.single(TokenType::Dot),
            b':' => self.single(TokenType::Colon),
            b'(' => self.single(TokenType::LParen),
            b')' => self.single(TokenType::RParen),
            b'{' => self.single(TokenType::LBrace),
            b'}' => self.single(TokenType::RBrace),
            b'[' => self.single(TokenType::LBracket),
            b']' => self.single(TokenType::RBracket),
            b'@' => self.single(TokenType::At),
            b'#' => self.single(TokenType::Pound),
            b'?' => self.single(TokenType::Question),
            b'&' => self.single(TokenType::Ampersand),
            b'"' => self.scan_string(),
            c if is_letter(c) => self.scan_ident(),
            c if c.is_ascii_digit() => self.scan_number(),
            _ => self.scan_illegal(),
        }
    }

    fn ch(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos + 1).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    /// Consumes `len` bytes as a token of the given type
    fn take(&mut self, kind: TokenType, len: usize) -> Token {
        let start = self.pos;
        self.pos += len;
        Token::new(kind, &self.input[start..self.pos])
    }

    fn single(&mut self, kind: TokenType) -> Token {
        self.take(kind, 1)
    }

    /// Emits a two-character operator if the peeked character completes one,
    /// otherwise the seed character's own token
    fn pair(&mut self, seconds: &[(u8, TokenType)], fallback: TokenType) -> Token {
        let next = self.peek_char();
        match seconds.iter().find(|(c, _)| Some(*c) == next) {
            Some((_, kind)) => self.take(*kind, 2),
            None => self.single(fallback),
        }
    }

    /// Scans a double-quoted string. No escapes; an unterminated string runs
    /// to the end of input.
    fn scan_string(&mut self) -> Token {
        self.pos += 1;
        let start = self.pos;
        while !matches!(self.ch(), Some(b'"') | None) {
            self.pos += 1;
        }
        let token = Token::new(TokenType::String, &self.input[start..self.pos]);
        if self.ch().is_some() {
            self.pos += 1;
        }
        token
    }

    fn scan_ident(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.ch(), Some(c) if is_letter(c) || c.is_ascii_digit()) {
            self.pos += 1;
        }
        let literal = &self.input[start..self.pos];
        Token::new(TokenType::lookup_ident(literal), literal)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        self.skip_digits();
        if self.ch() == Some(b'.') {
            self.pos += 1;
            self.skip_digits();
        }
        let literal = &self.input[start..self.pos];
        Token::new(TokenType::lookup_number(literal), literal)
    }

    fn skip_digits(&mut self) {
        while matches!(self.ch(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    /// Consumes one whole (possibly multi-byte) character as ILLEGAL
    fn scan_illegal(&mut self) -> Token {
        let len = self.input[self.pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.take(TokenType::Illegal, len)
    }
}

fn is_letter(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

#[cfg(test)]
mod tests {
    use super::Lexer;
    use crate::sql::parser::token::{Token, TokenType};

    fn kinds(input: &str) -> Vec<(TokenType, String)> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenType::Eof;
            tokens.push((token.kind, token.literal));
            if done {
                return tokens;
            }
        }
    }

    #[test]
    fn test_lexer_symbols() {
        let expected = [
            (TokenType::Eq, "="),
            (TokenType::Plus, "+"),
            (TokenType::Minus, "-"),
            (TokenType::Asterisk, "*"),
            (TokenType::Slash, "/"),
            (TokenType::Bang, "!"),
            (TokenType::Lt, "<"),
            (TokenType::Gt, ">"),
            (TokenType::LParen, "("),
            (TokenType::RParen, ")"),
            (TokenType::LBrace, "{"),
            (TokenType::RBrace, "}"),
            (TokenType::LBracket, "["),
            (TokenType::RBracket, "]"),
            (TokenType::Comma, ","),
            (TokenType::Dot, "."),
            (TokenType::Semicolon, ";"),
            (TokenType::Colon, ":"),
            (TokenType::At, "@"),
            (TokenType::Pound, "#"),
            (TokenType::Question, "?"),
            (TokenType::Ampersand, "&"),
            (TokenType::Eof, ""),
        ];
        let tokens = kinds("=+-*/!< > (){}[],.;:@#?&");
        assert_eq!(
            tokens,
            expected
                .iter()
                .map(|(k, l)| (*k, l.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_lexer_comparison_operators() {
        assert_eq!(
            kinds("<= >= != <>"),
            vec![
                (TokenType::LtEq, "<=".to_string()),
                (TokenType::GtEq, ">=".to_string()),
                (TokenType::NotEq, "!=".to_string()),
                (TokenType::NotEq, "<>".to_string()),
                (TokenType::Eof, "".to_string()),
            ]
        );
    }

    #[test]
    fn test_lexer_identifiers_and_keywords() {
        let tokens = Lexer::new("foo bar_baz myVariable _underscore ABC123 create TABLE Schema")
            .collect::<Vec<_>>();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenType::Ident, "foo"),
                Token::new(TokenType::Ident, "bar_baz"),
                Token::new(TokenType::Ident, "myVariable"),
                Token::new(TokenType::Ident, "_underscore"),
                Token::new(TokenType::Ident, "ABC123"),
                Token::new(TokenType::Create, "create"),
                Token::new(TokenType::Table, "TABLE"),
                Token::new(TokenType::Ident, "Schema"),
            ]
        );
    }

    #[test]
    fn test_lexer_numbers() {
        assert_eq!(
            kinds("123 45.67 8. 0"),
            vec![
                (TokenType::Int, "123".to_string()),
                (TokenType::Float, "45.67".to_string()),
                (TokenType::Float, "8.".to_string()),
                (TokenType::Int, "0".to_string()),
                (TokenType::Eof, "".to_string()),
            ]
        );
    }

    #[test]
    fn test_lexer_strings() {
        assert_eq!(
            kinds(r#""hello world" "" "no escape \n""#),
            vec![
                (TokenType::String, "hello world".to_string()),
                (TokenType::String, "".to_string()),
                (TokenType::String, "no escape \\n".to_string()),
                (TokenType::Eof, "".to_string()),
            ]
        );

        // unterminated strings read to end of input
        assert_eq!(
            kinds(r#"x "abc"#),
            vec![
                (TokenType::Ident, "x".to_string()),
                (TokenType::String, "abc".to_string()),
                (TokenType::Eof, "".to_string()),
            ]
        );
    }

    #[test]
    fn test_lexer_illegal_and_eof() {
        let mut lexer = Lexer::new(" $ é\t\r\n");
        assert_eq!(lexer.next_token(), Token::new(TokenType::Illegal, "$"));
        assert_eq!(lexer.next_token(), Token::new(TokenType::Illegal, "é"));
        assert_eq!(lexer.next_token(), Token::eof());
        assert_eq!(lexer.next_token(), Token::eof());
    }

    #[test]
    fn test_lexer_create_table() {
        let tokens = Lexer::new("create table t1 (id int primary key, name text not null);")
            .map(|t| t.kind)
            .collect::<Vec<_>>();
        assert_eq!(
            tokens,
            vec![
                TokenType::Create,
                TokenType::Table,
                TokenType::Ident,
                TokenType::LParen,
                TokenType::Ident,
                TokenType::IntType,
                TokenType::Primary,
                TokenType::Key,
                TokenType::Comma,
                TokenType::Ident,
                TokenType::TextType,
                TokenType::Not,
                TokenType::Null,
                TokenType::RParen,
                TokenType::Semicolon,
            ]
        );
    }
}
