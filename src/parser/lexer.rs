//! Lexer (tokenizer) for stack-language source code
//!
//! Produces [`Token`]s lazily, one per call to [`Lexer::next_token`]. The
//! parser relies on [`Lexer::revert`] to undo speculative reads: reverted
//! tokens sit on a LIFO stack and are handed out again before any new input
//! is scanned.

use super::ast::{BinaryOp, SourceLocation};
use std::fmt;

/// All token variants produced by the lexer.
///
/// Every variant carries a [`SourceLocation`] so that parse errors can report
/// an accurate line and column without a separate token→location table.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(i64, SourceLocation),

    // Identifiers
    Ident(String, SourceLocation),

    // Keywords
    If(SourceLocation),
    Else(SourceLocation),
    Var(SourceLocation),
    Func(SourceLocation),
    Proc(SourceLocation),
    Return(SourceLocation),

    // Arithmetic (`+` and `-` double as unary operators)
    Plus(SourceLocation),  // +
    Minus(SourceLocation), // -
    Star(SourceLocation),  // *
    Slash(SourceLocation), // /

    // Relational
    Lt(SourceLocation),    // <
    Gt(SourceLocation),    // >
    EqEq(SourceLocation),  // ==
    NotEq(SourceLocation), // !=

    // Logical
    AndAnd(SourceLocation), // &&
    OrOr(SourceLocation),   // ||

    // Assignment
    Eq(SourceLocation), // =

    // Punctuation
    LParen(SourceLocation),    // (
    RParen(SourceLocation),    // )
    LBrace(SourceLocation),    // {
    RBrace(SourceLocation),    // }
    Semicolon(SourceLocation), // ;
    Comma(SourceLocation),     // ,

    // End of input
    Eof(SourceLocation),
}

impl Token {
    /// Returns the source location where this token appears.
    pub fn location(&self) -> SourceLocation {
        match self {
            Token::Number(_, loc)
            | Token::Ident(_, loc)
            | Token::If(loc)
            | Token::Else(loc)
            | Token::Var(loc)
            | Token::Func(loc)
            | Token::Proc(loc)
            | Token::Return(loc)
            | Token::Plus(loc)
            | Token::Minus(loc)
            | Token::Star(loc)
            | Token::Slash(loc)
            | Token::Lt(loc)
            | Token::Gt(loc)
            | Token::EqEq(loc)
            | Token::NotEq(loc)
            | Token::AndAnd(loc)
            | Token::OrOr(loc)
            | Token::Eq(loc)
            | Token::LParen(loc)
            | Token::RParen(loc)
            | Token::LBrace(loc)
            | Token::RBrace(loc)
            | Token::Semicolon(loc)
            | Token::Comma(loc)
            | Token::Eof(loc) => *loc,
        }
    }

    /// The binary operator this token spells, if any
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            Token::OrOr(_) => Some(BinaryOp::Or),
            Token::AndAnd(_) => Some(BinaryOp::And),
            Token::Lt(_) => Some(BinaryOp::Less),
            Token::Gt(_) => Some(BinaryOp::Greater),
            Token::EqEq(_) => Some(BinaryOp::Equal),
            Token::NotEq(_) => Some(BinaryOp::NotEqual),
            Token::Plus(_) => Some(BinaryOp::Add),
            Token::Minus(_) => Some(BinaryOp::Sub),
            Token::Star(_) => Some(BinaryOp::Mul),
            Token::Slash(_) => Some(BinaryOp::Div),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Token::Eof(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n, _) => write!(f, "number {}", n),
            Token::Ident(s, _) => write!(f, "identifier '{}'", s),
            Token::If(_) => write!(f, "'if'"),
            Token::Else(_) => write!(f, "'else'"),
            Token::Var(_) => write!(f, "'var'"),
            Token::Func(_) => write!(f, "'func'"),
            Token::Proc(_) => write!(f, "'proc'"),
            Token::Return(_) => write!(f, "'return'"),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Lt(_) => write!(f, "'<'"),
            Token::Gt(_) => write!(f, "'>'"),
            Token::EqEq(_) => write!(f, "'=='"),
            Token::NotEq(_) => write!(f, "'!='"),
            Token::AndAnd(_) => write!(f, "'&&'"),
            Token::OrOr(_) => write!(f, "'||'"),
            Token::Eq(_) => write!(f, "'='"),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::LBrace(_) => write!(f, "'{{'"),
            Token::RBrace(_) => write!(f, "'}}'"),
            Token::Semicolon(_) => write!(f, "';'"),
            Token::Comma(_) => write!(f, "','"),
            Token::Eof(_) => write!(f, "end of input"),
        }
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Lexer error at line {}, column {}: {}",
    .location.line,
    .location.column,
    .message
)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

/// Lazy lexer with a pushback stack
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    reverted: Vec<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            reverted: Vec::new(),
        }
    }

    /// Create a lexer over raw bytes. Invalid UTF-8 sequences become
    /// U+FFFD and are reported as unexpected characters when reached.
    pub fn from_bytes(input: &[u8]) -> Self {
        Self::new(&String::from_utf8_lossy(input))
    }

    /// Next token, or [`Token::Eof`] once the input is exhausted.
    /// Reverted tokens are returned first, most recent first.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(token) = self.reverted.pop() {
            return Ok(token);
        }

        self.skip_whitespace_and_comments();

        if self.is_at_end() {
            return Ok(Token::Eof(self.current_location()));
        }

        self.scan_token()
    }

    /// Push a previously returned token back. Tokens must be reverted in
    /// the reverse order they were read.
    pub fn revert(&mut self, token: Token) {
        self.reverted.push(token);
    }

    /// Tokenize the entire remaining input, `Eof` included
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    /// Scan one token starting at the current character
    fn scan_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.advance().ok_or_else(|| LexError {
            message: "Unexpected end of input".to_string(),
            location: loc,
        })?;

        match ch {
            '0'..='9' => self.number_literal(ch, loc),

            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),

            '+' => Ok(Token::Plus(loc)),
            '-' => Ok(Token::Minus(loc)),
            '*' => Ok(Token::Star(loc)),
            '/' => Ok(Token::Slash(loc)),
            '<' => Ok(Token::Lt(loc)),
            '>' => Ok(Token::Gt(loc)),
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Ok(Token::EqEq(loc))
                } else {
                    Ok(Token::Eq(loc))
                }
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                Ok(Token::NotEq(loc))
            }
            '&' if self.peek() == Some('&') => {
                self.advance();
                Ok(Token::AndAnd(loc))
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                Ok(Token::OrOr(loc))
            }
            '(' => Ok(Token::LParen(loc)),
            ')' => Ok(Token::RParen(loc)),
            '{' => Ok(Token::LBrace(loc)),
            '}' => Ok(Token::RBrace(loc)),
            ';' => Ok(Token::Semicolon(loc)),
            ',' => Ok(Token::Comma(loc)),

            _ => Err(LexError {
                message: format!("Unexpected character: '{}'", ch),
                location: loc,
            }),
        }
    }

    /// Parse numeric literal (unsigned decimal, 64-bit)
    fn number_literal(
        &mut self,
        first_digit: char,
        loc: SourceLocation,
    ) -> Result<Token, LexError> {
        let mut num_str = String::new();
        num_str.push(first_digit);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value = num_str.parse::<i64>().map_err(|_| LexError {
            message: format!("Integer literal out of range: {}", num_str),
            location: loc,
        })?;

        Ok(Token::Number(value, loc))
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(
        &mut self,
        first_char: char,
        loc: SourceLocation,
    ) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match ident.as_str() {
            "if" => Token::If(loc),
            "else" => Token::Else(loc),
            "var" => Token::Var(loc),
            "func" => Token::Func(loc),
            "proc" => Token::Proc(loc),
            "return" => Token::Return(loc),
            _ => Token::Ident(ident, loc),
        }
    }

    /// Skip whitespace and `//` comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\n') => {
                    self.advance();
                }
                Some('/') if self.peek_ahead(1) == Some('/') => {
                    self.skip_line_comment();
                }
                _ => break,
            }
        }
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        let mut lexer = Lexer::new("proc Show(a, b) { Print(a); }");
        let kinds: Vec<String> = lexer
            .tokenize()
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect();

        assert_eq!(
            kinds,
            vec![
                "'proc'",
                "identifier 'Show'",
                "'('",
                "identifier 'a'",
                "','",
                "identifier 'b'",
                "')'",
                "'{'",
                "identifier 'Print'",
                "'('",
                "identifier 'a'",
                "')'",
                "';'",
                "'}'",
                "end of input",
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let mut lexer = Lexer::new("if else var func proc return iffy _x9 funcs");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::If(_)));
        assert!(matches!(tokens[1], Token::Else(_)));
        assert!(matches!(tokens[2], Token::Var(_)));
        assert!(matches!(tokens[3], Token::Func(_)));
        assert!(matches!(tokens[4], Token::Proc(_)));
        assert!(matches!(tokens[5], Token::Return(_)));
        assert!(matches!(tokens[6], Token::Ident(ref s, _) if s == "iffy"));
        assert!(matches!(tokens[7], Token::Ident(ref s, _) if s == "_x9"));
        assert!(matches!(tokens[8], Token::Ident(ref s, _) if s == "funcs"));
    }

    #[test]
    fn test_operators() {
        let mut lexer = Lexer::new("== != && || = < > + - * /");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::EqEq(_)));
        assert!(matches!(tokens[1], Token::NotEq(_)));
        assert!(matches!(tokens[2], Token::AndAnd(_)));
        assert!(matches!(tokens[3], Token::OrOr(_)));
        assert!(matches!(tokens[4], Token::Eq(_)));
        assert!(matches!(tokens[5], Token::Lt(_)));
        assert!(matches!(tokens[6], Token::Gt(_)));
        assert!(matches!(tokens[7], Token::Plus(_)));
        assert!(matches!(tokens[8], Token::Minus(_)));
        assert!(matches!(tokens[9], Token::Star(_)));
        assert!(matches!(tokens[10], Token::Slash(_)));
    }

    #[test]
    fn test_lone_ampersand_is_rejected() {
        let mut lexer = Lexer::new("a & b");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.location, SourceLocation::new(1, 3));
        assert!(err.message.contains('&'));

        assert!(Lexer::new("a | b").tokenize().is_err());
        assert!(Lexer::new("!a").tokenize().is_err());
    }

    #[test]
    fn test_comments() {
        let mut lexer = Lexer::new("x; // comment = & |\ny; // trailing");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(tokens[0], Token::Ident(ref s, _) if s == "x"));
        assert!(matches!(tokens[1], Token::Semicolon(_)));
        assert!(matches!(tokens[2], Token::Ident(ref s, _) if s == "y"));
        assert!(matches!(tokens[3], Token::Semicolon(_)));
        assert!(matches!(tokens[4], Token::Eof(_)));
    }

    #[test]
    fn test_number_literal_range() {
        let mut lexer = Lexer::new("9223372036854775807");
        let tokens = lexer.tokenize().unwrap();
        assert!(matches!(tokens[0], Token::Number(i64::MAX, _)));

        let mut lexer = Lexer::new("9223372036854775808");
        assert!(lexer.tokenize().is_err());
    }

    #[test]
    fn test_revert_is_lifo() {
        let mut lexer = Lexer::new("a = 1;");
        let a = lexer.next_token().unwrap();
        let eq = lexer.next_token().unwrap();

        lexer.revert(eq);
        lexer.revert(a);

        assert!(matches!(lexer.next_token().unwrap(), Token::Ident(ref s, _) if s == "a"));
        assert!(matches!(lexer.next_token().unwrap(), Token::Eq(_)));
        assert!(matches!(lexer.next_token().unwrap(), Token::Number(1, _)));
    }

    #[test]
    fn test_locations() {
        let mut lexer = Lexer::new("proc P()\n  {\n}");
        let tokens = lexer.tokenize().unwrap();

        assert_eq!(tokens[0].location(), SourceLocation::new(1, 1));
        assert_eq!(tokens[1].location(), SourceLocation::new(1, 6));
        assert_eq!(tokens[4].location(), SourceLocation::new(2, 3));
        assert_eq!(tokens[5].location(), SourceLocation::new(3, 1));
    }

    #[test]
    fn test_invalid_utf8_is_reported() {
        let mut lexer = Lexer::from_bytes(b"proc P() { \xff }");
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.location, SourceLocation::new(1, 12));
    }

    #[test]
    fn test_eof_is_sticky() {
        let mut lexer = Lexer::new("  ");
        assert!(lexer.next_token().unwrap().is_eof());
        assert!(lexer.next_token().unwrap().is_eof());
    }
}
