//! Single-pass tokenizer for the expression language.

use crate::ExprError;

const TWO_CHAR_OPS: &[&str] = &["==", "!=", "<=", ">=", "||", "&&", "??", "|>"];
const THREE_CHAR_OPS: &[&str] = &["===", "!=="];
const KEYWORDS: &[&str] = &["true", "false", "null", "undefined"];

/// Precedence of member access, indexing and invocation.
pub const POSTFIX_PRECEDENCE: u8 = 13;

/// Token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Quoted string, value is unescaped.
    String,
    /// Identifier such as `file` or `$$`.
    Identifier,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// Digits only.
    Integer,
    /// Digits with a fractional part.
    Decimal,
    /// Operator such as `+`, `===` or `?`.
    Operator,
    /// One of `( ) [ ] { }`.
    Grouper,
    /// One of the reserved literal words.
    Keyword,
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Category.
    pub kind: TokenKind,
    /// Source text (unescaped for strings).
    pub value: String,
    /// Binding precedence for operators and groupers, 0 otherwise.
    pub precedence: u8,
    /// Byte offset of the token start.
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>, position: usize) -> Self {
        let value = value.into();
        let precedence = match kind {
            TokenKind::Operator | TokenKind::Grouper => precedence(&value),
            TokenKind::Dot => POSTFIX_PRECEDENCE,
            _ => 0,
        };
        Self {
            kind,
            value,
            precedence,
            position,
        }
    }

    /// Whether this token is the given operator or grouper.
    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }
}

/// Binding precedence of an operator or grouper.
pub fn precedence(op: &str) -> u8 {
    match op {
        "|>" => 1,
        "?" => 2,
        "??" => 3,
        "||" => 4,
        "&&" => 5,
        "|" => 6,
        "^" => 7,
        "&" => 8,
        "==" | "!=" | "===" | "!==" => 9,
        "<" | ">" | "<=" | ">=" => 10,
        "+" | "-" => 11,
        "*" | "/" | "%" => 12,
        "(" | "[" | "." | "{" => POSTFIX_PRECEDENCE,
        _ => 0,
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r' | ' ')
}

fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_ascii_alphabetic()
}

fn is_ident_part(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn is_quote(ch: char) -> bool {
    ch == '"' || ch == '\''
}

fn is_operator(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-' | '*' | '/' | '!' | '&' | '%' | '<' | '=' | '>' | '?' | '^' | '|'
    )
}

fn is_grouper(ch: char) -> bool {
    matches!(ch, '(' | ')' | '[' | ']' | '{' | '}')
}

/// Tokenizer over an expression source.
pub struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer positioned at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Tokenizes the whole source.
    pub fn tokenize(source: &'a str) -> Result<Vec<Token>, ExprError> {
        let mut tokenizer = Self::new(source);
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Returns the next token, `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, ExprError> {
        while self.peek().is_some_and(is_whitespace) {
            self.bump();
        }
        let Some(ch) = self.peek() else {
            return Ok(None);
        };
        let token = if is_quote(ch) {
            self.string(ch)?
        } else if is_ident_start(ch) {
            self.ident_or_keyword()
        } else if ch.is_ascii_digit() {
            self.number()
        } else if ch == '.' {
            self.dot()
        } else if ch == ',' {
            self.single(TokenKind::Comma)
        } else if ch == ':' {
            self.single(TokenKind::Colon)
        } else if is_operator(ch) {
            self.operator()
        } else if is_grouper(ch) {
            self.single(TokenKind::Grouper)
        } else {
            return Err(ExprError::syntax(
                self.pos,
                format!("unexpected character '{}'", ch),
            ));
        };
        Ok(Some(token))
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        self.bump();
        Token::new(kind, &self.source[start..self.pos], start)
    }

    fn string(&mut self, quote: char) -> Result<Token, ExprError> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(ExprError::syntax(start, "unterminated string")),
                Some(ch) if ch == quote => break,
                Some('\\') => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| ExprError::syntax(start, "unterminated string"))?;
                    value.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        'b' => '\u{8}',
                        'f' => '\u{c}',
                        other => other,
                    });
                }
                Some(ch) => value.push(ch),
            }
        }
        Ok(Token::new(TokenKind::String, value, start))
    }

    fn ident_or_keyword(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_part) {
            self.bump();
        }
        let value = &self.source[start..self.pos];
        let kind = if KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(value)) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, value, start)
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn number(&mut self) -> Token {
        let start = self.pos;
        self.digits();
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.digits();
            return Token::new(TokenKind::Decimal, &self.source[start..self.pos], start);
        }
        Token::new(TokenKind::Integer, &self.source[start..self.pos], start)
    }

    fn dot(&mut self) -> Token {
        let start = self.pos;
        self.bump();
        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.digits();
            return Token::new(TokenKind::Decimal, &self.source[start..self.pos], start);
        }
        Token::new(TokenKind::Dot, ".", start)
    }

    fn operator(&mut self) -> Token {
        let start = self.pos;
        let rest = &self.source[start..];
        let len = THREE_CHAR_OPS
            .iter()
            .chain(TWO_CHAR_OPS)
            .find(|op| rest.starts_with(*op))
            .map(|op| op.len())
            .unwrap_or(1);
        self.pos += len;
        Token::new(TokenKind::Operator, &self.source[start..self.pos], start)
    }
}
