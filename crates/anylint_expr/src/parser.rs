//! Precedence-climbing parser producing [`Expr`] trees.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use crate::{ExprError, Value};

const TERNARY_PRECEDENCE: u8 = 2;
const MAX_DEPTH: usize = 128;

/// Parses a complete expression.
///
/// Fails on the first syntax error; trailing tokens after a complete
/// expression are an error too.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = Tokenizer::tokenize(source)?;
    let mut parser = Parser {
        tokens,
        cursor: 0,
        end: source.len(),
        depth: 0,
    };
    if parser.tokens.is_empty() {
        return Err(ExprError::syntax(0, "empty expression"));
    }
    let expr = parser.expression(0)?;
    if let Some(token) = parser.peek() {
        return Err(ExprError::syntax(
            token.position,
            format!("unexpected token '{}'", token.value),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Result<Token, ExprError> {
        let token = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| ExprError::syntax(self.end, "unexpected end of expression"))?;
        self.cursor += 1;
        Ok(token)
    }

    fn check(&self, kind: TokenKind, value: &str) -> bool {
        self.peek().is_some_and(|t| t.is(kind, value))
    }

    fn eat(&mut self, kind: TokenKind, value: &str) -> bool {
        if self.check(kind, value) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, value: &str) -> Result<(), ExprError> {
        let token = self.advance()?;
        if token.is(kind, value) {
            Ok(())
        } else {
            Err(ExprError::syntax(
                token.position,
                format!("expected '{}', found '{}'", value, token.value),
            ))
        }
    }

    /// Runs `parse` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Expr, ExprError>,
    ) -> Result<Expr, ExprError> {
        if self.depth >= MAX_DEPTH {
            let position = self.peek().map_or(self.end, |t| t.position);
            return Err(ExprError::syntax(position, "expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Parses operators binding at least as tightly as `min`.
    fn expression(&mut self, min: u8) -> Result<Expr, ExprError> {
        self.nested(|parser| parser.expression_inner(min))
    }

    fn expression_inner(&mut self, min: u8) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        loop {
            let Some(token) = self.peek() else { break };
            if token.kind != TokenKind::Operator || token.precedence < min.max(1) {
                break;
            }
            let precedence = token.precedence;
            let op_text = token.value.clone();
            let position = token.position;

            if op_text == "?" {
                self.cursor += 1;
                let consequent = self.expression(0)?;
                self.expect(TokenKind::Colon, ":")?;
                let alternate = self.expression(TERNARY_PRECEDENCE)?;
                left = Expr::Ternary {
                    condition: Box::new(left),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                };
                continue;
            }

            let op = BinaryOp::from_operator(&op_text).ok_or_else(|| {
                ExprError::syntax(position, format!("unsupported operator '{}'", op_text))
            })?;
            self.cursor += 1;
            let right = self.expression(precedence + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        self.nested(Self::unary_inner)
    }

    fn unary_inner(&mut self) -> Result<Expr, ExprError> {
        if let Some(token) = self.peek()
            && token.kind == TokenKind::Operator
            && let Some(op) = UnaryOp::from_operator(&token.value)
        {
            self.cursor += 1;
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        let primary = self.primary()?;
        self.postfix(primary)
    }

    fn postfix(&mut self, mut expr: Expr) -> Result<Expr, ExprError> {
        loop {
            if self.peek().is_some_and(|t| t.kind == TokenKind::Dot) {
                self.cursor += 1;
                let token = self.advance()?;
                if !matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword) {
                    return Err(ExprError::syntax(
                        token.position,
                        format!("expected property name, found '{}'", token.value),
                    ));
                }
                expr = Expr::Member {
                    object: Box::new(expr),
                    property: token.value,
                };
            } else if self.eat(TokenKind::Grouper, "[") {
                let index = self.expression(0)?;
                self.expect(TokenKind::Grouper, "]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat(TokenKind::Grouper, "(") {
                let args = self.list(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma separated expressions up to `close`. A trailing comma is allowed.
    fn list(&mut self, close: &str) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        while !self.eat(TokenKind::Grouper, close) {
            items.push(self.expression(0)?);
            if !self.eat(TokenKind::Comma, ",") {
                self.expect(TokenKind::Grouper, close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::String => Ok(Expr::Literal(Value::String(token.value))),
            TokenKind::Integer | TokenKind::Decimal => {
                let n = token.value.parse::<f64>().map_err(|_| {
                    ExprError::syntax(token.position, format!("invalid number '{}'", token.value))
                })?;
                Ok(Expr::Literal(Value::Number(n)))
            }
            TokenKind::Keyword => Ok(Expr::Literal(match token.value.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => Value::Undefined,
            })),
            TokenKind::Identifier => Ok(Expr::Identifier(token.value)),
            TokenKind::Grouper if token.value == "(" => {
                let inner = self.expression(0)?;
                self.expect(TokenKind::Grouper, ")")?;
                Ok(inner)
            }
            TokenKind::Grouper if token.value == "[" => Ok(Expr::Array(self.list("]")?)),
            TokenKind::Grouper if token.value == "{" => self.object(),
            _ => Err(ExprError::syntax(
                token.position,
                format!("unexpected token '{}'", token.value),
            )),
        }
    }

    fn object(&mut self) -> Result<Expr, ExprError> {
        let mut entries = Vec::new();
        while !self.eat(TokenKind::Grouper, "}") {
            let key = self.advance()?;
            if !matches!(
                key.kind,
                TokenKind::Identifier
                    | TokenKind::Keyword
                    | TokenKind::String
                    | TokenKind::Integer
                    | TokenKind::Decimal
            ) {
                return Err(ExprError::syntax(
                    key.position,
                    format!("invalid object key '{}'", key.value),
                ));
            }
            self.expect(TokenKind::Colon, ":")?;
            let value = self.expression(0)?;
            entries.push((key.value, value));
            if !self.eat(TokenKind::Comma, ",") {
                self.expect(TokenKind::Grouper, "}")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Identifier(name.to_string()))
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Number(n)))
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: num(1.0),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: num(2.0),
                    right: num(3.0),
                }),
            }
        );
    }

    #[test]
    fn test_left_associative_subtraction() {
        assert_eq!(
            parse("a - b - c").unwrap(),
            Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: ident("a"),
                    right: ident("b"),
                }),
                right: ident("c"),
            }
        );
    }

    #[test]
    fn test_member_and_method_call() {
        assert_eq!(
            parse("$.fileName.endsWith('.ts')").unwrap(),
            Expr::Call {
                callee: Box::new(Expr::Member {
                    object: Box::new(Expr::Member {
                        object: ident("$"),
                        property: "fileName".to_string(),
                    }),
                    property: "endsWith".to_string(),
                }),
                args: vec![Expr::Literal(Value::from(".ts"))],
            }
        );
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        let Expr::Ternary { alternate, .. } = expr else {
            panic!("expected ternary");
        };
        assert!(matches!(*alternate, Expr::Ternary { .. }));
    }

    #[test]
    fn test_nullish_binds_tighter_than_ternary() {
        let expr = parse("a ?? b ? c : d").unwrap();
        let Expr::Ternary { condition, .. } = expr else {
            panic!("expected ternary");
        };
        assert!(matches!(
            *condition,
            Expr::Binary {
                op: BinaryOp::Nullish,
                ..
            }
        ));
    }

    #[test]
    fn test_pipe_has_lowest_precedence() {
        let expr = parse("a + b |> String").unwrap();
        assert!(matches!(
            expr,
            Expr::Binary {
                op: BinaryOp::Pipe,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        assert_eq!(
            parse("!a && b").unwrap(),
            Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: ident("a"),
                }),
                right: ident("b"),
            }
        );
    }

    #[test]
    fn test_keyword_literals_ignore_case() {
        assert_eq!(parse("TRUE").unwrap(), Expr::Literal(Value::Bool(true)));
        assert_eq!(parse("Undefined").unwrap(), Expr::Literal(Value::Undefined));
    }

    #[test]
    fn test_array_and_object_literals() {
        assert_eq!(
            parse("[1, 'x',]").unwrap(),
            Expr::Array(vec![
                Expr::Literal(Value::Number(1.0)),
                Expr::Literal(Value::from("x")),
            ])
        );
        assert_eq!(
            parse("{ a: 1, 'b c': null }").unwrap(),
            Expr::Object(vec![
                ("a".to_string(), Expr::Literal(Value::Number(1.0))),
                ("b c".to_string(), Expr::Literal(Value::Null)),
            ])
        );
    }

    #[test]
    fn test_index_expression() {
        assert_eq!(
            parse("items[0]").unwrap(),
            Expr::Index {
                object: ident("items"),
                index: num(0.0),
            }
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::dangling_operator("a +")]
    #[case::unclosed_paren("(a")]
    #[case::unclosed_call("f(a, b")]
    #[case::missing_colon("a ? b")]
    #[case::trailing_tokens("a b")]
    #[case::bad_member("a.'x'")]
    #[case::assignment("a = 1")]
    #[case::bitwise("a | b")]
    fn test_syntax_errors(#[case] source: &str) {
        assert!(matches!(parse(source), Err(ExprError::Syntax { .. })));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let source = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(matches!(parse(&source), Err(ExprError::Syntax { .. })));
        let source = format!("{}x", "!".repeat(500));
        assert!(matches!(parse(&source), Err(ExprError::Syntax { .. })));
    }

    #[rstest]
    #[case::ternary_chain(format!("{}1", "a ? 1 : ".repeat(3_000)))]
    #[case::ternary_consequent(format!("{}1{}", "a ? ".repeat(3_000), " : 0".repeat(3_000)))]
    #[case::right_operands(format!("{}1", "1 + 2 * -".repeat(3_000)))]
    fn test_deep_operator_chains_are_rejected(#[case] source: String) {
        match parse(&source) {
            Err(ExprError::Syntax { message, .. }) => {
                assert!(message.contains("nested too deeply"), "{}", message)
            }
            other => panic!("expected depth error, got {:?}", other),
        }
    }

    #[test]
    fn test_moderate_ternary_chain_parses() {
        let source = format!("{}1", "a ? 1 : ".repeat(20));
        assert!(parse(&source).is_ok());
    }
}
