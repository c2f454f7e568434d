//! Tree-walking evaluation of [`Expr`] against a [`Scope`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::builtins;
use crate::{ExprError, Scope, Value};

/// Evaluates expressions against one scope.
///
/// The scope is borrowed immutably, so no evaluation can change what a later
/// evaluation observes.
pub struct Interpreter<'a> {
    scope: &'a Scope,
}

impl<'a> Interpreter<'a> {
    /// Creates an interpreter over `scope`.
    pub fn new(scope: &'a Scope) -> Self {
        Self { scope }
    }

    /// Evaluates an expression tree.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value, ExprError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Identifier(name) => self.scope.lookup(name),
            Expr::Member { object, property } => self.evaluate(object)?.member(property),
            Expr::Index { object, index } => {
                let target = self.evaluate(object)?;
                let key = self.evaluate(index)?;
                target.index(&key)
            }
            Expr::Call { callee, args } => {
                let args = self.evaluate_all(args)?;
                self.call(callee, args)
            }
            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Negate => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                })
            }
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Ternary {
                condition,
                consequent,
                alternate,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(consequent)
                } else {
                    self.evaluate(alternate)
                }
            }
            Expr::Array(items) => Ok(Value::Array(self.evaluate_all(items)?)),
            Expr::Object(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.evaluate(value)?);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn evaluate_all(&self, exprs: &[Expr]) -> Result<Vec<Value>, ExprError> {
        exprs.iter().map(|e| self.evaluate(e)).collect()
    }

    fn call(&self, callee: &Expr, args: Vec<Value>) -> Result<Value, ExprError> {
        match callee {
            Expr::Identifier(name) if builtins::is_global(name) => {
                builtins::call_global(name, &args)
            }
            Expr::Identifier(name) => Err(ExprError::not_callable(name.as_str())),
            Expr::Member { object, property } => {
                let receiver = self.evaluate(object)?;
                builtins::call_method(&receiver, property, &args)
            }
            _ => Err(ExprError::not_callable("expression")),
        }
    }

    /// `x |> f(a)` calls `f(x, a)` when `f` is global, otherwise `x.f(a)`.
    fn pipe(&self, input: Value, target: &Expr) -> Result<Value, ExprError> {
        let (name, extra) = match target {
            Expr::Identifier(name) => (name, Vec::new()),
            Expr::Call { callee, args } => match callee.as_ref() {
                Expr::Identifier(name) => (name, self.evaluate_all(args)?),
                _ => return Err(ExprError::not_callable("pipe target")),
            },
            _ => return Err(ExprError::not_callable("pipe target")),
        };
        if builtins::is_global(name) {
            let mut args = Vec::with_capacity(extra.len() + 1);
            args.push(input);
            args.extend(extra);
            builtins::call_global(name, &args)
        } else {
            builtins::call_method(&input, name, &extra)
        }
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value, ExprError> {
        let lhs = self.evaluate(left)?;
        match op {
            BinaryOp::And => {
                return if lhs.is_truthy() {
                    self.evaluate(right)
                } else {
                    Ok(lhs)
                };
            }
            BinaryOp::Or => {
                return if lhs.is_truthy() {
                    Ok(lhs)
                } else {
                    self.evaluate(right)
                };
            }
            BinaryOp::Nullish => {
                return if lhs.is_nullish() {
                    self.evaluate(right)
                } else {
                    Ok(lhs)
                };
            }
            BinaryOp::Pipe => return self.pipe(lhs, right),
            _ => {}
        }

        let rhs = self.evaluate(right)?;
        let value = match op {
            BinaryOp::Add => add(&lhs, &rhs),
            BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
            BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
            BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
            BinaryOp::Rem => Value::Number(lhs.to_number() % rhs.to_number()),
            BinaryOp::Lt => Value::Bool(compare(&lhs, &rhs) == Some(Ordering::Less)),
            BinaryOp::Le => Value::Bool(matches!(
                compare(&lhs, &rhs),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOp::Gt => Value::Bool(compare(&lhs, &rhs) == Some(Ordering::Greater)),
            BinaryOp::Ge => Value::Bool(matches!(
                compare(&lhs, &rhs),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinaryOp::Eq => Value::Bool(lhs.loose_eq(&rhs)),
            BinaryOp::Ne => Value::Bool(!lhs.loose_eq(&rhs)),
            BinaryOp::StrictEq => Value::Bool(lhs.strict_eq(&rhs)),
            BinaryOp::StrictNe => Value::Bool(!lhs.strict_eq(&rhs)),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish | BinaryOp::Pipe => {
                unreachable!("short-circuit operators return early")
            }
        };
        Ok(value)
    }
}

fn add(lhs: &Value, rhs: &Value) -> Value {
    let concatenates = |v: &Value| matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_));
    if concatenates(lhs) || concatenates(rhs) {
        Value::String(lhs.to_display_string() + &rhs.to_display_string())
    } else {
        Value::Number(lhs.to_number() + rhs.to_number())
    }
}

/// Strings compare lexicographically, everything else numerically. `None`
/// when either side is `NaN`.
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => lhs.to_number().partial_cmp(&rhs.to_number()),
    }
}
