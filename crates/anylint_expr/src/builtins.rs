//! Functions callable from expressions.
//!
//! This is the entire callable surface of the sandbox: a handful of global
//! conversion helpers plus read-only methods on strings, arrays and objects.
//! Nothing here performs I/O or mutates its receiver.

use crate::{ExprError, Value};

const GLOBALS: &[&str] = &[
    "String",
    "Number",
    "Boolean",
    "parseInt",
    "parseFloat",
    "isArray",
    "keys",
];

/// Whether `name` is a global function.
pub(crate) fn is_global(name: &str) -> bool {
    GLOBALS.contains(&name)
}

/// Calls a global function.
pub(crate) fn call_global(name: &str, args: &[Value]) -> Result<Value, ExprError> {
    let first = args.first().unwrap_or(&Value::Undefined);
    match name {
        "String" => Ok(Value::String(if args.is_empty() {
            String::new()
        } else {
            first.to_display_string()
        })),
        "Number" => Ok(Value::Number(if args.is_empty() {
            0.0
        } else {
            first.to_number()
        })),
        "Boolean" => Ok(Value::Bool(first.is_truthy())),
        "parseInt" => {
            let radix = match args.get(1) {
                None | Some(Value::Undefined) => None,
                Some(v) => Some(v.to_number()),
            };
            Ok(Value::Number(parse_int(&first.to_display_string(), radix)))
        }
        "parseFloat" => Ok(Value::Number(parse_float(&first.to_display_string()))),
        "isArray" => Ok(Value::Bool(matches!(first, Value::Array(_)))),
        "keys" => match first {
            Value::Object(map) => Ok(Value::Array(
                map.keys().map(|k| Value::String(k.clone())).collect(),
            )),
            Value::Array(items) => Ok(Value::Array(
                (0..items.len())
                    .map(|i| Value::String(i.to_string()))
                    .collect(),
            )),
            Value::Undefined | Value::Null => Err(ExprError::type_error(format!(
                "cannot list keys of {}",
                first.type_name()
            ))),
            _ => Ok(Value::Array(Vec::new())),
        },
        _ => Err(ExprError::not_callable(name)),
    }
}

/// Calls a method on a receiver value.
pub(crate) fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value, ExprError> {
    match receiver {
        Value::String(s) => string_method(s, name, args),
        Value::Array(items) => array_method(items, name, args),
        Value::Object(_) if name == "substitute" => {
            let template = arg_string(args, 0);
            Ok(Value::String(substitute_fields(receiver, &template)))
        }
        Value::Undefined | Value::Null => {
            Err(ExprError::invalid_access(name, receiver.type_name()))
        }
        _ => Err(ExprError::not_callable(format!(
            "{}.{}",
            receiver.type_name(),
            name
        ))),
    }
}

/// Replaces every `${key}` in `template` with the string or number field
/// `key` of an object value.
pub fn substitute_fields(object: &Value, template: &str) -> String {
    let Some(fields) = object.as_object() else {
        return template.to_string();
    };
    fields
        .iter()
        .filter(|(_, v)| matches!(v, Value::String(_) | Value::Number(_)))
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("${{{}}}", key), &value.to_display_string())
        })
}

fn arg_string(args: &[Value], index: usize) -> String {
    args.get(index)
        .map(Value::to_display_string)
        .unwrap_or_else(|| "undefined".to_string())
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Value, ExprError> {
    let value = match name {
        "startsWith" => {
            let start = char_to_byte(s, relative_index(args.get(1), s.chars().count(), 0, false));
            Value::Bool(s[start..].starts_with(&arg_string(args, 0)))
        }
        "endsWith" => Value::Bool(s.ends_with(&arg_string(args, 0))),
        "includes" => Value::Bool(s.contains(&arg_string(args, 0))),
        "indexOf" => Value::Number(
            s.find(&arg_string(args, 0))
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0),
        ),
        "toLowerCase" => Value::String(s.to_lowercase()),
        "toUpperCase" => Value::String(s.to_uppercase()),
        "trim" => Value::String(s.trim().to_string()),
        "split" => split(s, args),
        "replace" => Value::String(s.replacen(&arg_string(args, 0), &arg_string(args, 1), 1)),
        "replaceAll" => {
            let pattern = arg_string(args, 0);
            let replacement = arg_string(args, 1);
            if pattern.is_empty() {
                return Err(ExprError::type_error("replaceAll needs a non-empty pattern"));
            }
            Value::String(s.replace(&pattern, &replacement))
        }
        "slice" => {
            let len = s.chars().count();
            let start = relative_index(args.first(), len, 0, true);
            let end = relative_index(args.get(1), len, len, true);
            Value::String(s.chars().skip(start).take(end.saturating_sub(start)).collect())
        }
        "substring" => {
            let len = s.chars().count();
            let a = relative_index(args.first(), len, 0, false);
            let b = relative_index(args.get(1), len, len, false);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            Value::String(s.chars().skip(start).take(end - start).collect())
        }
        _ => return Err(ExprError::not_callable(format!("string.{}", name))),
    };
    Ok(value)
}

fn split(s: &str, args: &[Value]) -> Value {
    let limit = match args.get(1) {
        None | Some(Value::Undefined) => usize::MAX,
        Some(v) => {
            let n = v.to_number();
            if n.is_nan() || n < 0.0 { 0 } else { n as usize }
        }
    };
    let parts: Vec<Value> = match args.first() {
        None | Some(Value::Undefined) => vec![Value::String(s.to_string())],
        Some(sep) => {
            let sep = sep.to_display_string();
            if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Value::from).collect()
            }
        }
    };
    Value::Array(parts.into_iter().take(limit).collect())
}

fn array_method(items: &[Value], name: &str, args: &[Value]) -> Result<Value, ExprError> {
    let first = args.first().unwrap_or(&Value::Undefined);
    let value = match name {
        "includes" => Value::Bool(items.iter().any(|item| item.strict_eq(first))),
        "indexOf" => Value::Number(
            items
                .iter()
                .position(|item| item.strict_eq(first))
                .map(|i| i as f64)
                .unwrap_or(-1.0),
        ),
        "join" => {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(v) => v.to_display_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(|item| {
                        if item.is_nullish() {
                            String::new()
                        } else {
                            item.to_display_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        "slice" => {
            let start = relative_index(args.first(), items.len(), 0, true);
            let end = relative_index(args.get(1), items.len(), items.len(), true);
            Value::Array(
                items
                    .iter()
                    .skip(start)
                    .take(end.saturating_sub(start))
                    .cloned()
                    .collect(),
            )
        }
        "concat" => {
            let mut joined = items.to_vec();
            for arg in args {
                match arg {
                    Value::Array(more) => joined.extend(more.iter().cloned()),
                    other => joined.push(other.clone()),
                }
            }
            Value::Array(joined)
        }
        _ => return Err(ExprError::not_callable(format!("array.{}", name))),
    };
    Ok(value)
}

/// Resolves an optional index argument against a length.
///
/// A missing or `undefined` argument yields `default`. With `from_end`,
/// negative values count back from the end; otherwise they clamp to 0.
fn relative_index(arg: Option<&Value>, len: usize, default: usize, from_end: bool) -> usize {
    let n = match arg {
        None | Some(Value::Undefined) => return default,
        Some(v) => v.to_number(),
    };
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        if from_end {
            (len as f64 + n).max(0.0) as usize
        } else {
            0
        }
    } else {
        n.min(len as f64) as usize
    }
}

fn char_to_byte(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(b, _)| b).unwrap_or(s.len())
}

fn parse_int(text: &str, radix: Option<f64>) -> f64 {
    let mut rest = text.trim_start();
    let negative = rest.starts_with('-');
    if negative || rest.starts_with('+') {
        rest = &rest[1..];
    }
    // Hex prefixes are honoured when the radix is 16 or left to inference.
    let (mut radix, inferred) = match radix {
        Some(r) if r.is_nan() || r == 0.0 => (10, true),
        Some(r) if !(2.0..=36.0).contains(&r.trunc()) => return f64::NAN,
        Some(r) => (r.trunc() as u32, false),
        None => (10, true),
    };
    if (radix == 16 || inferred) && (rest.starts_with("0x") || rest.starts_with("0X")) {
        rest = &rest[2..];
        radix = 16;
    }
    let digits: Vec<u32> = rest.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let magnitude = digits
        .iter()
        .fold(0.0_f64, |acc, d| acc * f64::from(radix) + f64::from(*d));
    if negative { -magnitude } else { magnitude }
}

fn parse_float(text: &str) -> f64 {
    let rest = text.trim_start();
    let unsigned = rest.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") && rest.len() - unsigned.len() <= 1 {
        return if rest.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let bytes = rest.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if !seen_digit {
        return f64::NAN;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    rest[..end].parse::<f64>().unwrap_or(f64::NAN)
}
