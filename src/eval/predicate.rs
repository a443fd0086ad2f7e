use std::cmp::Ordering;

use serde_json::Value;

use super::context::EvalContext;
use crate::error::EngineError;
use crate::pack::{Predicate, WhenNode};

/// The closed operator set. Predicates carry the operator as a string;
/// parsing it here means an unknown operator fails the evaluation with a
/// structured error instead of being skipped, while dispatch stays an
/// exhaustively-matched enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Exists,
    NotExists,
    Changed,
    Regex,
}

impl Op {
    pub fn parse(op: &str) -> Result<Self, EngineError> {
        match op {
            "eq" => Ok(Self::Eq),
            "neq" => Ok(Self::Neq),
            "gt" => Ok(Self::Gt),
            "gte" => Ok(Self::Gte),
            "lt" => Ok(Self::Lt),
            "lte" => Ok(Self::Lte),
            "in" => Ok(Self::In),
            "not_in" => Ok(Self::NotIn),
            "exists" => Ok(Self::Exists),
            "not_exists" => Ok(Self::NotExists),
            "changed" => Ok(Self::Changed),
            "regex" => Ok(Self::Regex),
            other => Err(EngineError::UnsupportedOperator {
                op: other.to_string(),
            }),
        }
    }
}

/// Evaluate a single predicate against the context.
pub fn eval_predicate(ctx: &EvalContext, predicate: &Predicate) -> Result<bool, EngineError> {
    let current = ctx.get(&predicate.field);
    let expected = &predicate.value;

    Ok(match Op::parse(&predicate.op)? {
        Op::Eq => current == expected,
        Op::Neq => current != expected,
        Op::Gt => compare(current, expected) == Some(Ordering::Greater),
        Op::Gte => matches!(
            compare(current, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Op::Lt => compare(current, expected) == Some(Ordering::Less),
        Op::Lte => matches!(
            compare(current, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Op::In => member_of(current, expected),
        Op::NotIn => !member_of(current, expected),
        Op::Exists => !current.is_null() == truthy(expected),
        Op::NotExists => current.is_null() == truthy(expected),
        Op::Changed => {
            // A first submission carries no previous payload and counts as
            // unchanged, so `changed: true` cannot fire on it.
            let changed = ctx.has_previous() && ctx.previous(&predicate.field) != current;
            changed == truthy(expected)
        }
        Op::Regex => match (current.as_str(), expected.as_str()) {
            (Some(text), Some(pattern)) => {
                let re = regex::Regex::new(pattern).map_err(|source| EngineError::InvalidRegex {
                    pattern: pattern.to_string(),
                    source,
                })?;
                re.is_match(text)
            }
            _ => false,
        },
    })
}

/// Evaluate a `when` node. A node without `all`/`any`/`not` always holds.
/// Every child predicate is evaluated (no short-circuit) so a miswritten
/// operator anywhere in the tree surfaces as an error.
pub fn eval_when(ctx: &EvalContext, node: &WhenNode) -> Result<bool, EngineError> {
    if let Some(all) = &node.all {
        let mut holds = true;
        for predicate in all {
            holds &= eval_predicate(ctx, predicate)?;
        }
        return Ok(holds);
    }
    if let Some(any) = &node.any {
        let mut holds = false;
        for predicate in any {
            holds |= eval_predicate(ctx, predicate)?;
        }
        return Ok(holds);
    }
    if let Some(inner) = &node.not {
        return Ok(!eval_when(ctx, inner)?);
    }
    Ok(true)
}

/// Ordered comparison. Null and order-incomparable pairs yield `None`, so
/// all four ordered operators are false for them.
fn compare(current: &Value, expected: &Value) -> Option<Ordering> {
    match (current, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn member_of(current: &Value, expected: &Value) -> bool {
    match expected {
        Value::Array(items) => items.iter().any(|item| item == current),
        _ => false,
    }
}

/// Python-style truthiness, used by the polarity-flag operators and the
/// requalification function.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
