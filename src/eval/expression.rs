use serde_json::Value;

use super::context::resolve_path;
use crate::error::EngineError;

/// A parsed compute expression: one function call with positional
/// arguments. The grammar is deliberately closed: no nesting, no
/// arithmetic, no argument expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Arg>,
}

/// One argument of a call expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Dotted path under `inputs.`, `context.`, or `computed.`, resolved
    /// against the augmented payload at evaluation time.
    Path(String),
    /// Literal value, passed through as a string (quotes stripped).
    Literal(Value),
}

const PATH_PREFIXES: [&str; 3] = ["inputs.", "context.", "computed."];

impl CallExpr {
    /// Parse `NAME(arg1, arg2, ...)` where NAME is UPPER_SNAKE.
    pub fn parse(expression: &str) -> Result<Self, EngineError> {
        let invalid = |reason: &str| EngineError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        let text = expression.trim();
        let open = text.find('(').ok_or_else(|| invalid("missing '('"))?;
        if !text.ends_with(')') {
            return Err(invalid("missing closing ')'"));
        }

        let name = &text[..open];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
            return Err(invalid("function name must be UPPER_SNAKE"));
        }

        let args = text[open + 1..text.len() - 1]
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(parse_arg)
            .collect();

        Ok(Self {
            name: name.to_string(),
            args,
        })
    }

    /// Resolve the arguments against `payload` (the original payload
    /// augmented with the in-progress `computed` object). Unresolvable
    /// paths become null; the called function decides whether that is
    /// acceptable.
    pub fn resolve_args(&self, payload: &Value) -> Vec<Value> {
        self.args
            .iter()
            .map(|arg| match arg {
                Arg::Path(path) => resolve_path(payload, path).clone(),
                Arg::Literal(value) => value.clone(),
            })
            .collect()
    }
}

fn parse_arg(raw: &str) -> Arg {
    if PATH_PREFIXES.iter().any(|prefix| raw.starts_with(prefix)) {
        Arg::Path(raw.to_string())
    } else {
        let literal = raw.trim_matches(|c| c == '"' || c == '\'');
        Arg::Literal(Value::String(literal.to_string()))
    }
}
