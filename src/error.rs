use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by rule-pack loading, composition, and evaluation.
///
/// None of these are retried internally; the caller decides whether to
/// reload the pack or surface the error. Evaluation has no partial-result
/// mode: any mid-pass failure aborts the whole call.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The composed rule pack failed structural validation. Every violation
    /// found is listed, not just the first.
    #[error("rule pack validation failed: {}", violations.join("; "))]
    Schema { violations: Vec<String> },

    /// A rule-pack file was missing or unreadable.
    #[error("failed to read rule pack {path:?}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rule-pack file was not valid JSON.
    #[error("failed to parse rule pack {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An `includes` chain re-entered an identifier already being composed.
    #[error("cyclic include detected: {}", chain.join(" -> "))]
    CyclicInclude { chain: Vec<String> },

    /// A predicate referenced an operator outside the fixed set.
    #[error("unsupported operator: {op}")]
    UnsupportedOperator { op: String },

    /// A compute expression did not match the `NAME(arg, ...)` grammar or
    /// its arguments could not be applied to the resolved function.
    #[error("invalid expression {expression:?}: {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// A compute expression named a function absent from the registry.
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    /// A `regex` predicate carried an unparseable pattern.
    #[error("invalid regex pattern {pattern:?}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
