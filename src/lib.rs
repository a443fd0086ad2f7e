//! Rule-pack driven compliance evaluation for welding procedure and
//! qualification records.
//!
//! A rule pack is a JSON document composed from `includes` (merged first),
//! its own content, and `overrides` (merged last), then validated against
//! an embedded schema. The [`eval::Evaluator`] runs the composed pack's
//! validations, conditional rules, required-test rules, and computed
//! ranges against a document payload (plus an optional previous revision)
//! and aggregates everything into one [`report::EvaluationResult`]:
//! VALID, WARNING, or INVALID, with findings, required tests, and
//! approval ranges in pack declaration order.

pub mod cli;
pub mod error;
pub mod eval;
pub mod output;
pub mod pack;
pub mod report;

pub use error::EngineError;
pub use eval::{evaluate_request, EvaluationRequest, Evaluator, FunctionRegistry};
pub use pack::{PackCache, RulePack, RulePackLoader, SchemaValidator};
pub use report::{EvaluationResult, Finding, Severity, Status};
