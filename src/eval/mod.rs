mod context;
mod evaluator;
mod explanations;
mod expression;
mod functions;
mod predicate;

pub use context::EvalContext;
pub use evaluator::{evaluate_request, EvaluationRequest, Evaluator};
pub use explanations::build_finding;
pub use expression::{Arg, CallExpr};
pub use functions::{ComputeFn, FunctionRegistry};
pub use predicate::{eval_predicate, eval_when, Op};
