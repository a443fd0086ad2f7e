mod cache;
mod loader;
mod model;
mod schema;

pub use cache::PackCache;
pub use loader::RulePackLoader;
pub use model::{
    Compute, Effect, FindingEffect, Predicate, RangeRule, Rule, RulePack, TestRequirement,
    ValidationRule, WhenNode,
};
pub use schema::SchemaValidator;
