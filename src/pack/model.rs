use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::report::Severity;

/// A fully-composed rule pack: includes merged first, the document's own
/// content next, overrides last. Immutable after load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RulePack {
    #[serde(default)]
    pub standard: String,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub definitions: Map<String, Value>,
    #[serde(default)]
    pub variables: Vec<Value>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub ranges: Vec<RangeRule>,
    #[serde(default)]
    pub tests: Vec<TestRequirement>,
    #[serde(default)]
    pub validations: Vec<ValidationRule>,
}

/// A conditional rule: when its gate holds, apply the effect.
///
/// Rule ids are assumed unique within a composed pack but not enforced;
/// merged packs may intentionally repeat an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<Vec<String>>,
    #[serde(default)]
    pub when: WhenNode,
    #[serde(default)]
    pub then: Effect,
}

/// Effect applied when a rule triggers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Effect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_finding: Option<FindingEffect>,
    #[serde(default)]
    pub invalidate: bool,
}

/// Raw finding data carried by an `add_finding` effect, normalized into a
/// `Finding` by the explanation builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FindingEffect {
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default = "default_true")]
    pub needs_verification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
}

/// A predicate-tree node. `all` is conjunction, `any` disjunction, `not`
/// negation of a nested node. A node with none of the three always holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WhenNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<Predicate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<Predicate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<WhenNode>>,
}

/// A single field/operator/value comparison.
///
/// `op` stays a string here; it is parsed into the closed operator enum at
/// evaluation time so an unknown operator fails the evaluation rather than
/// the deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Predicate {
    #[serde(default)]
    pub field: String,
    pub op: String,
    #[serde(default)]
    pub value: Value,
}

/// Field-presence validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<Vec<String>>,
    #[serde(default)]
    pub require_fields: Vec<String>,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default = "default_true")]
    pub needs_verification: bool,
}

/// Required follow-up tests, gated by `when`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestRequirement {
    pub id: String,
    #[serde(default)]
    pub when: WhenNode,
    #[serde(default)]
    pub require: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default = "default_true")]
    pub needs_verification: bool,
}

/// Computed approval range, gated by `when`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeRule {
    pub id: String,
    #[serde(default)]
    pub when: WhenNode,
    pub compute: Compute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default = "default_true")]
    pub needs_verification: bool,
}

/// The computation a range rule performs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Compute {
    pub expression: String,
    pub output_field: String,
}

fn default_true() -> bool {
    true
}
