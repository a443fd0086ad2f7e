use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pack::RulePack;

/// Finding severity. ERROR drives the status to INVALID, WARNING to
/// WARNING; INFO is advisory only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    #[default]
    Info,
}

/// Overall document classification.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Valid,
    Warning,
    Invalid,
}

/// A single compliance observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub severity: Severity,
    pub rule_id: String,
    pub field: Option<String>,
    pub message: Option<String>,
    pub reference: Option<String>,
    pub needs_verification: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
}

/// Follow-up tests required by a triggered test rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredTest {
    pub id: String,
    pub tests: Vec<String>,
    pub reference: Option<String>,
    pub needs_verification: bool,
}

/// One computed approval range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApprovalRange {
    pub id: String,
    pub output_field: String,
    pub value: Value,
    pub reference: Option<String>,
    pub needs_verification: bool,
}

/// Debug trace attached when requested: ids of rules whose `when` held,
/// in post-merge declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugInfo {
    pub triggered_rules: Vec<String>,
}

/// Aggregated result of one evaluation. A pure value: never mutated after
/// construction, byte-identical across repeated runs on the same inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    pub status: Status,
    pub findings: Vec<Finding>,
    pub required_tests: Vec<RequiredTest>,
    pub approval_ranges: Vec<ApprovalRange>,
    pub computed: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// On-disk report artifact produced by the CLI: the evaluation result
/// wrapped with provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportEnvelope {
    pub report_version: String,
    pub report_id: String,
    pub generated_at: String,
    pub standard: String,
    pub part: String,
    pub version: String,
    pub result: EvaluationResult,
}

impl ReportEnvelope {
    pub fn new(pack: &RulePack, result: EvaluationResult) -> Self {
        Self {
            report_version: "1.0.0".to_string(),
            report_id: uuid::Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            standard: pack.standard.clone(),
            part: pack.part.clone(),
            version: pack.version.clone(),
            result,
        }
    }
}
