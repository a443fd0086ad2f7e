use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::context::EvalContext;
use super::explanations::build_finding;
use super::expression::CallExpr;
use super::functions::FunctionRegistry;
use super::predicate::eval_when;
use crate::error::EngineError;
use crate::pack::{RulePack, RulePackLoader};
use crate::report::{
    ApprovalRange, DebugInfo, EvaluationResult, Finding, RequiredTest, Severity, Status,
};

/// Evaluates one composed rule pack against a payload (plus optional
/// previous payload). Evaluation is pure: no shared state, no retries,
/// and no partial results. Any predicate or expression failure aborts
/// the whole call.
pub struct Evaluator<'a> {
    pack: &'a RulePack,
    registry: &'a FunctionRegistry,
    debug: bool,
}

impl<'a> Evaluator<'a> {
    pub fn new(pack: &'a RulePack, registry: &'a FunctionRegistry) -> Self {
        Self {
            pack,
            registry,
            debug: false,
        }
    }

    /// Attach the ordered triggered-rule trace to the result.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Run validations, rules, tests, and ranges in pack order and derive
    /// the overall status.
    pub fn evaluate(
        &self,
        payload: &Value,
        previous: Option<&Value>,
    ) -> Result<EvaluationResult, EngineError> {
        let ctx = EvalContext::new(payload, previous);
        let doc_type = payload.get("doc_type").and_then(Value::as_str);

        let mut findings: Vec<Finding> = Vec::new();
        let mut triggered: Vec<String> = Vec::new();
        let mut invalid = false;

        for validation in &self.pack.validations {
            if !applies(validation.applies_to.as_deref(), doc_type) {
                continue;
            }
            let missing: Vec<&str> = validation
                .require_fields
                .iter()
                .filter(|field| ctx.get(field).is_null())
                .map(String::as_str)
                .collect();
            if missing.is_empty() {
                continue;
            }
            findings.push(Finding {
                severity: validation.severity,
                rule_id: validation.id.clone(),
                field: Some(missing.join(",")),
                message: validation.message.clone(),
                reference: validation.reference.clone(),
                needs_verification: validation.needs_verification,
                confidence: None,
            });
            if validation.severity == Severity::Error {
                invalid = true;
            }
        }

        for rule in &self.pack.rules {
            if !applies(rule.applies_to.as_deref(), doc_type) {
                continue;
            }
            if eval_when(&ctx, &rule.when)? {
                debug!(rule_id = rule.id.as_str(), "rule triggered");
                triggered.push(rule.id.clone());
                if let Some(effect) = &rule.then.add_finding {
                    findings.push(build_finding(&rule.id, effect));
                }
                if rule.then.invalidate {
                    invalid = true;
                }
            }
        }

        let mut required_tests = Vec::new();
        for test in &self.pack.tests {
            if eval_when(&ctx, &test.when)? {
                required_tests.push(RequiredTest {
                    id: test.id.clone(),
                    tests: test.require.clone(),
                    reference: test.reference.clone(),
                    needs_verification: test.needs_verification,
                });
            }
        }

        let mut approval_ranges = Vec::new();
        let mut computed: Map<String, Value> = Map::new();
        for range in &self.pack.ranges {
            // Refresh the computed view before each rule: outputs of
            // earlier range rules are visible to both the gate and the
            // expression of later ones, so declaration order matters.
            let augmented = augment(payload, &computed);
            let range_ctx = EvalContext::new(&augmented, previous);
            if !eval_when(&range_ctx, &range.when)? {
                continue;
            }

            let expression = &range.compute.expression;
            let call = CallExpr::parse(expression)?;
            let function =
                self.registry
                    .get(&call.name)
                    .ok_or_else(|| EngineError::UnknownFunction {
                        name: call.name.clone(),
                    })?;
            let args = call.resolve_args(&augmented);
            let value = function(&args).map_err(|reason| EngineError::InvalidExpression {
                expression: expression.clone(),
                reason,
            })?;

            let output_field = &range.compute.output_field;
            if let Some(name) = output_field.strip_prefix("computed.") {
                computed.insert(name.to_string(), value.clone());
            }
            approval_ranges.push(ApprovalRange {
                id: range.id.clone(),
                output_field: output_field.clone(),
                value,
                reference: range.reference.clone(),
                needs_verification: range.needs_verification,
            });
        }

        let has_error = invalid || findings.iter().any(|f| f.severity == Severity::Error);
        let has_warning = findings.iter().any(|f| f.severity == Severity::Warning);
        let status = if has_error {
            Status::Invalid
        } else if has_warning {
            Status::Warning
        } else {
            Status::Valid
        };

        Ok(EvaluationResult {
            status,
            findings,
            required_tests,
            approval_ranges,
            computed,
            debug: self.debug.then_some(DebugInfo {
                triggered_rules: triggered,
            }),
        })
    }
}

/// Typed input of the evaluation call boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub rule_set: String,
    pub current: Value,
    #[serde(default)]
    pub previous: Option<Value>,
    #[serde(default)]
    pub debug: bool,
}

/// Load the requested rule pack and evaluate the payload pair against it.
pub fn evaluate_request(
    loader: &RulePackLoader,
    registry: &FunctionRegistry,
    request: &EvaluationRequest,
) -> Result<EvaluationResult, EngineError> {
    let pack = loader.load(&request.rule_set)?;
    Evaluator::new(&pack, registry)
        .with_debug(request.debug)
        .evaluate(&request.current, request.previous.as_ref())
}

/// An `applies_to` gate passes when absent, empty, or containing the
/// payload's document type.
fn applies(applies_to: Option<&[String]>, doc_type: Option<&str>) -> bool {
    match applies_to {
        None => true,
        Some(types) if types.is_empty() => true,
        Some(types) => doc_type.is_some_and(|dt| types.iter().any(|t| t == dt)),
    }
}

/// Payload plus the in-progress `computed` object, for range evaluation.
fn augment(payload: &Value, computed: &Map<String, Value>) -> Value {
    let mut map = match payload {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    map.insert("computed".to_string(), Value::Object(computed.clone()));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pack(value: Value) -> RulePack {
        serde_json::from_value(value).unwrap()
    }

    fn evaluate(pack_value: Value, payload: Value) -> EvaluationResult {
        let pack = pack(pack_value);
        let registry = FunctionRegistry::builtin();
        Evaluator::new(&pack, &registry)
            .evaluate(&payload, None)
            .unwrap()
    }

    #[test]
    fn test_empty_pack_is_valid() {
        let result = evaluate(json!({}), json!({"doc_type": "PQR"}));
        assert_eq!(result.status, Status::Valid);
        assert!(result.findings.is_empty());
    }

    #[test]
    fn test_validation_missing_field_invalidates() {
        let result = evaluate(
            json!({
                "validations": [{
                    "id": "required_fields",
                    "applies_to": ["PQR"],
                    "require_fields": ["inputs.base_material_group", "inputs.process"],
                    "severity": "ERROR",
                    "message": "Missing required fields."
                }]
            }),
            json!({"doc_type": "PQR", "inputs": {"process": "135"}}),
        );

        assert_eq!(result.status, Status::Invalid);
        assert_eq!(result.findings[0].rule_id, "required_fields");
        assert_eq!(
            result.findings[0].field.as_deref(),
            Some("inputs.base_material_group")
        );
    }

    #[test]
    fn test_validation_skipped_for_other_doc_type() {
        let result = evaluate(
            json!({
                "validations": [{
                    "id": "required_fields",
                    "applies_to": ["PQR"],
                    "require_fields": ["inputs.absent"],
                    "severity": "ERROR"
                }]
            }),
            json!({"doc_type": "WPQ", "inputs": {}}),
        );
        assert_eq!(result.status, Status::Valid);
    }

    #[test]
    fn test_warning_validation_does_not_invalidate() {
        let result = evaluate(
            json!({
                "validations": [{
                    "id": "advisory_fields",
                    "require_fields": ["inputs.absent"],
                    "severity": "WARNING"
                }]
            }),
            json!({"doc_type": "PQR", "inputs": {}}),
        );
        assert_eq!(result.status, Status::Warning);
    }

    #[test]
    fn test_rule_invalidate_beats_warning_findings() {
        let result = evaluate(
            json!({
                "rules": [
                    {
                        "id": "warn",
                        "when": {},
                        "then": {"add_finding": {"severity": "WARNING", "message": "w"}}
                    },
                    {
                        "id": "kill",
                        "when": {},
                        "then": {"invalidate": true}
                    }
                ]
            }),
            json!({"doc_type": "PQR"}),
        );
        assert_eq!(result.status, Status::Invalid);
    }

    #[test]
    fn test_info_findings_keep_status_valid() {
        let result = evaluate(
            json!({
                "rules": [{
                    "id": "note",
                    "when": {},
                    "then": {"add_finding": {"severity": "INFO", "message": "n"}}
                }]
            }),
            json!({"doc_type": "PQR"}),
        );
        assert_eq!(result.status, Status::Valid);
        assert_eq!(result.findings.len(), 1);
    }

    #[test]
    fn test_tests_gated_by_when() {
        let result = evaluate(
            json!({
                "tests": [
                    {
                        "id": "tests_for_process_135",
                        "when": {"all": [{"field": "inputs.process", "op": "in", "value": ["135"]}]},
                        "require": ["visual", "bend"]
                    },
                    {
                        "id": "tests_for_process_141",
                        "when": {"all": [{"field": "inputs.process", "op": "in", "value": ["141"]}]},
                        "require": ["macro"]
                    }
                ]
            }),
            json!({"doc_type": "PQR", "inputs": {"process": "135"}}),
        );

        assert_eq!(result.required_tests.len(), 1);
        assert_eq!(result.required_tests[0].id, "tests_for_process_135");
        assert_eq!(result.required_tests[0].tests, vec!["visual", "bend"]);
    }

    #[test]
    fn test_range_computes_and_exposes_computed() {
        let result = evaluate(
            json!({
                "ranges": [{
                    "id": "range_thickness_approval",
                    "when": {},
                    "compute": {
                        "expression": "RANGE_THICKNESS(inputs.thickness_tested_mm, context.product_form)",
                        "output_field": "computed.thickness_approved_mm"
                    }
                }]
            }),
            json!({
                "doc_type": "PQR",
                "inputs": {"thickness_tested_mm": 12},
                "context": {"product_form": "plate"}
            }),
        );

        assert_eq!(
            result.computed["thickness_approved_mm"],
            json!({"min": 6.0, "max": 24.0, "unit": "mm"})
        );
        assert_eq!(result.approval_ranges.len(), 1);
        assert_eq!(
            result.approval_ranges[0].output_field,
            "computed.thickness_approved_mm"
        );
    }

    #[test]
    fn test_later_range_sees_earlier_output() {
        // Second rule is gated on the first rule's computed output.
        let result = evaluate(
            json!({
                "ranges": [
                    {
                        "id": "first",
                        "when": {},
                        "compute": {
                            "expression": "RANGE_DIAMETER(inputs.diameter_mm)",
                            "output_field": "computed.diameter_approved_mm"
                        }
                    },
                    {
                        "id": "second",
                        "when": {"all": [{"field": "computed.diameter_approved_mm.min", "op": "gte", "value": 30}]},
                        "compute": {
                            "expression": "RANGE_POSITION(inputs.position)",
                            "output_field": "computed.position_approval"
                        }
                    }
                ]
            }),
            json!({"doc_type": "PQR", "inputs": {"diameter_mm": 60, "position": "PA"}}),
        );

        assert_eq!(result.approval_ranges.len(), 2);
        assert!(result.computed.contains_key("position_approval"));
    }

    #[test]
    fn test_range_output_outside_computed_namespace() {
        let result = evaluate(
            json!({
                "ranges": [{
                    "id": "raw_output",
                    "when": {},
                    "compute": {
                        "expression": "RANGE_DIAMETER(inputs.diameter_mm)",
                        "output_field": "approval.diameter"
                    }
                }]
            }),
            json!({"doc_type": "PQR", "inputs": {"diameter_mm": 60}}),
        );

        assert!(result.computed.is_empty());
        assert_eq!(result.approval_ranges[0].output_field, "approval.diameter");
    }

    #[test]
    fn test_unknown_function_fails_evaluation() {
        let pack = pack(json!({
            "ranges": [{
                "id": "bad",
                "when": {},
                "compute": {"expression": "NO_SUCH(inputs.x)", "output_field": "computed.x"}
            }]
        }));
        let registry = FunctionRegistry::builtin();
        let err = Evaluator::new(&pack, &registry)
            .evaluate(&json!({"inputs": {}}), None)
            .unwrap_err();

        match err {
            EngineError::UnknownFunction { name } => assert_eq!(name, "NO_SUCH"),
            other => panic!("expected unknown function, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_operator_aborts_whole_evaluation() {
        let pack = pack(json!({
            "rules": [{
                "id": "bad_op",
                "when": {"all": [{"field": "inputs.x", "op": "like", "value": "%a%"}]},
                "then": {}
            }]
        }));
        let registry = FunctionRegistry::builtin();
        let err = Evaluator::new(&pack, &registry)
            .evaluate(&json!({"inputs": {"x": "a"}}), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_debug_trace_in_declaration_order() {
        let pack = pack(json!({
            "rules": [
                {"id": "first", "when": {}, "then": {}},
                {"id": "skipped", "when": {"all": [{"field": "x", "op": "exists", "value": true}]}, "then": {}},
                {"id": "last", "when": {}, "then": {}}
            ]
        }));
        let registry = FunctionRegistry::builtin();
        let result = Evaluator::new(&pack, &registry)
            .with_debug(true)
            .evaluate(&json!({}), None)
            .unwrap();

        assert_eq!(
            result.debug.unwrap().triggered_rules,
            vec!["first", "last"]
        );
    }

    #[test]
    fn test_debug_omitted_by_default() {
        let result = evaluate(json!({}), json!({}));
        assert!(result.debug.is_none());
    }

    #[test]
    fn test_applies_gate() {
        let types = vec!["PQR".to_string(), "WPS".to_string()];
        assert!(applies(None, Some("PQR")));
        assert!(applies(Some(&[]), None));
        assert!(applies(Some(&types), Some("WPS")));
        assert!(!applies(Some(&types), Some("WPQ")));
        assert!(!applies(Some(&types), None));
    }
}
