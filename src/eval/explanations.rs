use super::predicate::truthy;
use crate::pack::FindingEffect;
use crate::report::Finding;

/// Normalize an `add_finding` effect into a user-facing finding record.
/// Defaults: INFO severity, a generic message, verification required.
pub fn build_finding(rule_id: &str, effect: &FindingEffect) -> Finding {
    Finding {
        severity: effect.severity,
        rule_id: rule_id.to_string(),
        field: effect.field.clone(),
        message: Some(
            effect
                .message
                .clone()
                .unwrap_or_else(|| "Rule triggered.".to_string()),
        ),
        reference: effect.reference.clone(),
        needs_verification: effect.needs_verification,
        confidence: effect.confidence.clone().filter(truthy),
    }
}
