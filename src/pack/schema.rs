use jsonschema::Validator;
use serde_json::Value;

use crate::error::EngineError;

/// JSON Schema (Draft 2020-12) the composed rule pack must satisfy.
const RULE_PACK_SCHEMA: &str = include_str!("rule_pack.schema.json");

/// Structural validator for composed rule packs.
///
/// The schema is embedded in the binary so validation behaves identically
/// in every environment. Validation fails closed: a pack that does not
/// match the schema is never evaluated.
pub struct SchemaValidator {
    validator: Validator,
}

impl SchemaValidator {
    /// Compile the embedded rule-pack schema.
    pub fn new() -> Result<Self, EngineError> {
        let schema: Value =
            serde_json::from_str(RULE_PACK_SCHEMA).map_err(|e| EngineError::Schema {
                violations: vec![format!("embedded schema is not valid JSON: {e}")],
            })?;
        let validator = jsonschema::options()
            .build(&schema)
            .map_err(|e| EngineError::Schema {
                violations: vec![format!("embedded schema failed to compile: {e}")],
            })?;
        Ok(Self { validator })
    }

    /// Validate a composed rule-pack document, reporting every violation
    /// found rather than stopping at the first.
    pub fn validate(&self, pack: &Value) -> Result<(), EngineError> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(pack)
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{path}: {error}")
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Schema { violations })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_pack() -> Value {
        json!({
            "standard": "TEST",
            "part": "1",
            "version": "1",
            "scope": "test",
            "metadata": {},
            "definitions": {},
            "variables": [],
            "rules": [],
            "ranges": [],
            "tests": [],
            "validations": []
        })
    }

    #[test]
    fn test_minimal_pack_validates() {
        let validator = SchemaValidator::new().unwrap();
        validator.validate(&minimal_pack()).unwrap();
    }

    #[test]
    fn test_missing_collections_rejected() {
        let validator = SchemaValidator::new().unwrap();
        let err = validator
            .validate(&json!({"standard": "X"}))
            .unwrap_err();

        match err {
            EngineError::Schema { violations } => assert!(!violations.is_empty()),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_all_violations_reported() {
        let validator = SchemaValidator::new().unwrap();
        let mut pack = minimal_pack();
        // Two independent violations: rules not an array, bad severity.
        pack["rules"] = json!("not-an-array");
        pack["validations"] = json!([{"id": "v1", "severity": "FATAL"}]);

        match validator.validate(&pack).unwrap_err() {
            EngineError::Schema { violations } => assert!(violations.len() >= 2),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_rule_without_id_rejected() {
        let validator = SchemaValidator::new().unwrap();
        let mut pack = minimal_pack();
        pack["rules"] = json!([{"when": {}}]);

        assert!(validator.validate(&pack).is_err());
    }
}
