use std::fs;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use super::model::RulePack;
use super::schema::SchemaValidator;
use crate::error::EngineError;

/// The five ordered collection fields. Merging appends; order is the
/// evaluation order and is semantically significant.
const SEQUENCE_FIELDS: [&str; 5] = ["variables", "rules", "ranges", "tests", "validations"];

/// Identity and provenance fields. Merging overwrites wholesale.
const IDENTITY_FIELDS: [&str; 5] = ["standard", "part", "version", "scope", "metadata"];

/// Loads rule-pack documents from a content root and composes them:
/// `includes` are merged first, the document's own content next, and
/// `overrides` last, so an override can patch anything already merged.
///
/// Composition never mutates a previously-built aggregate; every merge
/// step produces a fresh document, so a loaded pack can be shared across
/// threads freely.
pub struct RulePackLoader {
    rules_root: PathBuf,
    validator: SchemaValidator,
}

impl RulePackLoader {
    /// Create a loader rooted at `rules_root` with the embedded schema.
    pub fn new(rules_root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        Ok(Self::with_validator(rules_root, SchemaValidator::new()?))
    }

    /// Create a loader with an explicitly-supplied schema validator.
    pub fn with_validator(rules_root: impl Into<PathBuf>, validator: SchemaValidator) -> Self {
        Self {
            rules_root: rules_root.into(),
            validator,
        }
    }

    /// Compose, validate, and type the rule pack at `identifier`
    /// (a path relative to the content root).
    pub fn load(&self, identifier: &str) -> Result<RulePack, EngineError> {
        let mut in_progress = Vec::new();
        let composed = self.compose(identifier, &mut in_progress)?;

        serde_json::from_value(composed).map_err(|e| EngineError::Schema {
            violations: vec![e.to_string()],
        })
    }

    /// Recursively compose one identifier. `in_progress` holds the include
    /// chain currently being resolved; re-entering it is a cycle.
    fn compose(&self, identifier: &str, in_progress: &mut Vec<String>) -> Result<Value, EngineError> {
        if in_progress.iter().any(|id| id == identifier) {
            let mut chain = in_progress.clone();
            chain.push(identifier.to_string());
            return Err(EngineError::CyclicInclude { chain });
        }
        in_progress.push(identifier.to_string());

        let doc = self.read_document(identifier)?;
        let mut aggregate = empty_aggregate();

        for include in string_entries(&doc, "includes") {
            debug!(pack = identifier, include = include.as_str(), "merging include");
            let included = self.compose(&include, in_progress)?;
            if let Value::Object(included) = included {
                aggregate = merge(&aggregate, &included);
            }
        }

        aggregate = merge(&aggregate, &doc);

        if let Some(Value::Array(overrides)) = doc.get("overrides") {
            for patch in overrides {
                if let Value::Object(patch) = patch {
                    debug!(pack = identifier, "applying override");
                    aggregate = merge(&aggregate, patch);
                }
            }
        }

        let composed = Value::Object(aggregate);
        self.validator.validate(&composed)?;
        in_progress.pop();
        Ok(composed)
    }

    fn read_document(&self, identifier: &str) -> Result<Map<String, Value>, EngineError> {
        let path = self.rules_root.join(identifier);
        let raw = fs::read_to_string(&path).map_err(|source| EngineError::Load {
            path: path.clone(),
            source,
        })?;
        let value: Value = serde_json::from_str(&raw).map_err(|source| EngineError::Parse {
            path: path.clone(),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(EngineError::Schema {
                violations: vec![format!("{}: top-level value must be an object", path.display())],
            }),
        }
    }
}

/// The starting aggregate: collections empty, identity fields defaulted.
fn empty_aggregate() -> Map<String, Value> {
    let mut aggregate = Map::new();
    for key in ["standard", "part", "version", "scope"] {
        aggregate.insert(key.to_string(), Value::String(String::new()));
    }
    aggregate.insert("metadata".to_string(), Value::Object(Map::new()));
    aggregate.insert("definitions".to_string(), Value::Object(Map::new()));
    for key in SEQUENCE_FIELDS {
        aggregate.insert(key.to_string(), Value::Array(Vec::new()));
    }
    aggregate
}

/// Merge `incoming` into `base`, returning a new aggregate.
///
/// Sequence fields concatenate (duplicates allowed), `definitions` merges
/// key-by-key (object sub-merge, deduplicated list concatenation, scalar
/// overwrite), identity fields overwrite wholesale when present. Keys
/// outside the composable set (`includes`, `overrides`) are not carried.
fn merge(base: &Map<String, Value>, incoming: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();

    for key in SEQUENCE_FIELDS {
        let incoming_items = match incoming.get(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        let slot = merged
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = slot {
            items.extend(incoming_items);
        }
    }

    let incoming_defs = match incoming.get("definitions") {
        Some(Value::Object(defs)) => defs.clone(),
        _ => Map::new(),
    };
    let defs_slot = merged
        .entry("definitions".to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(defs) = defs_slot {
        for (name, value) in incoming_defs {
            merge_definition(defs, name, value);
        }
    }

    for key in IDENTITY_FIELDS {
        if let Some(value) = incoming.get(key) {
            merged.insert(key.to_string(), value.clone());
        }
    }

    merged
}

fn merge_definition(defs: &mut Map<String, Value>, name: String, value: Value) {
    match value {
        Value::Object(incoming) => {
            let slot = defs.entry(name).or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(existing) = slot {
                for (key, sub) in incoming {
                    existing.insert(key, sub);
                }
            } else {
                *slot = Value::Object(incoming);
            }
        }
        Value::Array(incoming) => {
            let slot = defs.entry(name).or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(existing) = slot {
                for item in incoming {
                    if !existing.contains(&item) {
                        existing.push(item);
                    }
                }
            } else {
                *slot = Value::Array(incoming);
            }
        }
        scalar => {
            defs.insert(name, scalar);
        }
    }
}

fn string_entries(doc: &Map<String, Value>, key: &str) -> Vec<String> {
    match doc.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
