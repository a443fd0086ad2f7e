use std::collections::HashMap;

use serde_json::{json, Value};

use super::predicate::truthy;

/// A registered computation. Arguments arrive positionally, already
/// resolved; errors are reasons the caller wraps into the expression
/// error for the failing rule.
pub type ComputeFn = fn(&[Value]) -> Result<Value, String>;

/// Name-to-function mapping for compute expressions. Built once at process
/// start and read-only afterwards.
pub struct FunctionRegistry {
    functions: HashMap<&'static str, ComputeFn>,
}

impl FunctionRegistry {
    /// Registry with the four built-in qualification computations.
    pub fn builtin() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        registry.register("RANGE_THICKNESS", range_thickness);
        registry.register("RANGE_DIAMETER", range_diameter);
        registry.register("RANGE_POSITION", range_position);
        registry.register("NEEDS_REQUALIFICATION", needs_requalification);
        registry
    }

    pub fn register(&mut self, name: &'static str, function: ComputeFn) {
        self.functions.insert(name, function);
    }

    pub fn get(&self, name: &str) -> Option<ComputeFn> {
        self.functions.get(name).copied()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn number_arg(args: &[Value], index: usize, what: &str) -> Result<f64, String> {
    args.get(index)
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("argument {index} ({what}) must be a number"))
}

fn string_arg<'a>(args: &'a [Value], index: usize, what: &str) -> Result<&'a str, String> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("argument {index} ({what}) must be a string"))
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Approved thickness range from the tested thickness. Plate doubles the
/// tested value for the upper bound; other product forms use 1.5.
fn range_thickness(args: &[Value]) -> Result<Value, String> {
    let tested = number_arg(args, 0, "tested thickness")?;
    let product_form = string_arg(args, 1, "product form")?;
    let factor = if product_form == "plate" { 2.0 } else { 1.5 };
    Ok(json!({
        "min": round3(tested * 0.5),
        "max": round3(tested * factor),
        "unit": "mm"
    }))
}

/// Approved diameter range: half to double the tested diameter.
fn range_diameter(args: &[Value]) -> Result<Value, String> {
    let diameter = number_arg(args, 0, "tested diameter")?;
    Ok(json!({
        "min": round3(diameter * 0.5),
        "max": round3(diameter * 2.0),
        "unit": "mm"
    }))
}

/// Welding positions approved by a tested position code. Unknown codes
/// approve only themselves.
fn range_position(args: &[Value]) -> Result<Value, String> {
    let position = string_arg(args, 0, "welding position")?;
    let approved = match position {
        "PA" => vec!["PA"],
        "PF" => vec!["PA", "PC", "PF"],
        "HL" => vec!["PA", "PC", "HL"],
        other => vec![other],
    };
    Ok(json!({"approved": approved, "basis": position}))
}

/// True when any essential variable is marked changed in the change set.
fn needs_requalification(args: &[Value]) -> Result<Value, String> {
    let changeset = args
        .first()
        .and_then(Value::as_object)
        .ok_or("argument 0 (change set) must be an object")?;
    let essential = args
        .get(1)
        .and_then(Value::as_array)
        .ok_or("argument 1 (essential variables) must be an array")?;

    let required = essential
        .iter()
        .filter_map(Value::as_str)
        .any(|field| changeset.get(field).is_some_and(truthy));
    Ok(Value::Bool(required))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_range_thickness_plate() {
        let f = FunctionRegistry::builtin().get("RANGE_THICKNESS").unwrap();
        let result = f(&[json!(12), json!("plate")]).unwrap();
        assert_eq!(result, json!({"min": 6.0, "max": 24.0, "unit": "mm"}));
    }

    #[test]
    fn test_range_thickness_pipe_uses_lower_factor() {
        let f = FunctionRegistry::builtin().get("RANGE_THICKNESS").unwrap();
        let result = f(&[json!(10), json!("pipe")]).unwrap();
        assert_eq!(result, json!({"min": 5.0, "max": 15.0, "unit": "mm"}));
    }

    #[test]
    fn test_range_thickness_rounds_to_three_decimals() {
        let f = FunctionRegistry::builtin().get("RANGE_THICKNESS").unwrap();
        let result = f(&[json!(1.2345), json!("plate")]).unwrap();
        assert_eq!(result["min"], json!(0.617));
        assert_eq!(result["max"], json!(2.469));
    }

    #[test]
    fn test_range_thickness_rejects_missing_args() {
        let f = FunctionRegistry::builtin().get("RANGE_THICKNESS").unwrap();
        assert!(f(&[json!("not a number"), json!("plate")]).is_err());
        assert!(f(&[json!(12)]).is_err());
    }

    #[test]
    fn test_range_diameter() {
        let f = FunctionRegistry::builtin().get("RANGE_DIAMETER").unwrap();
        let result = f(&[json!(60)]).unwrap();
        assert_eq!(result, json!({"min": 30.0, "max": 120.0, "unit": "mm"}));
    }

    #[test]
    fn test_range_position_known_codes() {
        let f = FunctionRegistry::builtin().get("RANGE_POSITION").unwrap();
        assert_eq!(
            f(&[json!("PF")]).unwrap(),
            json!({"approved": ["PA", "PC", "PF"], "basis": "PF"})
        );
        assert_eq!(
            f(&[json!("PA")]).unwrap(),
            json!({"approved": ["PA"], "basis": "PA"})
        );
    }

    #[test]
    fn test_range_position_unknown_code_approves_itself() {
        let f = FunctionRegistry::builtin().get("RANGE_POSITION").unwrap();
        assert_eq!(
            f(&[json!("PG")]).unwrap(),
            json!({"approved": ["PG"], "basis": "PG"})
        );
    }

    #[test]
    fn test_needs_requalification() {
        let f = FunctionRegistry::builtin()
            .get("NEEDS_REQUALIFICATION")
            .unwrap();

        let changeset = json!({"process": true, "position": false});
        let essential = json!(["process", "base_material_group"]);
        assert_eq!(f(&[changeset, essential]).unwrap(), json!(true));

        let changeset = json!({"position": true});
        let essential = json!(["process"]);
        assert_eq!(f(&[changeset, essential]).unwrap(), json!(false));
    }

    #[test]
    fn test_unknown_function_lookup() {
        assert!(FunctionRegistry::builtin().get("NO_SUCH_FUNC").is_none());
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = FunctionRegistry::builtin();
        registry.register("ALWAYS_ONE", |_args| Ok(json!(1)));
        assert_eq!(registry.get("ALWAYS_ONE").unwrap()(&[]).unwrap(), json!(1));
    }
}
