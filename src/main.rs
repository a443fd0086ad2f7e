use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use weldaudit::cli::{Cli, Command};
use weldaudit::eval::{Evaluator, FunctionRegistry};
use weldaudit::output::{print_summary, write_report};
use weldaudit::pack::RulePackLoader;
use weldaudit::report::ReportEnvelope;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate {
            rules_root,
            pack,
            document,
            previous,
            debug,
            output,
        } => {
            let loader = RulePackLoader::new(&rules_root)?;
            let rule_pack = loader.load(&pack)?;

            let current = read_payload(&document)?;
            let previous = previous.as_deref().map(read_payload).transpose()?;

            let registry = FunctionRegistry::builtin();
            let result = Evaluator::new(&rule_pack, &registry)
                .with_debug(debug)
                .evaluate(&current, previous.as_ref())?;

            let report = ReportEnvelope::new(&rule_pack, result);
            write_report(&report, &output)?;
            print_summary(&report, &output.display().to_string());
        }
        Command::Validate { rules_root, pack } => {
            let loader = RulePackLoader::new(&rules_root)?;
            let rule_pack = loader.load(&pack)?;
            println!(
                "Rule pack {} is valid: {} rules, {} validations, {} tests, {} ranges",
                pack,
                rule_pack.rules.len(),
                rule_pack.validations.len(),
                rule_pack.tests.len(),
                rule_pack.ranges.len()
            );
        }
    }
    Ok(())
}

fn read_payload(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse document {:?}", path))
}
