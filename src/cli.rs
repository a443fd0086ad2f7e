use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "weldaudit")]
#[command(about = "Rule-pack driven compliance evaluation for welding qualification records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate a document against a rule pack and write a report
    Evaluate {
        /// Directory holding the rule-pack content
        #[arg(long, env = "WELDAUDIT_RULES_ROOT", default_value = "rules")]
        rules_root: PathBuf,

        /// Rule-pack identifier, relative to the rules root
        #[arg(long)]
        pack: String,

        /// Path to the current document payload (JSON)
        #[arg(long)]
        document: PathBuf,

        /// Path to the previous revision of the document, if any
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Include the triggered-rule trace in the result
        #[arg(long)]
        debug: bool,

        /// Where to write the JSON report
        #[arg(long, short, default_value = "report.json")]
        output: PathBuf,
    },

    /// Compose and schema-check a rule pack without evaluating anything
    Validate {
        /// Directory holding the rule-pack content
        #[arg(long, env = "WELDAUDIT_RULES_ROOT", default_value = "rules")]
        rules_root: PathBuf,

        /// Rule-pack identifier, relative to the rules root
        #[arg(long)]
        pack: String,
    },
}
