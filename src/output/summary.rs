use crate::report::{ReportEnvelope, Severity, Status};

/// Print human-readable summary to stdout
pub fn print_summary(report: &ReportEnvelope, output_path: &str) {
    println!();
    println!("╭───────────────────────────────────────────────────────────────╮");
    println!("│                  WeldAudit Evaluation Summary                 │");
    println!("╰───────────────────────────────────────────────────────────────╯");
    println!();

    println!(
        "Standard: {} part {} ({})",
        report.standard, report.part, report.version
    );
    println!("Generated: {}", report.generated_at);
    println!();

    let result = &report.result;
    let (status_icon, status_text) = match result.status {
        Status::Valid => ("✅", "VALID"),
        Status::Warning => ("⚠️ ", "WARNING"),
        Status::Invalid => ("🚨", "INVALID"),
    };
    println!("Status: {} {}", status_icon, status_text);
    println!();

    if !result.findings.is_empty() {
        println!("Findings ({} total):", result.findings.len());
        for finding in &result.findings {
            let icon = match finding.severity {
                Severity::Error => "🚨",
                Severity::Warning => "⚠️ ",
                Severity::Info => "ℹ️ ",
            };
            println!(
                "  {} [{}] {}: {}",
                icon,
                finding.rule_id,
                finding.field.as_deref().unwrap_or("-"),
                finding.message.as_deref().unwrap_or("-")
            );
        }
        println!();
    }

    if !result.required_tests.is_empty() {
        println!("Required tests:");
        for test in &result.required_tests {
            println!("  [{}] {}", test.id, test.tests.join(", "));
        }
        println!();
    }

    if !result.approval_ranges.is_empty() {
        println!("Approval ranges:");
        for range in &result.approval_ranges {
            println!("  [{}] {} = {}", range.id, range.output_field, range.value);
        }
        println!();
    }

    println!("Full report written to: {}", output_path);
    println!();
}

/// Format summary as string (for testing)
pub fn format_summary(report: &ReportEnvelope) -> String {
    let result = &report.result;
    let mut output = String::new();

    output.push_str(&format!("Status: {:?}\n", result.status));
    output.push_str(&format!("Findings: {}\n", result.findings.len()));

    for finding in &result.findings {
        output.push_str(&format!(
            "[{:?}] {}: {}\n",
            finding.severity,
            finding.rule_id,
            finding.message.as_deref().unwrap_or("-")
        ));
    }

    output
}
