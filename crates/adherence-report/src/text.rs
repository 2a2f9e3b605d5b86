use std::path::Path;

use colored::Colorize;

use adherence_core::pipeline::Analysis;
use adherence_core::types::{Severity, Violation};

use crate::json::Summary;

/// Format a run summary for terminal output.
pub fn format_summary(analysis: &Analysis, output: &Path) -> String {
    let summary = Summary::of(analysis);
    let mut out = String::new();

    out.push_str(&format!(
        "\n{}\n",
        "Adherence - Architecture Protocol".bold()
    ));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    out.push_str(&format!(
        "{}: {} files, {} symbols, {} edges ({} unresolved)\n",
        "Summary".bold(),
        summary.files,
        summary.symbols,
        summary.edges,
        summary.dangling_edges,
    ));

    if analysis.violations.is_empty() {
        out.push_str(&format!("\n{}\n", "No violations found!".green().bold()));
    } else {
        out.push_str(&format!(
            "\n{} ({} found)\n{}\n",
            "Violations".red().bold(),
            analysis.violations.len(),
            "-".repeat(40),
        ));
        for (kind, count) in &summary.violations {
            out.push_str(&format!("  {kind}: {count}\n"));
        }
        for v in &analysis.violations {
            out.push_str(&format_violation(v));
        }
    }

    out.push_str(&format!(
        "\n{}: {}\n",
        "Protocol".bold(),
        output.display()
    ));
    out
}

fn format_violation(v: &Violation) -> String {
    let severity_str = match v.severity {
        Severity::Error => "ERROR".red().bold().to_string(),
        Severity::Warning => "WARN".yellow().bold().to_string(),
        Severity::Info => "INFO".blue().bold().to_string(),
    };
    let mut out = format!("\n  {} [{}] {}\n", severity_str, v.kind, v.file);
    out.push_str(&format!("    {}\n", v.message));
    if let Some(ref suggestion) = v.suggestion {
        out.push_str(&format!("    {}: {}\n", "Suggestion".cyan(), suggestion));
    }
    out
}

/// Violations at or above `fail_on`.
pub fn failing_violations(violations: &[Violation], fail_on: Severity) -> usize {
    violations.iter().filter(|v| v.severity >= fail_on).count()
}

/// Format the gate verdict for CI use. Returns (text, passed).
pub fn format_check(analysis: &Analysis, fail_on: Severity) -> (String, bool) {
    let failing = failing_violations(&analysis.violations, fail_on);
    let passed = failing == 0;
    let text = if passed {
        format!("{}\n", "CHECK PASSED".green().bold())
    } else {
        format!(
            "{}: {} violation(s) at severity {} or above\n",
            "CHECK FAILED".red().bold(),
            failing,
            fail_on,
        )
    };
    (text, passed)
}
