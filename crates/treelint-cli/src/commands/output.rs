//! Shared output formatting for lint results.

use anyhow::Result;
use miette::{NamedSource, Report};
use treelint_core::{Severity, ViolationDiagnostic};

use crate::runner::RunReport;
use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Compact => print_compact(report),
        OutputFormat::Json => return print_json(report),
        OutputFormat::Pretty => print_pretty(report),
    }
    Ok(())
}

fn print_text(report: &RunReport) {
    let result = &report.result;
    let (errors, warnings, infos) = result.count_by_severity();

    for violation in &result.violations {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        let file = violation
            .location
            .file
            .as_ref()
            .map_or_else(|| "<text>".to_string(), |f| f.display().to_string());
        println!(
            "{} at {}:{}:{}",
            violation.rule_id, file, violation.location.line, violation.location.column,
        );
        println!("  {}: {}", severity_indicator, violation.message);
        if violation.can_be_autocorrected {
            println!("  = help: can be fixed with `treelint format`");
        }
        println!();
    }

    print_failures(report);

    let summary_color = if errors > 0 || !report.failures.is_empty() {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    print!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s)",
        summary_color, errors, warnings, infos, result.files_checked
    );
    if result.files_changed > 0 {
        print!(
            "; fixed {} violation(s) in {} file(s)",
            result.corrected, result.files_changed
        );
    }
    println!("\x1b[0m");
}

fn print_failures(report: &RunReport) {
    for failure in &report.result.rule_failures {
        println!("\x1b[33mwarning\x1b[0m: {failure}");
    }
    for (path, message) in &report.failures {
        println!("\x1b[31merror\x1b[0m: {}: {}", path.display(), message);
    }
}

fn print_json(report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(report: &RunReport) {
    for violation in &report.result.violations {
        println!("{violation}");
    }
    for (path, message) in &report.failures {
        println!("{}: error {}", path.display(), message);
    }
}

fn print_pretty(report: &RunReport) {
    for violation in &report.result.violations {
        let diagnostic = Report::new(ViolationDiagnostic::from(violation));
        let source = violation
            .location
            .file
            .as_ref()
            .and_then(|file| report.sources.get(file).map(|text| (file, text)));
        match source {
            Some((file, text)) => {
                let named = NamedSource::new(file.display().to_string(), text.clone());
                println!("{:?}", diagnostic.with_source_code(named));
            }
            None => println!("{diagnostic:?}"),
        }
    }
    print_failures(report);

    let (errors, warnings, infos) = report.result.count_by_severity();
    println!(
        "Found {} error(s), {} warning(s), {} info(s) in {} file(s)",
        errors, warnings, infos, report.result.files_checked
    );
}
