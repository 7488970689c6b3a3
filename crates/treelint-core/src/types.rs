//! Core types for lint violations and results.

use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::rule::RuleId;

/// Severity level for lint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl Severity {
    /// Parses `info`, `warning` or `error`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location of a violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path, when linting a file rather than a snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in characters).
    pub column: usize,
    /// Byte offset in the text at the time the violation was emitted.
    pub offset: usize,
}

impl Location {
    /// Creates a new location.
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            file: None,
            line,
            column,
            offset,
        }
    }

    /// Sets the file path.
    #[must_use]
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }
}

/// What happened to a violation in autocorrect mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionOutcome {
    /// The rule fixed it.
    Corrected,
    /// The rule cannot fix it, or was allowed to and did not change the tree.
    NotCorrected,
    /// The rule could fix it but the autocorrect policy said no.
    CorrectionNotAllowed,
}

/// A lint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that emitted it.
    pub rule_id: RuleId,
    /// Severity of this violation.
    pub severity: Severity,
    /// Where it was found.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Whether the rule is able to fix it.
    pub can_be_autocorrected: bool,
    /// Outcome when autocorrection was requested; `None` in lint mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CorrectionOutcome>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        rule_id: RuleId,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
        can_be_autocorrected: bool,
    ) -> Self {
        Self {
            rule_id,
            severity,
            location,
            message: message.into(),
            can_be_autocorrected,
            outcome: None,
        }
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let file = self
            .location
            .file
            .as_ref()
            .map_or_else(|| "<text>".to_string(), |f| f.display().to_string());
        let mut output = format!(
            "{} at {}:{}:{}\n",
            self.rule_id, file, self.location.line, self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        if self.can_be_autocorrected {
            let _ = writeln!(output, "  = help: can be fixed with `treelint format`");
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.location.file {
            write!(f, "{}:", file.display())?;
        }
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.location.line, self.location.column, self.severity, self.rule_id, self.message
        )?;
        if self.can_be_autocorrected {
            write!(f, " (fixable)")?;
        }
        Ok(())
    }
}

/// Converts a Violation to a miette Diagnostic for rich error display.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl From<&Violation> for ViolationDiagnostic {
    fn from(v: &Violation) -> Self {
        Self {
            message: format!("[{}] {}", v.rule_id, v.message),
            help: v
                .can_be_autocorrected
                .then(|| "can be fixed with `treelint format`".to_string()),
            span: SourceSpan::from((v.location.offset, 1)),
            label_message: v.severity.to_string(),
        }
    }
}

/// A rule hook that failed and was isolated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    /// Failing rule.
    pub rule_id: RuleId,
    /// Hook that failed (`before_visit_children`, ...).
    pub hook: String,
    /// Offset of the visited node, for visit hooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Error message.
    pub message: String,
}

impl std::fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule {} failed in {}", self.rule_id, self.hook)?;
        if let Some(offset) = self.offset {
            write!(f, " at offset {offset}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Result of linting or formatting several files.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All remaining violations.
    pub violations: Vec<Violation>,
    /// Number of files checked.
    pub files_checked: usize,
    /// Number of violations fixed by autocorrection.
    pub corrected: usize,
    /// Files whose text was changed by autocorrection.
    pub files_changed: usize,
    /// Rule hooks that failed.
    pub rule_failures: Vec<RuleFailure>,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == Severity::Error)
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Counts violations by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |s: Severity| self.violations.iter().filter(|v| v.severity == s).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Formats a summary report.
    #[must_use]
    pub fn format_report(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        for violation in &self.violations {
            let _ = writeln!(report, "{}", violation.format());
        }
        for failure in &self.rule_failures {
            let _ = writeln!(report, "{failure}");
        }

        let (errors, warnings, infos) = self.count_by_severity();
        let _ = write!(
            report,
            "Found {} error(s), {} warning(s), {} info(s) in {} file(s)",
            errors, warnings, infos, self.files_checked
        );
        if self.corrected > 0 {
            let _ = write!(
                report,
                "; fixed {} violation(s) in {} file(s)",
                self.corrected, self.files_changed
            );
        }
        report.push('\n');
        report
    }

    /// Adds violations from another result.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
        self.files_checked += other.files_checked;
        self.corrected += other.corrected;
        self.files_changed += other.files_changed;
        self.rule_failures.extend(other.rule_failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new(
            RuleId::from("no-var"),
            severity,
            Location::new(3, 5, 20).with_file(Some(PathBuf::from("src/a.kt"))),
            "Unexpected var, use val instead",
            false,
        )
    }

    #[test]
    fn display_includes_position_and_rule() {
        let v = make_violation(Severity::Error);
        assert_eq!(
            v.to_string(),
            "src/a.kt:3:5: error [standard:no-var] Unexpected var, use val instead"
        );
    }

    #[test]
    fn fixable_violations_are_marked() {
        let mut v = make_violation(Severity::Warning);
        v.can_be_autocorrected = true;
        assert!(v.to_string().ends_with("(fixable)"));
        assert!(v.format().contains("= help:"));
    }

    #[test]
    fn severity_parse() {
        assert_eq!(Severity::parse("Warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse("fatal"), None);
    }

    #[test]
    fn has_violations_at_error_only() {
        let mut result = LintResult::new();
        result.violations.push(make_violation(Severity::Warning));
        assert!(!result.has_violations_at(Severity::Error));
        assert!(result.has_violations_at(Severity::Warning));
        assert!(!result.has_errors());
    }

    #[test]
    fn report_summarizes_counts_and_fixes() {
        let mut result = LintResult::new();
        result.files_checked = 2;
        result.violations.push(make_violation(Severity::Error));
        result.violations.push(make_violation(Severity::Info));
        result.corrected = 3;
        result.files_changed = 1;

        let report = result.format_report();
        assert!(report.contains("Found 1 error(s), 0 warning(s), 1 info(s) in 2 file(s)"));
        assert!(report.contains("fixed 3 violation(s) in 1 file(s)"));
    }

    #[test]
    fn extend_accumulates() {
        let mut a = LintResult::new();
        a.files_checked = 1;
        let mut b = LintResult::new();
        b.files_checked = 2;
        b.corrected = 1;
        b.violations.push(make_violation(Severity::Error));
        a.extend(b);
        assert_eq!(a.files_checked, 3);
        assert_eq!(a.corrected, 1);
        assert_eq!(a.violations.len(), 1);
    }
}
