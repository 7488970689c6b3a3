//! Rule to forbid files without code.
//!
//! # Rationale
//!
//! A file holding only a package line, imports, whitespace or comments is
//! usually left over from a refactoring.
//!
//! # Detected Patterns
//!
//! - Empty files
//! - Files containing only `package`/`import` directives and trivia
//!
//! # Suppression
//!
//! - `// treelint: allow-file(no-empty-file)` comment

use treelint_core::{ElementKind, NodeId, Rule, RuleDescriptor, RuleError, VisitContext};

/// Rule name for no-empty-file.
pub const NAME: &str = "no-empty-file";

/// Reports a file that contains no code besides directives.
#[derive(Debug, Clone, Default)]
pub struct NoEmptyFile;

impl NoEmptyFile {
    /// Creates a new rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoEmptyFile {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(NAME).description("Forbids files without any code")
    }

    fn before_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        let tree = ctx.tree();
        if node != tree.root() {
            return Ok(());
        }
        let has_code = tree.children(node).iter().any(|&child| {
            let kind = tree.kind(child);
            kind.is_code()
                && kind != ElementKind::PackageDirective
                && kind != ElementKind::ImportDirective
        });
        if !has_code {
            let message = match ctx.file_path().and_then(|p| p.file_name()) {
                Some(name) => format!("File '{}' should not be empty", name.to_string_lossy()),
                None => "File should not be empty".to_string(),
            };
            ctx.emit(0, message, false);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{engine, lint};
    use treelint_core::{Code, RuleProvider};

    #[test]
    fn test_detects_empty_text() {
        let violations = lint(RuleProvider::of::<NoEmptyFile>(), "");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "File should not be empty");
        assert_eq!(violations[0].location.offset, 0);
    }

    #[test]
    fn test_detects_directives_and_comments_only() {
        let text = "package a.b\n\nimport c.D\n// nothing here\n";
        assert_eq!(lint(RuleProvider::of::<NoEmptyFile>(), text).len(), 1);
    }

    #[test]
    fn test_allows_code() {
        let text = "package a.b\n\nval x = 1\n";
        assert!(lint(RuleProvider::of::<NoEmptyFile>(), text).is_empty());
    }

    #[test]
    fn test_message_names_file() {
        let outcome = engine(RuleProvider::of::<NoEmptyFile>(), &[])
            .lint(&Code::from_file("src/Empty.kt", "\n"))
            .unwrap();
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(
            outcome.violations[0].message,
            "File 'Empty.kt' should not be empty"
        );
    }
}
