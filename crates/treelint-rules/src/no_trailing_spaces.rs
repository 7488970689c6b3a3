//! Rule to forbid trailing whitespace.
//!
//! # Rationale
//!
//! Trailing whitespace is invisible in most editors and produces noisy diffs.
//!
//! # Detected Patterns
//!
//! - Spaces or tabs before a line break
//! - Spaces or tabs at the end of the file
//! - Spaces or tabs at the end of a `//` comment
//!
//! # Suppression
//!
//! - `// treelint: allow(no-trailing-spaces)` comment

use std::ops::Range;

use treelint_core::{ElementKind, NodeId, Rule, RuleDescriptor, RuleError, VisitContext};

/// Rule name for no-trailing-spaces.
pub const NAME: &str = "no-trailing-spaces";

const MESSAGE: &str = "Trailing space(s)";

/// Removes spaces and tabs at the end of lines.
#[derive(Debug, Clone, Default)]
pub struct NoTrailingSpaces;

impl NoTrailingSpaces {
    /// Creates a new rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Byte ranges of trailing runs inside a whitespace leaf.
fn trailing_runs(text: &str, at_end_of_file: bool) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut line_start = 0;
    for (i, c) in text.char_indices() {
        if c == '\n' {
            let line = text[line_start..i].trim_end_matches('\r');
            let kept = line.trim_end_matches(is_blank).len();
            if kept < line.len() {
                runs.push(line_start + kept..line_start + line.len());
            }
            line_start = i + 1;
        }
    }
    if at_end_of_file && line_start < text.len() {
        runs.push(line_start..text.len());
    }
    runs
}

fn without(text: &str, removed: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for range in removed {
        out.push_str(&text[pos..range.start]);
        pos = range.end;
    }
    out.push_str(&text[pos..]);
    out
}

impl Rule for NoTrailingSpaces {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(NAME).description("Forbids spaces and tabs at the end of a line")
    }

    fn before_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        let tree = ctx.tree();
        let text = tree.leaf_text(node).unwrap_or_default().to_string();
        let runs = match tree.kind(node) {
            ElementKind::Whitespace => trailing_runs(&text, tree.next_leaf(node).is_none()),
            ElementKind::EolComment => {
                let kept = text.trim_end_matches(is_blank).len();
                if kept < text.len() {
                    vec![kept..text.len()]
                } else {
                    Vec::new()
                }
            }
            _ => return Ok(()),
        };
        if runs.is_empty() {
            return Ok(());
        }

        let start = tree.start_offset(node);
        let mut fixed = Vec::new();
        for run in runs {
            if ctx.emit(start + run.start, MESSAGE, true).is_allowed() {
                fixed.push(run);
            }
        }
        if fixed.is_empty() {
            return Ok(());
        }

        let replacement = without(&text, &fixed);
        if replacement.is_empty() {
            ctx.tree_mut().remove(node)?;
        } else {
            ctx.tree_mut().replace_text(node, replacement)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{format, lint, positions};
    use treelint_core::RuleProvider;

    #[test]
    fn test_trailing_runs() {
        assert_eq!(trailing_runs("  \n\t\n  ", false), vec![0..2, 3..4]);
        assert_eq!(trailing_runs("\n  ", true), vec![1..3]);
        assert_eq!(trailing_runs(" \r\n", false), vec![0..1]);
        assert!(trailing_runs("\n    ", false).is_empty());
    }

    #[test]
    fn test_detects_spaces_before_newline() {
        let violations = lint(RuleProvider::of::<NoTrailingSpaces>(), "val a = 1  \nval b = 2\n");
        assert_eq!(positions(&violations), vec![(1, 10)]);
        assert_eq!(violations[0].message, "Trailing space(s)");
    }

    #[test]
    fn test_detects_blank_lines_with_spaces() {
        let violations = lint(RuleProvider::of::<NoTrailingSpaces>(), "a\n   \n\t\nb\n");
        assert_eq!(positions(&violations), vec![(2, 1), (3, 1)]);
    }

    #[test]
    fn test_detects_comment_and_end_of_file() {
        let violations = lint(RuleProvider::of::<NoTrailingSpaces>(), "a // note  \nb  ");
        assert_eq!(positions(&violations), vec![(1, 10), (2, 2)]);
    }

    #[test]
    fn test_allows_indentation() {
        let text = "fun f() {\n    g()\n}\n";
        assert!(lint(RuleProvider::of::<NoTrailingSpaces>(), text).is_empty());
    }

    #[test]
    fn test_format_strips_trailing_spaces() {
        let formatted = format(
            RuleProvider::of::<NoTrailingSpaces>(),
            "fun f() {  \n    g() // call \t\n  \n}  ",
        );
        assert_eq!(formatted, "fun f() {\n    g() // call\n\n}");
    }
}
