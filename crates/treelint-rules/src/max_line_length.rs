//! Rule to limit the length of lines.
//!
//! # Rationale
//!
//! Long lines are hard to read side by side and in reviews.
//!
//! # Detected Patterns
//!
//! - Lines longer than `max_line_length` characters
//!
//! # Allowed Patterns
//!
//! - `package` and `import` lines
//!
//! # Configuration
//!
//! - `max_line_length`: a positive number, or `off` (default)
//!
//! A line is measured when the leaf holding its line break is visited. The
//! rule runs after `no-trailing-spaces`, which trims that leaf first, so a
//! formatting pass measures lines without their trailing whitespace. The last
//! line, if it has no line break, is measured after the whole tree.

use tracing::debug;
use treelint_core::{
    NodeId, Rule, RuleDescriptor, RuleError, RuleProperties, RunAfterMode, Tree, VisitContext,
    MAX_LINE_LENGTH_PROPERTY,
};

use crate::no_trailing_spaces;

/// Rule name for max-line-length.
pub const NAME: &str = "max-line-length";

/// Reports lines over the configured length. Not autocorrectable.
#[derive(Debug, Clone)]
pub struct MaxLineLength {
    max_line_length: usize,
}

impl MaxLineLength {
    /// Creates a new rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_line_length: MAX_LINE_LENGTH_PROPERTY.default_value(),
        }
    }
}

impl Default for MaxLineLength {
    fn default() -> Self {
        Self::new()
    }
}

fn is_directive(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("package ") || line.starts_with("import ")
}

/// Returns the start offset and text of the line that ends at byte `end` of
/// `leaf`, reading backwards to the previous line break.
fn line_ending_at(tree: &Tree, leaf: NodeId, end: usize) -> (usize, String) {
    let text = tree.leaf_text(leaf).unwrap_or_default();
    let leaf_start = tree.start_offset(leaf);
    let head = &text[..end];
    if let Some(newline) = head.rfind('\n') {
        return (leaf_start + newline + 1, head[newline + 1..].to_string());
    }

    let mut start = leaf_start;
    let mut parts = vec![head];
    let mut previous = tree.prev_leaf(leaf);
    while let Some(current) = previous {
        let text = tree.leaf_text(current).unwrap_or_default();
        if let Some(newline) = text.rfind('\n') {
            let tail = &text[newline + 1..];
            start -= tail.len();
            parts.push(tail);
            break;
        }
        start -= text.len();
        parts.push(text);
        previous = tree.prev_leaf(current);
    }
    parts.reverse();
    (start, parts.concat())
}

impl MaxLineLength {
    fn is_too_long(&self, line: &str) -> bool {
        let content = line.trim_end_matches('\r');
        content.chars().count() > self.max_line_length && !is_directive(content)
    }

    fn report(&self, ctx: &mut VisitContext<'_>, line_starts: Vec<usize>) {
        for offset in line_starts {
            ctx.emit(
                offset,
                format!("Exceeded max line length ({})", self.max_line_length),
                false,
            );
        }
    }
}

impl Rule for MaxLineLength {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(NAME)
            .description("Limits the number of characters on a line")
            .uses_property(MAX_LINE_LENGTH_PROPERTY.name())
            .run_after(
                no_trailing_spaces::NAME,
                RunAfterMode::RegardlessOfLoadedOrEnabled,
            )
    }

    fn before_first_node(&mut self, properties: &RuleProperties<'_>) -> Result<(), RuleError> {
        self.max_line_length = properties.get(&MAX_LINE_LENGTH_PROPERTY)?;
        if self.max_line_length == usize::MAX {
            debug!(rule = %properties.rule_id(), "max_line_length is off");
        }
        Ok(())
    }

    fn before_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        if self.max_line_length == usize::MAX {
            return Ok(());
        }
        let tree = ctx.tree();
        let Some(text) = tree.leaf_text(node) else {
            return Ok(());
        };
        let long_lines: Vec<usize> = text
            .match_indices('\n')
            .map(|(end, _)| line_ending_at(tree, node, end))
            .filter(|(_, line)| self.is_too_long(line))
            .map(|(start, _)| start)
            .collect();
        self.report(ctx, long_lines);
        Ok(())
    }

    fn after_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        let tree = ctx.tree();
        if node != tree.root() || self.max_line_length == usize::MAX {
            return Ok(());
        }
        let Some(last) = tree.last_leaf(node) else {
            return Ok(());
        };
        let text = tree.leaf_text(last).unwrap_or_default();
        if text.ends_with('\n') {
            return Ok(());
        }
        let (start, line) = line_ending_at(tree, last, text.len());
        if self.is_too_long(&line) {
            self.report(ctx, vec![start]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{lint, lint_with, positions};
    use treelint_core::RuleProvider;

    fn provider() -> RuleProvider {
        RuleProvider::of::<MaxLineLength>()
    }

    #[test]
    fn test_off_by_default() {
        assert!(lint(provider(), &format!("val a = \"{}\"\n", "x".repeat(500))).is_empty());
    }

    #[test]
    fn test_detects_long_lines() {
        let text = "val short = 1\nval longer_name = 1\nval ok = 2\n";
        let violations = lint_with(provider(), &[("max_line_length", "14")], text);
        assert_eq!(positions(&violations), vec![(2, 1)]);
        assert_eq!(violations[0].message, "Exceeded max line length (14)");
        assert!(!violations[0].can_be_autocorrected);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let violations = lint_with(provider(), &[("max_line_length", "9")], "a = \"äöü\"\n");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_ignores_directives() {
        let text = "package com.example.some.deeply.nested\nimport com.example.Thing\n";
        assert!(lint_with(provider(), &[("max_line_length", "10")], text).is_empty());
    }

    #[test]
    fn test_checks_every_line_of_a_leaf_and_the_last_line() {
        let text = "val a = 1\n/* a long\ncomment here */\n\nval bbbbbbbbbbbb = 2";
        let violations = lint_with(provider(), &[("max_line_length", "9")], text);
        assert_eq!(positions(&violations), vec![(3, 1), (5, 1)]);
        assert_eq!(violations[0].location.offset, 20);
    }

    #[test]
    fn test_measures_lines_after_trailing_spaces_are_trimmed() {
        use crate::NoTrailingSpaces;
        use treelint_core::{Code, RuleEngine};

        let engine = RuleEngine::builder()
            .rule_provider(RuleProvider::of::<MaxLineLength>())
            .rule_provider(RuleProvider::of::<NoTrailingSpaces>())
            .override_property("max_line_length", "9")
            .verify_mutation_region(true)
            .build()
            .unwrap();
        let outcome = engine
            .format(&Code::from_text("val a = 1      \nval b = 2\n"))
            .unwrap();
        assert_eq!(outcome.text(), "val a = 1\nval b = 2\n");
        assert_eq!(outcome.corrected, 1);
        assert!(outcome.violations.is_empty());

        let lint = engine
            .lint(&Code::from_text("val a = 1      \nval b = 2\n"))
            .unwrap();
        assert_eq!(lint.violations.len(), 2);
    }

    #[test]
    fn test_runs_after_trailing_spaces() {
        let descriptor = MaxLineLength::new().descriptor();
        assert_eq!(
            descriptor.run_after[0].rule_id.to_string(),
            "standard:no-trailing-spaces"
        );
        assert_eq!(
            descriptor.run_after[0].mode,
            RunAfterMode::RegardlessOfLoadedOrEnabled
        );
    }
}
