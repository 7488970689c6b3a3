//! Rule to replace single-line block comments by `//` comments.
//!
//! # Rationale
//!
//! A `/* ... */` comment that ends a line is an end-of-line comment in
//! disguise.
//!
//! # Detected Patterns
//!
//! - `/* text */` followed only by spaces up to the line break or end of file
//!
//! # Allowed Patterns
//!
//! - Block comments spanning several lines
//! - Block comments followed by code on the same line
//! - Doc comments (`/** ... */`)
//!
//! # Suppression
//!
//! - `// treelint: allow(no-single-line-block-comment)` comment
//!
//! The rule is experimental and runs after `comment-spacing`, so comments it
//! creates are already well formed.

use treelint_core::{
    ElementKind, NodeId, Rule, RuleDescriptor, RuleError, RunAfterMode, Tree, VisitContext,
};

use crate::comment_spacing;

/// Rule name for no-single-line-block-comment.
pub const NAME: &str = "no-single-line-block-comment";

/// Rewrites `/* text */` at the end of a line as `// text`.
#[derive(Debug, Clone, Default)]
pub struct NoSingleLineBlockComment;

impl NoSingleLineBlockComment {
    /// Creates a new rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn ends_line(tree: &Tree, node: NodeId) -> bool {
    let mut next = tree.next_leaf(node);
    while let Some(leaf) = next {
        if tree.kind(leaf) != ElementKind::Whitespace {
            return false;
        }
        if tree.leaf_text(leaf).is_some_and(|t| t.contains('\n')) {
            return true;
        }
        next = tree.next_leaf(leaf);
    }
    true
}

impl Rule for NoSingleLineBlockComment {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(NAME)
            .experimental()
            .description("Replaces a block comment ending a line by an EOL comment")
            .run_after(
                comment_spacing::NAME,
                RunAfterMode::RegardlessOfLoadedOrEnabled,
            )
    }

    fn before_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        let tree = ctx.tree();
        if tree.kind(node) != ElementKind::BlockComment {
            return Ok(());
        }
        let text = tree.leaf_text(node).unwrap_or_default();
        let is_doc = text.starts_with("/**") && text.len() > 4;
        if text.contains('\n') || is_doc || !ends_line(tree, node) {
            return Ok(());
        }
        let content = text
            .strip_prefix("/*")
            .and_then(|t| t.strip_suffix("*/"))
            .ok_or_else(|| RuleError::UnexpectedNode {
                offset: tree.start_offset(node),
                message: format!("malformed block comment {text:?}"),
            })?
            .trim();
        let replacement = if content.is_empty() {
            "//".to_string()
        } else {
            format!("// {content}")
        };
        let needs_space = tree
            .prev_leaf(node)
            .is_some_and(|prev| !tree.kind(prev).is_whitespace());

        let offset = tree.start_offset(node);
        if ctx
            .emit(offset, "Replace the block comment with an EOL comment", true)
            .is_allowed()
        {
            let tree = ctx.tree_mut();
            if needs_space {
                let space = tree.new_leaf(ElementKind::Whitespace, " ");
                tree.insert_before(node, space)?;
            }
            tree.replace_text(node, replacement)?;
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
    fn test_detects_comment_ending_line() {
        let violations = lint(
            RuleProvider::of::<NoSingleLineBlockComment>(),
            "val a = 1 /* one */\n/* two */",
        );
        assert_eq!(positions(&violations), vec![(1, 11), (2, 1)]);
        assert_eq!(
            violations[0].message,
            "Replace the block comment with an EOL comment"
        );
    }

    #[test]
    fn test_allows_code_after_comment() {
        let text = "val a = /* one */ 1\n";
        assert!(lint(RuleProvider::of::<NoSingleLineBlockComment>(), text).is_empty());
    }

    #[test]
    fn test_allows_multiline_and_doc_comments() {
        let text = "/*\n * many\n */\n/** doc */\nval a = 1\n";
        assert!(lint(RuleProvider::of::<NoSingleLineBlockComment>(), text).is_empty());
    }

    #[test]
    fn test_is_experimental() {
        let descriptor = NoSingleLineBlockComment::new().descriptor();
        assert_eq!(descriptor.status, treelint_core::RuleStatus::Experimental);
        assert_eq!(descriptor.run_after[0].rule_id.to_string(), "standard:comment-spacing");
    }

    #[test]
    fn test_format_rewrites_comment() {
        let formatted = format(
            RuleProvider::of::<NoSingleLineBlockComment>(),
            "val a = 1/* one */  \n/**/\n",
        );
        assert_eq!(formatted, "val a = 1 // one  \n//\n");
    }
}
