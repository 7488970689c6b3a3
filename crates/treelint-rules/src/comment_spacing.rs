//! Rule to enforce spacing around `//` comments.
//!
//! # Rationale
//!
//! `// text` is easier to read than `//text`, and a comment glued to the
//! code before it is easy to miss.
//!
//! # Detected Patterns
//!
//! - `//text` without a space after the slashes
//! - `code// text` without a space before the comment
//!
//! # Allowed Patterns
//!
//! - An empty `//`
//! - `//region`, `//endregion`, `//noinspection` and `//language=` markers
//!
//! # Suppression
//!
//! - `// treelint: allow(comment-spacing)` comment

use treelint_core::{ElementKind, NodeId, Rule, RuleDescriptor, RuleError, VisitContext};

/// Rule name for comment-spacing.
pub const NAME: &str = "comment-spacing";

/// Markers that editors expect without a space.
const MARKERS: &[&str] = &["//region", "//endregion", "//noinspection", "//language="];

/// Puts a space before and after `//`.
#[derive(Debug, Clone, Default)]
pub struct CommentSpacing;

impl CommentSpacing {
    /// Creates a new rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for CommentSpacing {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(NAME).description("Requires a space before and after `//`")
    }

    fn before_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        let tree = ctx.tree();
        if tree.kind(node) != ElementKind::EolComment {
            return Ok(());
        }
        let offset = tree.start_offset(node);
        let text = tree.leaf_text(node).unwrap_or_default().to_string();
        let glued = tree
            .prev_leaf(node)
            .is_some_and(|prev| !tree.kind(prev).is_whitespace());

        if glued && ctx.emit(offset, "Missing space before //", true).is_allowed() {
            let space = ctx.tree_mut().new_leaf(ElementKind::Whitespace, " ");
            ctx.tree_mut().insert_before(node, space)?;
        }

        let missing_after = text.len() > 2
            && !text.starts_with("// ")
            && !MARKERS.iter().any(|marker| text.starts_with(marker));
        if missing_after {
            let offset = ctx.tree().start_offset(node);
            if ctx.emit(offset, "Missing space after //", true).is_allowed() {
                let body = text.strip_prefix("//").unwrap_or(&text);
                ctx.tree_mut().replace_text(node, format!("// {body}"))?;
            }
        }
        Ok(())
    }
}
