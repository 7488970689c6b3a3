//! Rule to forbid spaces around `.`.
//!
//! # Rationale
//!
//! Member access reads as one unit. `foo . bar` looks like an operator
//! expression.
//!
//! # Detected Patterns
//!
//! - Spaces before a `.` on the same line
//! - Any whitespace after a `.`
//!
//! # Allowed Patterns
//!
//! - A line break before `.` (chained calls)
//!
//! # Suppression
//!
//! - `// treelint: allow(dot-spacing)` comment

use treelint_core::{ElementKind, NodeId, Rule, RuleDescriptor, RuleError, VisitContext};

/// Rule name for dot-spacing.
pub const NAME: &str = "dot-spacing";

/// Removes whitespace around member-access dots.
///
/// The rule works on the whitespace node itself so that the fix never
/// touches text before the visited node.
#[derive(Debug, Clone, Default)]
pub struct DotSpacing;

impl DotSpacing {
    /// Creates a new rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for DotSpacing {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(NAME).description("Forbids spaces around `.`")
    }

    fn before_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        let tree = ctx.tree();
        if tree.kind(node) != ElementKind::Whitespace {
            return Ok(());
        }
        let is_dot = |leaf: Option<NodeId>| leaf.is_some_and(|l| tree.kind(l) == ElementKind::Dot);

        let message = if is_dot(tree.prev_leaf(node)) {
            "Unexpected spacing after \".\""
        } else if is_dot(tree.next_leaf(node))
            && !tree.leaf_text(node).unwrap_or_default().contains('\n')
        {
            "Unexpected spacing before \".\""
        } else {
            return Ok(());
        };

        let offset = tree.start_offset(node);
        if ctx.emit(offset, message, true).is_allowed() {
            ctx.tree_mut().remove(node)?;
        }
        Ok(())
    }
}
