//! Rule to forbid `var` declarations.
//!
//! # Rationale
//!
//! Read-only bindings are easier to reason about. A `var` should be the
//! exception, and suppressed explicitly where it is needed.
//!
//! # Detected Patterns
//!
//! - `var` keyword anywhere in the file
//!
//! # Suppression
//!
//! - `// treelint: allow(no-var)` comment on or above the line

use treelint_core::{ElementKind, NodeId, Rule, RuleDescriptor, RuleError, VisitContext};

/// Rule name for no-var.
pub const NAME: &str = "no-var";

/// Reports every `var` keyword. Not autocorrectable.
#[derive(Debug, Clone, Default)]
pub struct NoVar;

impl NoVar {
    /// Creates a new rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoVar {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(NAME).description("Forbids `var` declarations, use `val` instead")
    }

    fn before_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        if ctx.tree().kind(node) == ElementKind::VarKeyword {
            let offset = ctx.tree().start_offset(node);
            ctx.emit(offset, "Unexpected var, use val instead", false);
        }
        Ok(())
    }
}
