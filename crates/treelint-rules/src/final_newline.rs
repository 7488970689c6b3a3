//! Rule to enforce the `insert_final_newline` setting.
//!
//! # Rationale
//!
//! Many tools expect text files to end with a line break, and a missing one
//! shows up in every diff touching the last line.
//!
//! # Detected Patterns
//!
//! - A non-empty file without a final `\n` when `insert_final_newline = true`
//! - A file ending with `\n` when `insert_final_newline = false`
//!
//! # Configuration
//!
//! - `insert_final_newline`: `true` (default) or `false`

use treelint_core::{
    ElementKind, NodeId, Rule, RuleDescriptor, RuleError, RuleProperties, VisitContext,
    INSERT_FINAL_NEWLINE_PROPERTY,
};

/// Rule name for final-newline.
pub const NAME: &str = "final-newline";

/// Adds or removes the line break at the end of the file.
#[derive(Debug, Clone)]
pub struct FinalNewline {
    insert_final_newline: bool,
}

impl FinalNewline {
    /// Creates a new rule instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            insert_final_newline: INSERT_FINAL_NEWLINE_PROPERTY.default_value(),
        }
    }

    fn require_newline(ctx: &mut VisitContext<'_>, root: NodeId, text: &str) -> Result<(), RuleError> {
        if text.ends_with('\n') {
            return Ok(());
        }
        let last_char = text.chars().last().map_or(0, char::len_utf8);
        let offset = text.len() - last_char;
        if !ctx
            .emit(offset, "File must end with a newline (\\n)", true)
            .is_allowed()
        {
            return Ok(());
        }
        let tree = ctx.tree_mut();
        match tree.last_leaf(root) {
            Some(last) if tree.kind(last) == ElementKind::Whitespace => {
                let whitespace = tree.leaf_text(last).unwrap_or_default();
                let replacement = format!("{whitespace}\n");
                tree.replace_text(last, replacement)?;
            }
            _ => {
                let newline = tree.new_leaf(ElementKind::Whitespace, "\n");
                tree.append_child(root, newline)?;
            }
        }
        Ok(())
    }

    fn forbid_newline(ctx: &mut VisitContext<'_>, root: NodeId, text: &str) -> Result<(), RuleError> {
        if !text.ends_with('\n') {
            return Ok(());
        }
        let Some(last) = ctx.tree().last_leaf(root) else {
            return Ok(());
        };
        if ctx.tree().kind(last) != ElementKind::Whitespace {
            return Err(RuleError::UnexpectedNode {
                offset: ctx.tree().start_offset(last),
                message: "text ends with a line break outside whitespace".to_string(),
            });
        }
        let offset = ctx.tree().start_offset(last);
        if ctx
            .emit(offset, "Redundant newline (\\n) at the end of file", true)
            .is_allowed()
        {
            ctx.tree_mut().remove(last)?;
        }
        Ok(())
    }
}

impl Default for FinalNewline {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for FinalNewline {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor::new(NAME)
            .description("Enforces or forbids a line break at the end of the file")
            .uses_property(INSERT_FINAL_NEWLINE_PROPERTY.name())
    }

    fn before_first_node(&mut self, properties: &RuleProperties<'_>) -> Result<(), RuleError> {
        self.insert_final_newline = properties.get(&INSERT_FINAL_NEWLINE_PROPERTY)?;
        Ok(())
    }

    fn before_visit_children(
        &mut self,
        _node: NodeId,
        _ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        Ok(())
    }

    fn after_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        if node != ctx.tree().root() {
            return Ok(());
        }
        let text = ctx.tree().to_text();
        if text.is_empty() {
            return Ok(());
        }
        if self.insert_final_newline {
            Self::require_newline(ctx, node, &text)
        } else {
            Self::forbid_newline(ctx, node, &text)
        }
    }
}
