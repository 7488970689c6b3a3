//! Comment-based allowance directives.
//!
//! Supports directives like:
//! ```text
//! // treelint: allow(no-var, standard:max-line-length)
//! /* treelint: allow-file(comment-spacing) */
//! ```
//!
//! `allow(...)` covers the comment's own line and the line after it;
//! `allow-file(...)` covers the whole file. `all` matches every rule.

use std::collections::HashSet;

use crate::rule::RuleId;
use crate::tree::{NodeId, Tree};

/// Reach of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveScope {
    /// The comment's line and the next one.
    Lines,
    /// The whole file.
    File,
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Rule names that are allowed, as written.
    pub rules: HashSet<String>,
    /// Reach of the directive.
    pub scope: DirectiveScope,
}

impl AllowDirective {
    /// Returns true if the directive names `rule` (or `all`).
    #[must_use]
    pub fn allows(&self, rule: &RuleId) -> bool {
        self.rules
            .iter()
            .any(|name| name == "all" || RuleId::from(name.as_str()) == *rule)
    }
}

/// Suppressions collected from every comment of a tree.
///
/// Line directives remember their comment node, so their line follows the
/// tree as it is edited. Rebuild the suppressions when
/// [`Tree::comment_revision`] moves.
#[derive(Debug, Clone, Default)]
pub struct Suppressions {
    file: Vec<AllowDirective>,
    lines: Vec<(NodeId, AllowDirective)>,
}

impl Suppressions {
    /// Scans the comment leaves of `tree`.
    #[must_use]
    pub fn from_tree(tree: &Tree) -> Self {
        let mut suppressions = Self::default();
        for leaf in tree.leaves(tree.root()) {
            if !tree.kind(leaf).is_comment() {
                continue;
            }
            let text = tree.leaf_text(leaf).unwrap_or_default();
            if let Some(directive) = parse_allow_directive(text) {
                match directive.scope {
                    DirectiveScope::File => suppressions.file.push(directive),
                    DirectiveScope::Lines => suppressions.lines.push((leaf, directive)),
                }
            }
        }
        suppressions
    }

    /// Returns true if `rule` is suppressed on `line` (1-indexed) of `tree`.
    #[must_use]
    pub fn is_suppressed(&self, tree: &Tree, rule: &RuleId, line: usize) -> bool {
        if self.file.iter().any(|d| d.allows(rule)) {
            return true;
        }
        self.lines
            .iter()
            .filter(|(node, directive)| tree.is_attached(*node) && directive.allows(rule))
            .any(|(node, _)| {
                let (directive_line, _) = tree.line_column(tree.start_offset(*node));
                line == directive_line || line == directive_line + 1
            })
    }

    /// Returns true if the tree has no directive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file.is_empty() && self.lines.is_empty()
    }
}

/// Parses an allowance directive from the text of a comment.
#[must_use]
pub fn parse_allow_directive(comment: &str) -> Option<AllowDirective> {
    let comment = comment.trim();

    let comment_content = if let Some(rest) = comment.strip_prefix("//") {
        rest.trim()
    } else if let Some(rest) = comment.strip_prefix("/*") {
        rest.strip_suffix("*/").unwrap_or(rest).trim()
    } else {
        return None;
    };

    let directive = comment_content.strip_prefix("treelint:")?.trim();
    let (scope, allow_content) = if let Some(rest) = directive.strip_prefix("allow-file(") {
        (DirectiveScope::File, rest)
    } else {
        (DirectiveScope::Lines, directive.strip_prefix("allow(")?)
    };

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    Some(AllowDirective { rules, scope })
}
