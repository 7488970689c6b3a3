//! Collects the violations emitted during one traversal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::context::AutocorrectDecision;
use crate::rule::RuleId;
use crate::tree::Tree;
use crate::types::{CorrectionOutcome, Location, Severity, Violation};
use crate::utils::Suppressions;

/// Extra autocorrect policy: return false to forbid fixing a violation.
pub type AutocorrectFilter = Arc<dyn Fn(&Violation) -> bool + Send + Sync>;

/// Suppressions of the tree at one comment revision.
#[derive(Debug)]
struct DirectiveCache {
    comment_revision: u64,
    suppressions: Suppressions,
}

/// Violation sink of one traversal.
///
/// An allowed emission is settled when the emitting hook returns: if the
/// tree revision moved past the revision seen at emit time, the violation is
/// corrected. Otherwise it stays reported as not corrected.
pub(crate) struct ViolationCollector {
    autocorrect: bool,
    filter: Option<AutocorrectFilter>,
    file: Option<PathBuf>,
    violations: Vec<Violation>,
    pending: Vec<(usize, u64)>,
    directives: Option<DirectiveCache>,
}

impl ViolationCollector {
    pub(crate) fn new(
        autocorrect: bool,
        filter: Option<AutocorrectFilter>,
        file: Option<PathBuf>,
    ) -> Self {
        Self {
            autocorrect,
            filter,
            file,
            violations: Vec::new(),
            pending: Vec::new(),
            directives: None,
        }
    }

    pub(crate) fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    fn suppressions(&mut self, tree: &Tree) -> &Suppressions {
        if self
            .directives
            .as_ref()
            .map_or(true, |d| d.comment_revision != tree.comment_revision())
        {
            self.directives = None;
        }
        &self
            .directives
            .get_or_insert_with(|| DirectiveCache {
                comment_revision: tree.comment_revision(),
                suppressions: Suppressions::from_tree(tree),
            })
            .suppressions
    }

    pub(crate) fn emit(
        &mut self,
        tree: &Tree,
        rule_id: &RuleId,
        severity: Severity,
        offset: usize,
        message: String,
        can_be_autocorrected: bool,
    ) -> AutocorrectDecision {
        let (line, column) = tree.line_column(offset);
        if self.suppressions(tree).is_suppressed(tree, rule_id, line) {
            debug!(rule = %rule_id, line, column, "violation suppressed by directive");
            return AutocorrectDecision::NoAutocorrect;
        }

        let location = Location::new(line, column, offset).with_file(self.file.clone());
        let mut violation = Violation::new(
            rule_id.clone(),
            severity,
            location,
            message,
            can_be_autocorrected,
        );

        let decision = if !self.autocorrect {
            AutocorrectDecision::NoAutocorrect
        } else if !can_be_autocorrected {
            violation.outcome = Some(CorrectionOutcome::NotCorrected);
            AutocorrectDecision::NoAutocorrect
        } else if self.filter.as_ref().is_some_and(|allow| !allow(&violation)) {
            violation.outcome = Some(CorrectionOutcome::CorrectionNotAllowed);
            AutocorrectDecision::NoAutocorrect
        } else {
            violation.outcome = Some(CorrectionOutcome::NotCorrected);
            self.pending.push((self.violations.len(), tree.revision()));
            AutocorrectDecision::Allow
        };

        self.violations.push(violation);
        decision
    }

    /// Settles the allowed emissions of the hook that just returned.
    pub(crate) fn settle(&mut self, tree: &Tree) {
        for (index, revision) in self.pending.drain(..) {
            let Some(violation) = self.violations.get_mut(index) else {
                continue;
            };
            if tree.revision() > revision {
                violation.outcome = Some(CorrectionOutcome::Corrected);
            } else {
                debug!(
                    rule = %violation.rule_id,
                    offset = violation.location.offset,
                    "autocorrect was allowed but the tree did not change"
                );
            }
        }
    }

    /// Number of violations that will be reported.
    pub(crate) fn reported(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.outcome != Some(CorrectionOutcome::Corrected))
            .count()
    }

    /// Returns the reported violations, sorted by position then rule, and the
    /// number of corrected ones.
    pub(crate) fn finish(self) -> (Vec<Violation>, usize) {
        let (corrected, mut reported): (Vec<_>, Vec<_>) = self
            .violations
            .into_iter()
            .partition(|v| v.outcome == Some(CorrectionOutcome::Corrected));
        reported.sort_by(|a, b| {
            (a.location.line, a.location.column, &a.rule_id).cmp(&(
                b.location.line,
                b.location.column,
                &b.rule_id,
            ))
        });
        (reported, corrected.len())
    }
}

impl std::fmt::Debug for ViolationCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViolationCollector")
            .field("autocorrect", &self.autocorrect)
            .field("file", &self.file)
            .field("violations", &self.violations.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ElementKind;
    use crate::parser::{Parser, SourceParser};

    fn tree(source: &str) -> Tree {
        SourceParser::new().parse(source).unwrap()
    }

    fn emit(collector: &mut ViolationCollector, tree: &Tree, offset: usize) -> AutocorrectDecision {
        collector.emit(
            tree,
            &RuleId::from("no-var"),
            Severity::Error,
            offset,
            "msg".to_string(),
            true,
        )
    }

    #[test]
    fn lint_mode_never_allows() {
        let tree = tree("var a = 1\n");
        let mut collector = ViolationCollector::new(false, None, None);
        assert_eq!(emit(&mut collector, &tree, 0), AutocorrectDecision::NoAutocorrect);
        let (violations, corrected) = collector.finish();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].outcome, None);
        assert_eq!(corrected, 0);
    }

    #[test]
    fn allowed_and_mutated_is_corrected() {
        let mut tree = tree("var a = 1\n");
        let mut collector = ViolationCollector::new(true, None, None);
        assert!(emit(&mut collector, &tree, 0).is_allowed());

        let keyword = tree.first_leaf(tree.root()).unwrap();
        tree.replace_text(keyword, "val").unwrap();
        collector.settle(&tree);

        assert_eq!(collector.reported(), 0);
        let (violations, corrected) = collector.finish();
        assert!(violations.is_empty());
        assert_eq!(corrected, 1);
    }

    #[test]
    fn allowed_without_mutation_stays_reported() {
        let tree = tree("var a = 1\n");
        let mut collector = ViolationCollector::new(true, None, None);
        assert!(emit(&mut collector, &tree, 0).is_allowed());
        collector.settle(&tree);

        let (violations, corrected) = collector.finish();
        assert_eq!(corrected, 0);
        assert_eq!(violations[0].outcome, Some(CorrectionOutcome::NotCorrected));
    }

    #[test]
    fn filter_can_forbid_correction() {
        let tree = tree("var a = 1\n");
        let filter: AutocorrectFilter = Arc::new(|v| v.location.line > 1);
        let mut collector = ViolationCollector::new(true, Some(filter), None);
        assert!(!emit(&mut collector, &tree, 0).is_allowed());
        let (violations, _) = collector.finish();
        assert_eq!(
            violations[0].outcome,
            Some(CorrectionOutcome::CorrectionNotAllowed)
        );
    }

    #[test]
    fn suppressed_violations_are_dropped() {
        let tree = tree("// treelint: allow(no-var)\nvar a = 1\n");
        let mut collector = ViolationCollector::new(true, None, None);
        let offset = tree.to_text().find("var").unwrap();
        assert!(!emit(&mut collector, &tree, offset).is_allowed());
        assert_eq!(collector.reported(), 0);
    }

    #[test]
    fn suppressions_follow_tree_changes() {
        let mut tree = tree("var a = 1\n");
        let mut collector = ViolationCollector::new(false, None, None);
        emit(&mut collector, &tree, 0);

        let comment = tree.new_leaf(ElementKind::EolComment, "// treelint: allow-file(all)");
        let root = tree.root();
        tree.append_child(root, comment).unwrap();
        emit(&mut collector, &tree, 0);

        assert_eq!(collector.reported(), 1);
    }

    #[test]
    fn line_directives_move_with_inserted_lines() {
        let mut tree = tree("// treelint: allow(no-var)\nvar a = 1\n");
        let mut collector = ViolationCollector::new(false, None, None);
        let var = tree.to_text().find("var").unwrap();
        emit(&mut collector, &tree, var);

        let first = tree.first_leaf(tree.root()).unwrap();
        let blank = tree.new_leaf(ElementKind::Whitespace, "\n");
        tree.insert_before(first, blank).unwrap();
        emit(&mut collector, &tree, var + 1);

        assert_eq!(collector.reported(), 0);
    }

    #[test]
    fn finish_sorts_by_position_then_rule() {
        let tree = tree("var a = 1\nvar b = 2\n");
        let mut collector = ViolationCollector::new(false, None, None);
        for (rule, offset) in [("b-rule", 10), ("z-rule", 0), ("a-rule", 10)] {
            collector.emit(
                &tree,
                &RuleId::from(rule),
                Severity::Warning,
                offset,
                String::new(),
                false,
            );
        }
        let (violations, _) = collector.finish();
        let order: Vec<String> = violations.iter().map(|v| v.rule_id.to_string()).collect();
        assert_eq!(
            order,
            vec!["standard:z-rule", "standard:a-rule", "standard:b-rule"]
        );
        assert_eq!(violations[1].location.line, 2);
        assert_eq!(violations[1].location.column, 1);
    }
}
