//! Depth-first traversal running the active rules over one tree.

use std::fmt;

use tracing::{debug, warn};

use crate::config::scope::EffectiveConfig;
use crate::context::{RuleProperties, VisitContext};
use crate::error::{ConfigurationError, RuleError};
use crate::registry::{ActiveRule, ActiveRuleSet};
use crate::rule::RuleBox;
use crate::tree::{NodeId, Tree};
use crate::types::{RuleFailure, Violation};
use crate::violation::ViolationCollector;

/// Lifecycle of a [`Traversal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TraversalState {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    BeforeFirstNode,
    BeforeVisitChildren,
    AfterVisitChildren,
    AfterLastNode,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BeforeFirstNode => "before_first_node",
            Self::BeforeVisitChildren => "before_visit_children",
            Self::AfterVisitChildren => "after_visit_children",
            Self::AfterLastNode => "after_last_node",
        })
    }
}

struct Slot<'r> {
    rule: RuleBox,
    active: &'r ActiveRule,
    suspended: bool,
}

/// What one traversal produced.
#[derive(Debug, Default)]
pub(crate) struct TraversalReport {
    pub(crate) violations: Vec<Violation>,
    pub(crate) corrected: usize,
    pub(crate) rule_failures: Vec<RuleFailure>,
    pub(crate) stopped_early: bool,
    pub(crate) fatal: Option<ConfigurationError>,
}

/// One pre-order walk of a tree with fresh rule instances.
///
/// At every node the before-children hooks run in active order, then the
/// children are visited as they exist at that moment, then the
/// after-children hooks run in reverse order. Children are re-read by
/// position after each child, so nodes inserted by a rule are visited and
/// removed ones are skipped.
pub(crate) struct Traversal<'r> {
    state: TraversalState,
    slots: Vec<Slot<'r>>,
    config: &'r EffectiveConfig,
    collector: ViolationCollector,
    failures: Vec<RuleFailure>,
    stop_on_first_violation: bool,
    verify_mutation_region: bool,
    stopped: bool,
    fatal: Option<ConfigurationError>,
}

impl<'r> Traversal<'r> {
    pub(crate) fn new(
        rules: &'r ActiveRuleSet,
        config: &'r EffectiveConfig,
        collector: ViolationCollector,
    ) -> Self {
        let slots = rules
            .rules()
            .iter()
            .map(|active| Slot {
                rule: active.provider.create(),
                active,
                suspended: false,
            })
            .collect();
        Self {
            state: TraversalState::NotStarted,
            slots,
            config,
            collector,
            failures: Vec::new(),
            stop_on_first_violation: false,
            verify_mutation_region: false,
            stopped: false,
            fatal: None,
        }
    }

    /// Stops at the next node boundary once a violation was reported.
    pub(crate) fn stop_on_first_violation(mut self, stop: bool) -> Self {
        self.stop_on_first_violation = stop;
        self
    }

    /// Fails a hook that changed the text before the visited node.
    pub(crate) fn verify_mutation_region(mut self, verify: bool) -> Self {
        self.verify_mutation_region = verify;
        self
    }

    /// Walks the tree. Does nothing unless the traversal is fresh.
    pub(crate) fn run(&mut self, tree: &mut Tree) {
        if self.state != TraversalState::NotStarted {
            warn!("Traversal already ran, ignoring");
            return;
        }
        self.state = TraversalState::InProgress;
        debug!("Traversal started with {} rules", self.slots.len());

        let root = tree.root();
        for index in 0..self.slots.len() {
            if self.stopped {
                break;
            }
            self.run_hook(index, Hook::BeforeFirstNode, tree, root);
        }
        if !self.stopped {
            self.visit(tree, root);
        }
        if !self.stopped {
            for index in 0..self.slots.len() {
                self.run_hook(index, Hook::AfterLastNode, tree, root);
            }
        }

        self.state = TraversalState::Completed;
        debug!(
            "Traversal completed, {} violation(s), {} rule failure(s)",
            self.collector.reported(),
            self.failures.len()
        );
    }

    /// Consumes the traversal.
    pub(crate) fn into_report(self) -> TraversalReport {
        let (violations, corrected) = self.collector.finish();
        TraversalReport {
            violations,
            corrected,
            rule_failures: self.failures,
            stopped_early: self.stopped && self.fatal.is_none(),
            fatal: self.fatal,
        }
    }

    fn visit(&mut self, tree: &mut Tree, node: NodeId) {
        for index in 0..self.slots.len() {
            if self.stopped || !tree.is_attached(node) {
                return;
            }
            self.run_hook(index, Hook::BeforeVisitChildren, tree, node);
        }
        if self.stop_on_first_violation && self.collector.reported() > 0 {
            debug!("Stopping traversal after the first violation");
            self.stopped = true;
            return;
        }
        if !tree.is_attached(node) {
            return;
        }

        let mut position = 0;
        while let Some(&child) = tree.children(node).get(position) {
            self.visit(tree, child);
            if self.stopped {
                return;
            }
            position = tree.child_index(node, child).map_or(position, |p| p + 1);
        }

        for index in (0..self.slots.len()).rev() {
            if self.stopped || !tree.is_attached(node) {
                return;
            }
            self.run_hook(index, Hook::AfterVisitChildren, tree, node);
        }
    }

    fn run_hook(&mut self, index: usize, hook: Hook, tree: &mut Tree, node: NodeId) {
        let slot = &mut self.slots[index];
        if slot.suspended {
            return;
        }
        let active = slot.active;
        let descriptor = active.descriptor();
        let properties =
            RuleProperties::new(&descriptor.id, &descriptor.uses_properties, self.config);

        let result = if hook == Hook::BeforeFirstNode {
            slot.rule.before_first_node(&properties)
        } else {
            let region_start = (self.verify_mutation_region && hook != Hook::AfterLastNode)
                .then(|| {
                    tree.clear_earliest_edit();
                    tree.start_offset(node)
                });
            let mut ctx = VisitContext::new(tree, &mut self.collector, properties, active.severity);
            let result = match hook {
                Hook::BeforeVisitChildren => slot.rule.before_visit_children(node, &mut ctx),
                Hook::AfterVisitChildren => slot.rule.after_visit_children(node, &mut ctx),
                _ => slot.rule.after_last_node(&mut ctx),
            };
            self.collector.settle(tree);
            result.and_then(|()| match (region_start, tree.earliest_edit()) {
                (Some(start), Some(edit)) if edit < start => {
                    Err(RuleError::MutationOutsideRegion { offset: start })
                }
                _ => Ok(()),
            })
        };

        if let Err(error) = result {
            if let Some(fatal) = error.as_configuration_error() {
                warn!(
                    "Rule {} failed in {}: {}; aborting the traversal",
                    descriptor.id, hook, error
                );
                self.fatal = Some(fatal);
                self.stopped = true;
                return;
            }
            let offset = matches!(hook, Hook::BeforeVisitChildren | Hook::AfterVisitChildren)
                .then(|| {
                    if tree.is_attached(node) {
                        tree.start_offset(node)
                    } else {
                        0
                    }
                });
            warn!(
                "Rule {} failed in {}: {}; skipping it for the rest of this traversal",
                descriptor.id, hook, error
            );
            self.failures.push(RuleFailure {
                rule_id: descriptor.id.clone(),
                hook: hook.to_string(),
                offset,
                message: error.to_string(),
            });
            self.slots[index].suspended = true;
        }
    }
}
