//! Context types for rule execution.

use std::path::Path;

use crate::config::property::ConfigProperty;
use crate::config::scope::EffectiveConfig;
use crate::error::RuleError;
use crate::rule::RuleId;
use crate::tree::Tree;
use crate::types::Severity;
use crate::violation::ViolationCollector;

/// Answer of [`VisitContext::emit`]: may the rule fix what it reported?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocorrectDecision {
    /// The rule may mutate the tree to fix the violation.
    Allow,
    /// The rule must only report.
    NoAutocorrect,
}

impl AutocorrectDecision {
    /// Returns true for [`AutocorrectDecision::Allow`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

/// Configuration as seen by one rule.
///
/// Only properties declared in the rule's descriptor can be read.
#[derive(Debug, Clone, Copy)]
pub struct RuleProperties<'a> {
    rule_id: &'a RuleId,
    declared: &'a [&'static str],
    config: &'a EffectiveConfig,
}

impl<'a> RuleProperties<'a> {
    pub(crate) fn new(
        rule_id: &'a RuleId,
        declared: &'a [&'static str],
        config: &'a EffectiveConfig,
    ) -> Self {
        Self {
            rule_id,
            declared,
            config,
        }
    }

    /// Returns the effective value of a declared property.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::UndeclaredProperty`] if the descriptor does not
    /// list the property. The engine stops the run on that error and reports
    /// it as a configuration error.
    pub fn get<T: Copy + 'static>(&self, property: &ConfigProperty<T>) -> Result<T, RuleError> {
        if !self.declared.contains(&property.name()) {
            return Err(RuleError::UndeclaredProperty {
                rule: self.rule_id.clone(),
                property: property.name(),
            });
        }
        Ok(self.config.get(property))
    }

    /// Returns the id of the rule reading the configuration.
    #[must_use]
    pub fn rule_id(&self) -> &RuleId {
        self.rule_id
    }
}

/// Handed to a rule for each visit hook.
///
/// Gives access to the tree, the rule's configuration and the `emit`
/// callback bound to the rule.
pub struct VisitContext<'a> {
    tree: &'a mut Tree,
    collector: &'a mut ViolationCollector,
    properties: RuleProperties<'a>,
    severity: Severity,
}

impl<'a> VisitContext<'a> {
    pub(crate) fn new(
        tree: &'a mut Tree,
        collector: &'a mut ViolationCollector,
        properties: RuleProperties<'a>,
        severity: Severity,
    ) -> Self {
        Self {
            tree,
            collector,
            properties,
            severity,
        }
    }

    /// Returns the tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        self.tree
    }

    /// Returns the tree for mutation.
    ///
    /// Only mutate after [`emit`](Self::emit) returned
    /// [`AutocorrectDecision::Allow`], and only the visited node, its subtree
    /// or nodes after it.
    pub fn tree_mut(&mut self) -> &mut Tree {
        self.tree
    }

    /// Reports a violation at a byte offset of the current text.
    pub fn emit(
        &mut self,
        offset: usize,
        message: impl Into<String>,
        can_be_autocorrected: bool,
    ) -> AutocorrectDecision {
        self.collector.emit(
            self.tree,
            self.properties.rule_id,
            self.severity,
            offset,
            message.into(),
            can_be_autocorrected,
        )
    }

    /// Returns the rule's configuration.
    #[must_use]
    pub fn properties(&self) -> &RuleProperties<'a> {
        &self.properties
    }

    /// Returns the id of the rule being run.
    #[must_use]
    pub fn rule_id(&self) -> &RuleId {
        self.properties.rule_id
    }

    /// Returns the file being processed, if any.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.collector.file()
    }
}

impl std::fmt::Debug for VisitContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitContext")
            .field("rule_id", self.properties.rule_id)
            .field("revision", &self.tree.revision())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::property::{INDENT_SIZE_PROPERTY, MAX_LINE_LENGTH_PROPERTY};
    use std::collections::BTreeMap;

    #[test]
    fn declared_properties_are_readable() {
        let id = RuleId::from("indent");
        let config = EffectiveConfig::from_raw(BTreeMap::from([(
            "indent_size".to_string(),
            "2".to_string(),
        )]));
        let declared = ["indent_size"];
        let properties = RuleProperties::new(&id, &declared, &config);

        assert_eq!(properties.get(&INDENT_SIZE_PROPERTY).unwrap(), 2);
        let err = properties.get(&MAX_LINE_LENGTH_PROPERTY).unwrap_err();
        assert!(matches!(
            err,
            RuleError::UndeclaredProperty {
                property: "max_line_length",
                ..
            }
        ));
    }

    #[test]
    fn decision_helpers() {
        assert!(AutocorrectDecision::Allow.is_allowed());
        assert!(!AutocorrectDecision::NoAutocorrect.is_allowed());
    }
}
