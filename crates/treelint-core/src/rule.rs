//! Rule contract: identifiers, descriptors, the [`Rule`] trait and providers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::property::EXECUTION_KEY_PREFIX;
use crate::context::{RuleProperties, VisitContext};
use crate::error::RuleError;
use crate::tree::NodeId;
use crate::types::Severity;

/// Rule set used when an id has no `<ruleset>:` prefix.
pub const DEFAULT_RULE_SET: &str = "standard";

/// Qualified rule identifier, `<ruleset>:<name>`.
///
/// Conversion from `&str` normalizes bare names into the
/// [`DEFAULT_RULE_SET`] and never fails; [`RuleId::validate`] (or
/// [`FromStr`]) checks the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RuleId {
    rule_set: String,
    name: String,
}

impl RuleId {
    /// Creates an id from its parts.
    #[must_use]
    pub fn new(rule_set: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            rule_set: rule_set.into(),
            name: name.into(),
        }
    }

    /// Returns the rule set part.
    #[must_use]
    pub fn rule_set(&self) -> &str {
        &self.rule_set
    }

    /// Returns the rule name part.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key enabling or disabling this rule: `treelint_<ruleset>_<name>`.
    #[must_use]
    pub fn execution_key(&self) -> String {
        format!("{EXECUTION_KEY_PREFIX}{}_{}", self.rule_set, self.name)
    }

    /// Key enabling or disabling this rule's whole rule set.
    #[must_use]
    pub fn rule_set_execution_key(&self) -> String {
        format!("{EXECUTION_KEY_PREFIX}{}", self.rule_set)
    }

    /// Key overriding this rule's severity.
    #[must_use]
    pub fn severity_key(&self) -> String {
        format!("{}_severity", self.execution_key())
    }

    /// Checks that both parts are lowercase kebab-case words.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRuleId`] naming the offending part.
    pub fn validate(&self) -> Result<(), InvalidRuleId> {
        if !is_kebab_case(&self.rule_set) {
            return Err(InvalidRuleId::new(self, "rule set"));
        }
        if !is_kebab_case(&self.name) {
            return Err(InvalidRuleId::new(self, "rule name"));
        }
        Ok(())
    }
}

fn is_kebab_case(part: &str) -> bool {
    part.starts_with(|c: char| c.is_ascii_lowercase())
        && !part.ends_with('-')
        && !part.contains("--")
        && part
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl From<&str> for RuleId {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((rule_set, name)) => Self::new(rule_set.trim(), name.trim()),
            None => Self::new(DEFAULT_RULE_SET, raw),
        }
    }
}

impl FromStr for RuleId {
    type Err = InvalidRuleId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let id = Self::from(raw);
        id.validate()?;
        Ok(id)
    }
}

impl TryFrom<String> for RuleId {
    type Error = InvalidRuleId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<RuleId> for String {
    fn from(id: RuleId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.rule_set, self.name)
    }
}

/// A rule id that is not `<ruleset>:<name>` in lowercase kebab-case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rule id '{id}': bad {part}")]
pub struct InvalidRuleId {
    /// The offending id, as written.
    pub id: String,
    /// Which part is malformed.
    pub part: &'static str,
}

impl InvalidRuleId {
    fn new(id: &RuleId, part: &'static str) -> Self {
        Self {
            id: id.to_string(),
            part,
        }
    }
}

/// Maturity of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// Runs unless disabled.
    Stable,
    /// Runs only when experimental rules are opted into, or when enabled by id.
    Experimental,
}

/// How a run-after constraint behaves when the other rule is not active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunAfterMode {
    /// The dependent rule only runs when the other rule is loaded and enabled.
    OnlyWhenLoadedAndEnabled,
    /// Ordering only; the dependent rule runs either way.
    RegardlessOfLoadedOrEnabled,
}

/// "Run after `rule_id`" constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAfter {
    /// Rule that must run first.
    pub rule_id: RuleId,
    /// Behaviour when that rule is missing or disabled.
    pub mode: RunAfterMode,
}

/// Static description of a rule: identity and declared capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDescriptor {
    /// Qualified id.
    pub id: RuleId,
    /// Stable or experimental.
    pub status: RuleStatus,
    /// One-line description for `list-rules`.
    pub description: &'static str,
    /// Property names the rule reads.
    pub uses_properties: Vec<&'static str>,
    /// Ordering constraints.
    pub run_after: Vec<RunAfter>,
    /// Severity used unless configured otherwise.
    pub default_severity: Severity,
}

impl RuleDescriptor {
    /// Creates a stable, error-severity descriptor.
    #[must_use]
    pub fn new(id: impl Into<RuleId>) -> Self {
        Self {
            id: id.into(),
            status: RuleStatus::Stable,
            description: "",
            uses_properties: Vec::new(),
            run_after: Vec::new(),
            default_severity: Severity::Error,
        }
    }

    /// Marks the rule as experimental.
    #[must_use]
    pub fn experimental(mut self) -> Self {
        self.status = RuleStatus::Experimental;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Declares a property the rule reads.
    #[must_use]
    pub fn uses_property(mut self, name: &'static str) -> Self {
        self.uses_properties.push(name);
        self
    }

    /// Adds a run-after constraint.
    #[must_use]
    pub fn run_after(mut self, id: impl Into<RuleId>, mode: RunAfterMode) -> Self {
        self.run_after.push(RunAfter {
            rule_id: id.into(),
            mode,
        });
        self
    }

    /// Sets the default severity.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.default_severity = severity;
        self
    }
}

/// A lint rule visiting the syntax tree.
///
/// An instance lives for exactly one traversal, so fields may hold
/// per-traversal state. Hooks run in this order:
///
/// 1. [`before_first_node`](Rule::before_first_node) once, with the
///    effective configuration;
/// 2. [`before_visit_children`](Rule::before_visit_children) for each node
///    in pre-order;
/// 3. [`after_visit_children`](Rule::after_visit_children) once the node's
///    subtree is done;
/// 4. [`after_last_node`](Rule::after_last_node) once, after the root.
///
/// Violations are reported through [`VisitContext::emit`]. The tree may only
/// be changed when `emit` returned [`AutocorrectDecision::Allow`](crate::AutocorrectDecision::Allow).
///
/// # Example
///
/// ```
/// use treelint_core::{ElementKind, NodeId, Rule, RuleDescriptor, RuleError, VisitContext};
///
/// struct NoSemicolon;
///
/// impl Rule for NoSemicolon {
///     fn descriptor(&self) -> RuleDescriptor {
///         RuleDescriptor::new("custom:no-semicolon").description("Disallows `;`")
///     }
///
///     fn before_visit_children(
///         &mut self,
///         node: NodeId,
///         ctx: &mut VisitContext<'_>,
///     ) -> Result<(), RuleError> {
///         if ctx.tree().kind(node) == ElementKind::Semicolon {
///             let offset = ctx.tree().start_offset(node);
///             if ctx.emit(offset, "Unnecessary semicolon", true).is_allowed() {
///                 ctx.tree_mut().remove(node)?;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Rule: Send {
    /// Returns the rule's identity and declared capabilities.
    fn descriptor(&self) -> RuleDescriptor;

    /// Called once before the traversal starts.
    ///
    /// # Errors
    ///
    /// A failure suspends the rule for the whole traversal.
    fn before_first_node(&mut self, properties: &RuleProperties<'_>) -> Result<(), RuleError> {
        let _ = properties;
        Ok(())
    }

    /// Called for every node before its children are visited.
    ///
    /// # Errors
    ///
    /// A failure suspends the rule for the rest of the traversal.
    fn before_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError>;

    /// Called for every node after its children were visited.
    ///
    /// # Errors
    ///
    /// A failure suspends the rule for the rest of the traversal.
    fn after_visit_children(
        &mut self,
        node: NodeId,
        ctx: &mut VisitContext<'_>,
    ) -> Result<(), RuleError> {
        let _ = (node, ctx);
        Ok(())
    }

    /// Called once after the root was visited.
    ///
    /// # Errors
    ///
    /// The failure is recorded; there is nothing left to suspend.
    fn after_last_node(&mut self, ctx: &mut VisitContext<'_>) -> Result<(), RuleError> {
        let _ = ctx;
        Ok(())
    }
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

type RuleFactory = dyn Fn() -> RuleBox + Send + Sync;

/// Builds fresh rule instances and knows their descriptor.
#[derive(Clone)]
pub struct RuleProvider {
    descriptor: Arc<RuleDescriptor>,
    factory: Arc<RuleFactory>,
}

impl RuleProvider {
    /// Wraps a factory. It is called once here to read the descriptor.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> RuleBox + Send + Sync + 'static,
    {
        let descriptor = factory().descriptor();
        Self {
            descriptor: Arc::new(descriptor),
            factory: Arc::new(factory),
        }
    }

    /// Provider for a rule type with a `Default` constructor.
    #[must_use]
    pub fn of<R: Rule + Default + 'static>() -> Self {
        Self::new(|| Box::new(R::default()))
    }

    /// Returns the descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &RuleDescriptor {
        &self.descriptor
    }

    /// Returns the rule id.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.descriptor.id
    }

    /// Creates a new rule instance for one traversal.
    #[must_use]
    pub fn create(&self) -> RuleBox {
        (self.factory)()
    }
}

impl fmt::Debug for RuleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleProvider")
            .field("id", &self.descriptor.id)
            .finish_non_exhaustive()
    }
}

/// A named collection of rule providers.
pub trait RuleSetProvider: Send + Sync {
    /// Rule set name, the prefix of every rule id it provides.
    fn id(&self) -> &'static str;

    /// Returns one provider per rule, in catalog order.
    fn rule_providers(&self) -> Vec<RuleProvider>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRule;

    impl Rule for TestRule {
        fn descriptor(&self) -> RuleDescriptor {
            RuleDescriptor::new("test-rule")
                .description("A test rule")
                .uses_property("indent_size")
                .run_after("other", RunAfterMode::RegardlessOfLoadedOrEnabled)
        }

        fn before_visit_children(
            &mut self,
            _node: NodeId,
            _ctx: &mut VisitContext<'_>,
        ) -> Result<(), RuleError> {
            Ok(())
        }
    }

    #[test]
    fn bare_names_use_default_rule_set() {
        let id = RuleId::from("no-var");
        assert_eq!(id.rule_set(), "standard");
        assert_eq!(id.name(), "no-var");
        assert_eq!(id.to_string(), "standard:no-var");
        assert_eq!(id, RuleId::from("standard:no-var"));
        assert_ne!(id, RuleId::from("custom:no-var"));
    }

    #[test]
    fn property_keys() {
        let id = RuleId::from("custom:no-var");
        assert_eq!(id.execution_key(), "treelint_custom_no-var");
        assert_eq!(id.rule_set_execution_key(), "treelint_custom");
        assert_eq!(id.severity_key(), "treelint_custom_no-var_severity");
    }

    #[test]
    fn validation() {
        assert!("standard:no-var".parse::<RuleId>().is_ok());
        assert!("max-line-length2".parse::<RuleId>().is_ok());
        for bad in ["", ":x", "x:", "a:b:c", "No-Var", "no_var", "-x", "x-", "a--b"] {
            assert!(bad.parse::<RuleId>().is_err(), "{bad} should be invalid");
        }
        let err = "a:b:c".parse::<RuleId>().unwrap_err();
        assert_eq!(err.part, "rule name");
    }

    #[test]
    fn serde_uses_qualified_string() {
        let id = RuleId::from("no-var");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"standard:no-var\"");
        let back: RuleId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<RuleId>("\"Bad Id\"").is_err());
    }

    #[test]
    fn provider_reads_descriptor_once() {
        let provider = RuleProvider::new(|| Box::new(TestRule));
        assert_eq!(provider.id(), &RuleId::from("test-rule"));
        assert_eq!(provider.descriptor().status, RuleStatus::Stable);
        assert_eq!(provider.descriptor().uses_properties, vec!["indent_size"]);
        assert_eq!(
            provider.descriptor().run_after[0].rule_id,
            RuleId::from("standard:other")
        );
        assert_eq!(provider.create().descriptor(), *provider.descriptor());
    }
}
