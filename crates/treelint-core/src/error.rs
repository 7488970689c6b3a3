//! Error types of the rule engine.

use std::path::PathBuf;

use miette::Diagnostic;

use crate::parser::ParseError;
use crate::rule::{InvalidRuleId, RuleId};
use crate::tree::TreeError;

/// A rule hook failed. The rule is suspended, the traversal goes on.
///
/// [`RuleError::UndeclaredProperty`] is the exception: it ends the run as a
/// [`ConfigurationError`].
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// An illegal tree mutation.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The rule read a property its descriptor does not declare.
    #[error("rule {rule} reads undeclared property '{property}'")]
    UndeclaredProperty {
        /// Offending rule.
        rule: RuleId,
        /// Property name.
        property: &'static str,
    },

    /// The tree does not have the shape the rule expects.
    #[error("unexpected node at offset {offset}: {message}")]
    UnexpectedNode {
        /// Offset of the node.
        offset: usize,
        /// What was wrong.
        message: String,
    },

    /// The rule changed text before the node being visited.
    #[error("rule mutated the tree before offset {offset}")]
    MutationOutsideRegion {
        /// Offset of the visited node.
        offset: usize,
    },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// The rule catalog or configuration cannot be used. Fatal before traversal.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigurationError {
    /// Run-after constraints form a cycle.
    #[error("run-after constraints form a cycle between: {}", join(rules))]
    #[diagnostic(
        code(treelint::config::cyclic_run_after),
        help("remove one of the run-after constraints")
    )]
    CyclicRunAfter {
        /// Rules that cannot be ordered, in catalog order.
        rules: Vec<RuleId>,
    },

    /// An override names a property nothing declares.
    #[error("unknown property '{name}'")]
    #[diagnostic(
        code(treelint::config::unknown_property),
        help("run `treelint list-rules` to see the properties rules read")
    )]
    UnknownProperty {
        /// Property name.
        name: String,
    },

    /// A rule reads a property its descriptor does not declare.
    #[error("rule {rule} reads undeclared property '{property}'")]
    #[diagnostic(
        code(treelint::config::undeclared_property),
        help("add the property to the rule descriptor with `uses_property`")
    )]
    UndeclaredProperty {
        /// Offending rule.
        rule: RuleId,
        /// Property name.
        property: &'static str,
    },

    /// Two providers share a rule id.
    #[error("rule id {0} is provided more than once")]
    #[diagnostic(code(treelint::config::duplicate_rule_id))]
    DuplicateRuleId(RuleId),

    /// A provider uses a malformed id.
    #[error(transparent)]
    #[diagnostic(code(treelint::config::invalid_rule_id))]
    InvalidRuleId(#[from] InvalidRuleId),
}

impl RuleError {
    /// Returns the configuration error this failure stands for, if any.
    pub(crate) fn as_configuration_error(&self) -> Option<ConfigurationError> {
        match self {
            Self::UndeclaredProperty { rule, property } => {
                Some(ConfigurationError::UndeclaredProperty {
                    rule: rule.clone(),
                    property: *property,
                })
            }
            _ => None,
        }
    }
}

fn join(rules: &[RuleId]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors returned by [`RuleEngine`](crate::RuleEngine).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The source text does not parse.
    #[error("failed to parse {}: {source}", path.as_ref().map_or_else(|| "<text>".to_string(), |p| p.display().to_string()))]
    Parse {
        /// File being parsed, if any.
        path: Option<PathBuf>,
        /// Parser error.
        #[source]
        source: ParseError,
    },

    /// Invalid rule catalog or configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
