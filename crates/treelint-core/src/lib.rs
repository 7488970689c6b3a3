//! # treelint-core
//!
//! Rule engine for linting and formatting source text through a mutable
//! syntax tree.
//!
//! This crate provides the foundational traits and types for building
//! tree-based linters. It includes:
//!
//! - [`Tree`], an arena-backed syntax tree that rules may mutate
//! - [`Rule`] trait and [`RuleDescriptor`] for declaring rules
//! - [`RuleEngine`] for resolving the active rules and running traversals
//! - [`Violation`] for representing lint findings
//! - [`config`] for typed properties resolved per directory
//!
//! ## Example
//!
//! ```
//! use treelint_core::{Code, ElementKind, NodeId, Rule, RuleDescriptor, RuleEngine,
//!     RuleError, RuleProvider, VisitContext};
//!
//! #[derive(Default)]
//! struct NoVar;
//!
//! impl Rule for NoVar {
//!     fn descriptor(&self) -> RuleDescriptor {
//!         RuleDescriptor::new("no-var").description("Disallows `var`")
//!     }
//!
//!     fn before_visit_children(
//!         &mut self,
//!         node: NodeId,
//!         ctx: &mut VisitContext<'_>,
//!     ) -> Result<(), RuleError> {
//!         if ctx.tree().kind(node) == ElementKind::VarKeyword {
//!             let offset = ctx.tree().start_offset(node);
//!             ctx.emit(offset, "Unexpected var, use val instead", false);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let engine = RuleEngine::builder()
//!     .rule_provider(RuleProvider::of::<NoVar>())
//!     .build()?;
//! let outcome = engine.lint(&Code::from_text("var foo"))?;
//! assert_eq!(outcome.violations.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod context;
mod engine;
mod error;
mod kind;
mod parser;
mod registry;
mod rule;
mod scheduler;
mod tree;
mod types;
mod violation;

/// Utility modules for rule implementations.
pub mod utils;

pub use config::property::{
    CodeStyle, ConfigProperty, IndentStyle, RuleExecution, CODE_STYLE_PROPERTY,
    INDENT_SIZE_PROPERTY, INDENT_STYLE_PROPERTY, INSERT_FINAL_NEWLINE_PROPERTY,
    MAX_LINE_LENGTH_PROPERTY,
};
pub use config::scope::{ConfigOverride, ConfigResolver, ConfigSnapshot, EffectiveConfig};
pub use config::{ConfigError, ConfigFile};
pub use context::{AutocorrectDecision, RuleProperties, VisitContext};
pub use engine::{Code, FileOutcome, RuleEngine, RuleEngineBuilder, MAX_FORMAT_PASSES};
pub use error::{ConfigurationError, EngineError, RuleError};
pub use kind::ElementKind;
pub use parser::{ParseError, Parser, SourceParser, MAX_NESTING_DEPTH};
pub use registry::{ActiveRule, ActiveRuleSet, RuleRegistry};
pub use rule::{
    InvalidRuleId, Rule, RuleBox, RuleDescriptor, RuleId, RuleProvider, RuleSetProvider,
    RuleStatus, RunAfter, RunAfterMode, DEFAULT_RULE_SET,
};
pub use tree::{line_column, NodeId, Tree, TreeError};
pub use types::{
    CorrectionOutcome, LintResult, Location, RuleFailure, Severity, Violation,
    ViolationDiagnostic,
};
pub use violation::AutocorrectFilter;
