//! The rule engine: parses source, resolves rules and configuration per
//! scope, and runs traversals in lint or format mode.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::config::property::{ENGINE_PROPERTIES, EXECUTION_KEY_PREFIX};
use crate::config::scope::{ConfigOverride, ConfigResolver, ConfigSnapshot, EffectiveConfig};
use crate::context::RuleProperties;
use crate::error::{ConfigurationError, EngineError};
use crate::parser::{Parser, SourceParser};
use crate::registry::{ActiveRuleSet, RuleRegistry};
use crate::rule::{RuleProvider, RuleSetProvider};
use crate::scheduler::{Traversal, TraversalReport};
use crate::tree::Tree;
use crate::types::{LintResult, RuleFailure, Severity, Violation};
use crate::violation::{AutocorrectFilter, ViolationCollector};

/// Upper bound of autocorrecting passes per file in format mode.
pub const MAX_FORMAT_PASSES: usize = 3;

/// Source text to lint or format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    content: String,
    path: Option<PathBuf>,
}

impl Code {
    /// Source text without a file.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            path: None,
        }
    }

    /// Source text read from `path`. Configuration is resolved for its directory.
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            path: Some(path.into()),
        }
    }

    /// Returns the text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the file path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn scope(&self) -> Option<&Path> {
        self.path().and_then(Path::parent)
    }
}

/// Result of linting or formatting one file.
#[derive(Debug)]
pub struct FileOutcome {
    /// Violations left, sorted by position.
    pub violations: Vec<Violation>,
    /// Violations fixed, summed over all passes.
    pub corrected: usize,
    /// Rule hooks that failed.
    pub rule_failures: Vec<RuleFailure>,
    /// Traversals run.
    pub passes: usize,
    /// True if the traversal stopped at the first violation.
    pub stopped_early: bool,
    tree: Tree,
}

impl FileOutcome {
    /// Returns the final tree.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Returns the final text.
    #[must_use]
    pub fn text(&self) -> String {
        self.tree.to_text()
    }

    /// Returns the final tree, consuming the outcome.
    #[must_use]
    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Returns true if an error-severity violation is left.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == Severity::Error)
    }
}

impl LintResult {
    /// Adds the outcome of one file. `changed` tells whether its text was rewritten.
    pub fn add_file(&mut self, outcome: FileOutcome, changed: bool) {
        self.files_checked += 1;
        self.corrected += outcome.corrected;
        if changed {
            self.files_changed += 1;
        }
        self.violations.extend(outcome.violations);
        self.rule_failures.extend(outcome.rule_failures);
    }
}

/// Builder for configuring a [`RuleEngine`].
pub struct RuleEngineBuilder {
    providers: Vec<RuleProvider>,
    overrides: ConfigOverride,
    snapshot: ConfigSnapshot,
    parser: Arc<dyn Parser>,
    stop_on_first_violation: bool,
    verify_mutation_region: bool,
    autocorrect_filter: Option<AutocorrectFilter>,
}

impl Default for RuleEngineBuilder {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            overrides: ConfigOverride::new(),
            snapshot: ConfigSnapshot::new(),
            parser: Arc::new(SourceParser::new()),
            stop_on_first_violation: false,
            verify_mutation_region: cfg!(debug_assertions),
            autocorrect_filter: None,
        }
    }
}

impl RuleEngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule provider.
    #[must_use]
    pub fn rule_provider(mut self, provider: RuleProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Adds several rule providers.
    #[must_use]
    pub fn rule_providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = RuleProvider>,
    {
        self.providers.extend(providers);
        self
    }

    /// Adds every rule of a rule set.
    #[must_use]
    pub fn rule_set(self, rule_set: &dyn RuleSetProvider) -> Self {
        self.rule_providers(rule_set.rule_providers())
    }

    /// Overrides one property for every scope.
    #[must_use]
    pub fn override_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.set(key, value);
        self
    }

    /// Replaces all overrides.
    #[must_use]
    pub fn overrides(mut self, overrides: ConfigOverride) -> Self {
        self.overrides = overrides;
        self
    }

    /// Disables a rule by id. Bare names refer to the `standard` rule set.
    #[must_use]
    pub fn disable_rule(mut self, id: &str) -> Self {
        self.overrides = self.overrides.disable_rule(id);
        self
    }

    /// Runs experimental rules too.
    #[must_use]
    pub fn enable_experimental(mut self) -> Self {
        self.overrides = self.overrides.enable_experimental();
        self
    }

    /// Sets the discovered configuration.
    #[must_use]
    pub fn config_snapshot(mut self, snapshot: ConfigSnapshot) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Replaces the parser.
    #[must_use]
    pub fn parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// In lint mode, stops a file's traversal after its first violation.
    #[must_use]
    pub fn stop_on_first_violation(mut self, stop: bool) -> Self {
        self.stop_on_first_violation = stop;
        self
    }

    /// Fails rule hooks that change text before the visited node.
    ///
    /// On by default in debug builds.
    #[must_use]
    pub fn verify_mutation_region(mut self, verify: bool) -> Self {
        self.verify_mutation_region = verify;
        self
    }

    /// Adds a policy that can forbid individual corrections.
    #[must_use]
    pub fn autocorrect_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Violation) -> bool + Send + Sync + 'static,
    {
        self.autocorrect_filter = Some(Arc::new(filter));
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] for a malformed, duplicate or cyclic
    /// catalog, an override of a property nothing declares, or a rule whose
    /// `before_first_node` reads a property it does not declare.
    pub fn build(self) -> Result<RuleEngine, ConfigurationError> {
        let registry = RuleRegistry::new(self.providers)?;
        check_property_reads(&registry)?;

        for key in self.overrides.values().keys() {
            let known = key.starts_with(EXECUTION_KEY_PREFIX)
                || ENGINE_PROPERTIES.contains(&key.as_str())
                || registry
                    .providers()
                    .iter()
                    .any(|p| p.descriptor().uses_properties.contains(&key.as_str()));
            if !known {
                return Err(ConfigurationError::UnknownProperty { name: key.clone() });
            }
        }

        info!(
            "Rule engine ready with {} rule(s) loaded",
            registry.providers().len()
        );

        Ok(RuleEngine {
            registry,
            resolver: ConfigResolver::new(self.snapshot, self.overrides),
            parser: self.parser,
            stop_on_first_violation: self.stop_on_first_violation,
            verify_mutation_region: self.verify_mutation_region,
            autocorrect_filter: self.autocorrect_filter,
            active: Mutex::new(HashMap::new()),
        })
    }
}

/// Lints and formats source text with a fixed rule catalog.
///
/// Use [`RuleEngine::builder()`] to construct an instance. The engine is
/// `Send + Sync`; every call creates fresh rule instances, so files can be
/// processed in parallel.
///
/// # Example
///
/// ```
/// use treelint_core::{Code, RuleEngine};
///
/// let engine = RuleEngine::builder().build()?;
/// let outcome = engine.lint(&Code::from_text("val x = 1\n"))?;
/// assert!(outcome.violations.is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct RuleEngine {
    registry: RuleRegistry,
    resolver: ConfigResolver,
    parser: Arc<dyn Parser>,
    stop_on_first_violation: bool,
    verify_mutation_region: bool,
    autocorrect_filter: Option<AutocorrectFilter>,
    active: Mutex<HashMap<Option<PathBuf>, Arc<ActiveRuleSet>>>,
}

impl RuleEngine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> RuleEngineBuilder {
        RuleEngineBuilder::new()
    }

    /// Returns every loaded provider in execution order.
    #[must_use]
    pub fn rule_providers(&self) -> &[RuleProvider] {
        self.registry.providers()
    }

    /// Returns the configuration of a scope (a directory).
    #[must_use]
    pub fn effective_config(&self, scope: Option<&Path>) -> Arc<EffectiveConfig> {
        self.resolver.resolve(scope)
    }

    /// Returns the rules that run in a scope (a directory).
    #[must_use]
    pub fn active_rules(&self, scope: Option<&Path>) -> Arc<ActiveRuleSet> {
        let key = scope.map(Path::to_path_buf);
        let mut cache = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(key).or_insert_with(|| {
            let rules = self.registry.resolve(&self.resolver.resolve(scope));
            debug!("Resolved {} active rule(s) for {:?}", rules.len(), scope);
            Arc::new(rules)
        }))
    }

    /// Reports violations without changing the text.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Parse`] if the text does not parse, and
    /// [`EngineError::Configuration`] if a rule reads a property it does not
    /// declare.
    pub fn lint(&self, code: &Code) -> Result<FileOutcome, EngineError> {
        debug!("Linting {}", code_label(code));
        let mut tree = self.parse(code, code.content())?;
        let report = self.traverse(code, &mut tree, false)?;
        Ok(FileOutcome {
            violations: report.violations,
            corrected: 0,
            rule_failures: report.rule_failures,
            passes: 1,
            stopped_early: report.stopped_early,
            tree,
        })
    }

    /// Fixes what the rules can fix and reports the rest.
    ///
    /// Autocorrecting passes repeat on the re-parsed result until one pass
    /// corrects nothing, at most [`MAX_FORMAT_PASSES`] times.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Parse`] if the text (or a pass's output) does
    /// not parse, and [`EngineError::Configuration`] like [`RuleEngine::lint`].
    pub fn format(&self, code: &Code) -> Result<FileOutcome, EngineError> {
        debug!("Formatting {}", code_label(code));
        let mut tree = self.parse(code, code.content())?;
        let mut corrected = 0;
        let mut rule_failures: Vec<RuleFailure> = Vec::new();
        let mut passes = 0;

        loop {
            passes += 1;
            let report = self.traverse(code, &mut tree, true)?;
            corrected += report.corrected;
            for failure in report.rule_failures {
                if !rule_failures.contains(&failure) {
                    rule_failures.push(failure);
                }
            }

            if report.corrected == 0 || passes == MAX_FORMAT_PASSES {
                debug!(
                    "Formatted {} in {} pass(es), {} correction(s)",
                    code_label(code),
                    passes,
                    corrected
                );
                return Ok(FileOutcome {
                    violations: report.violations,
                    corrected,
                    rule_failures,
                    passes,
                    stopped_early: false,
                    tree,
                });
            }

            let text = tree.to_text();
            tree = self.parse(code, &text)?;
        }
    }

    fn parse(&self, code: &Code, text: &str) -> Result<Tree, EngineError> {
        self.parser.parse(text).map_err(|source| EngineError::Parse {
            path: code.path.clone(),
            source,
        })
    }

    fn traverse(
        &self,
        code: &Code,
        tree: &mut Tree,
        autocorrect: bool,
    ) -> Result<TraversalReport, EngineError> {
        let scope = code.scope();
        let config = self.resolver.resolve(scope);
        let rules = self.active_rules(scope);
        let collector = ViolationCollector::new(
            autocorrect,
            self.autocorrect_filter.clone(),
            code.path.clone(),
        );
        let mut traversal = Traversal::new(&rules, &config, collector)
            .stop_on_first_violation(self.stop_on_first_violation && !autocorrect)
            .verify_mutation_region(self.verify_mutation_region);
        traversal.run(tree);
        let mut report = traversal.into_report();
        match report.fatal.take() {
            Some(error) => Err(error.into()),
            None => Ok(report),
        }
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("rules", &self.registry.providers().len())
            .field("stop_on_first_violation", &self.stop_on_first_violation)
            .field("verify_mutation_region", &self.verify_mutation_region)
            .finish_non_exhaustive()
    }
}

/// Runs `before_first_node` of a throwaway instance of every rule with the
/// default configuration, so undeclared property reads fail the build.
fn check_property_reads(registry: &RuleRegistry) -> Result<(), ConfigurationError> {
    let config = EffectiveConfig::default();
    for provider in registry.providers() {
        let descriptor = provider.descriptor();
        let properties =
            RuleProperties::new(&descriptor.id, &descriptor.uses_properties, &config);
        if let Err(error) = provider.create().before_first_node(&properties) {
            if let Some(fatal) = error.as_configuration_error() {
                return Err(fatal);
            }
        }
    }
    Ok(())
}

fn code_label(code: &Code) -> String {
    code.path()
        .map_or_else(|| "<text>".to_string(), |p| p.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VisitContext;
    use crate::error::RuleError;
    use crate::kind::ElementKind;
    use crate::rule::{Rule, RuleDescriptor};
    use crate::tree::NodeId;

    /// Rewrites `var` to `val`.
    #[derive(Default)]
    struct VarToVal;

    impl Rule for VarToVal {
        fn descriptor(&self) -> RuleDescriptor {
            RuleDescriptor::new("var-to-val").uses_property("custom_flag")
        }

        fn before_visit_children(
            &mut self,
            node: NodeId,
            ctx: &mut VisitContext<'_>,
        ) -> Result<(), RuleError> {
            if ctx.tree().kind(node) == ElementKind::VarKeyword {
                let offset = ctx.tree().start_offset(node);
                if ctx.emit(offset, "Use val", true).is_allowed() {
                    ctx.tree_mut().replace_text(node, "val")?;
                }
            }
            Ok(())
        }
    }

    fn engine() -> RuleEngine {
        RuleEngine::builder()
            .rule_provider(RuleProvider::of::<VarToVal>())
            .build()
            .unwrap()
    }

    #[test]
    fn lint_reports_without_changing() {
        let outcome = engine().lint(&Code::from_text("var a = 1\n")).unwrap();
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].outcome, None);
        assert_eq!(outcome.text(), "var a = 1\n");
        assert!(outcome.has_errors());
    }

    #[test]
    fn format_fixes_and_converges() {
        let outcome = engine()
            .format(&Code::from_text("var a = 1\nvar b = 2\n"))
            .unwrap();
        assert_eq!(outcome.text(), "val a = 1\nval b = 2\n");
        assert_eq!(outcome.corrected, 2);
        assert_eq!(outcome.passes, 2);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = engine()
            .lint(&Code::from_file("src/a.kt", "f(\n"))
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to parse src/a.kt"));
    }

    #[test]
    fn deeply_nested_brackets_are_a_parse_error() {
        let source = format!("val x = {}{}\n", "(".repeat(2000), ")".repeat(2000));
        let err = engine().lint(&Code::from_text(source)).unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn unknown_override_is_rejected() {
        let err = RuleEngine::builder()
            .rule_provider(RuleProvider::of::<VarToVal>())
            .override_property("no_such_property", "1")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownProperty { name } if name == "no_such_property"));

        for key in ["indent_size", "custom_flag", "treelint_standard_var-to-val"] {
            assert!(RuleEngine::builder()
                .rule_provider(RuleProvider::of::<VarToVal>())
                .override_property(key, "1")
                .build()
                .is_ok());
        }
    }

    /// Reads `max_line_length` without declaring it, in the hook named by `EAGER`.
    #[derive(Default)]
    struct SneakyReader<const EAGER: bool>;

    impl<const EAGER: bool> Rule for SneakyReader<EAGER> {
        fn descriptor(&self) -> RuleDescriptor {
            RuleDescriptor::new("sneaky-reader")
        }

        fn before_first_node(&mut self, properties: &RuleProperties<'_>) -> Result<(), RuleError> {
            if EAGER {
                properties.get(&crate::MAX_LINE_LENGTH_PROPERTY)?;
            }
            Ok(())
        }

        fn before_visit_children(
            &mut self,
            node: NodeId,
            ctx: &mut VisitContext<'_>,
        ) -> Result<(), RuleError> {
            if ctx.tree().kind(node) == ElementKind::Identifier {
                ctx.properties().get(&crate::MAX_LINE_LENGTH_PROPERTY)?;
            }
            Ok(())
        }
    }

    #[test]
    fn undeclared_property_read_fails_the_build() {
        let err = RuleEngine::builder()
            .rule_provider(RuleProvider::of::<SneakyReader<true>>())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UndeclaredProperty {
                property: "max_line_length",
                ..
            }
        ));
    }

    #[test]
    fn undeclared_property_read_aborts_the_run() {
        let engine = RuleEngine::builder()
            .rule_provider(RuleProvider::of::<VarToVal>())
            .rule_provider(RuleProvider::of::<SneakyReader<false>>())
            .build()
            .unwrap();
        for result in [
            engine.lint(&Code::from_text("var a = 1\n")),
            engine.format(&Code::from_text("var a = 1\n")),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(
                err,
                EngineError::Configuration(ConfigurationError::UndeclaredProperty { .. })
            ));
        }
        assert!(engine.lint(&Code::from_text("// note\n")).is_ok());
    }

    #[test]
    fn code_label_names_file_or_text() {
        assert_eq!(code_label(&Code::from_text("x")), "<text>");
        assert_eq!(code_label(&Code::from_file("src/a.kt", "x")), "src/a.kt");
    }

    #[test]
    fn autocorrect_filter_blocks_fixes() {
        let engine = RuleEngine::builder()
            .rule_provider(RuleProvider::of::<VarToVal>())
            .autocorrect_filter(|v| v.location.line != 2)
            .build()
            .unwrap();
        let outcome = engine
            .format(&Code::from_text("var a = 1\nvar b = 2\n"))
            .unwrap();
        assert_eq!(outcome.text(), "val a = 1\nvar b = 2\n");
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].location.line, 2);
    }

    #[test]
    fn active_rules_are_cached_per_scope() {
        let engine = engine();
        let a = engine.active_rules(Some(Path::new("/x")));
        let b = engine.active_rules(Some(Path::new("/x")));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn lint_result_accumulates_files() {
        let engine = engine();
        let mut result = LintResult::new();
        let outcome = engine.format(&Code::from_text("var a = 1\n")).unwrap();
        result.add_file(outcome, true);
        let outcome = engine.lint(&Code::from_text("var a = 1\n")).unwrap();
        result.add_file(outcome, false);
        assert_eq!(result.files_checked, 2);
        assert_eq!(result.files_changed, 1);
        assert_eq!(result.corrected, 1);
        assert_eq!(result.violations.len(), 1);
    }
}
