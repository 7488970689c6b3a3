//! Helpers shared by the rule tests.

use treelint_core::{Code, RuleEngine, RuleProvider, Violation};

pub(crate) fn engine(provider: RuleProvider, overrides: &[(&str, &str)]) -> RuleEngine {
    let mut builder = RuleEngine::builder()
        .rule_provider(provider)
        .enable_experimental()
        .verify_mutation_region(true);
    for (key, value) in overrides {
        builder = builder.override_property(*key, *value);
    }
    builder.build().expect("valid engine")
}

pub(crate) fn lint(provider: RuleProvider, text: &str) -> Vec<Violation> {
    lint_with(provider, &[], text)
}

pub(crate) fn lint_with(
    provider: RuleProvider,
    overrides: &[(&str, &str)],
    text: &str,
) -> Vec<Violation> {
    let outcome = engine(provider, overrides)
        .lint(&Code::from_text(text))
        .expect("parses");
    assert!(outcome.rule_failures.is_empty(), "{:?}", outcome.rule_failures);
    outcome.violations
}

pub(crate) fn format(provider: RuleProvider, text: &str) -> String {
    format_with(provider, &[], text)
}

pub(crate) fn format_with(
    provider: RuleProvider,
    overrides: &[(&str, &str)],
    text: &str,
) -> String {
    let outcome = engine(provider, overrides)
        .format(&Code::from_text(text))
        .expect("parses");
    assert!(outcome.rule_failures.is_empty(), "{:?}", outcome.rule_failures);
    outcome.text()
}

pub(crate) fn positions(violations: &[Violation]) -> Vec<(usize, usize)> {
    violations
        .iter()
        .map(|v| (v.location.line, v.location.column))
        .collect()
}
