//! The `standard` rule set.

use treelint_core::{RuleProvider, RuleSetProvider, DEFAULT_RULE_SET};

use crate::{
    CommentSpacing, DotSpacing, FinalNewline, MaxLineLength, NoEmptyFile,
    NoSingleLineBlockComment, NoTrailingSpaces, NoVar,
};

/// Provides every rule of this crate under the `standard` rule set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRuleSetProvider;

impl RuleSetProvider for StandardRuleSetProvider {
    fn id(&self) -> &'static str {
        DEFAULT_RULE_SET
    }

    fn rule_providers(&self) -> Vec<RuleProvider> {
        all_rule_providers()
    }
}

/// Returns providers for all rules, in catalog order.
///
/// Catalog order decides the run order of rules without run-after
/// constraints.
#[must_use]
pub fn all_rule_providers() -> Vec<RuleProvider> {
    vec![
        RuleProvider::of::<NoVar>(),
        RuleProvider::of::<NoEmptyFile>(),
        RuleProvider::of::<DotSpacing>(),
        RuleProvider::of::<NoTrailingSpaces>(),
        RuleProvider::of::<CommentSpacing>(),
        RuleProvider::of::<NoSingleLineBlockComment>(),
        RuleProvider::of::<FinalNewline>(),
        RuleProvider::of::<MaxLineLength>(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use treelint_core::RuleRegistry;

    #[test]
    fn test_catalog_ids() {
        let ids: Vec<String> = all_rule_providers()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        insta::assert_debug_snapshot!(ids, @r###"
        [
            "standard:no-var",
            "standard:no-empty-file",
            "standard:dot-spacing",
            "standard:no-trailing-spaces",
            "standard:comment-spacing",
            "standard:no-single-line-block-comment",
            "standard:final-newline",
            "standard:max-line-length",
        ]
        "###);
    }

    #[test]
    fn test_catalog_is_valid() {
        let registry = RuleRegistry::new(StandardRuleSetProvider.rule_providers());
        assert!(registry.is_ok());
    }

    #[test]
    fn test_every_rule_belongs_to_the_set() {
        let provider = StandardRuleSetProvider;
        assert!(provider
            .rule_providers()
            .iter()
            .all(|p| p.id().rule_set() == provider.id()));
    }
}
