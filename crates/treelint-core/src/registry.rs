//! Rule catalog and the resolution of the active rule set.
//!
//! The catalog is ordered once, when the registry is built: a topological
//! sort of the run-after graph over every loaded rule, ties broken by
//! catalog order. Resolving a configuration then only filters that order,
//! so constraints hold among active rules and constraints against disabled
//! rules still fix the relative order of the rules around them.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::config::property::RuleExecution;
use crate::config::scope::EffectiveConfig;
use crate::error::ConfigurationError;
use crate::rule::{RuleDescriptor, RuleId, RuleProvider, RuleStatus, RunAfterMode};
use crate::types::Severity;

/// Validated, ordered rule catalog.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    ordered: Vec<RuleProvider>,
    index: HashMap<RuleId, usize>,
}

impl RuleRegistry {
    /// Validates ids and orders the catalog.
    ///
    /// # Errors
    ///
    /// Fails on a malformed or duplicate id, or a run-after cycle.
    pub fn new(providers: Vec<RuleProvider>) -> Result<Self, ConfigurationError> {
        let mut catalog_index = HashMap::with_capacity(providers.len());
        for (i, provider) in providers.iter().enumerate() {
            provider.id().validate()?;
            if catalog_index.insert(provider.id().clone(), i).is_some() {
                return Err(ConfigurationError::DuplicateRuleId(provider.id().clone()));
            }
        }

        let order = topological_order(&providers, &catalog_index)?;
        let ordered: Vec<RuleProvider> = order.into_iter().map(|i| providers[i].clone()).collect();
        let index = ordered
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id().clone(), i))
            .collect();

        Ok(Self { ordered, index })
    }

    /// Returns every loaded provider in execution order.
    #[must_use]
    pub fn providers(&self) -> &[RuleProvider] {
        &self.ordered
    }

    /// Returns the provider of a rule, if loaded.
    #[must_use]
    pub fn get(&self, id: &RuleId) -> Option<&RuleProvider> {
        self.index.get(id).map(|&i| &self.ordered[i])
    }

    /// Returns true if no rule is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Selects and orders the rules that run under `config`.
    #[must_use]
    pub fn resolve(&self, config: &EffectiveConfig) -> ActiveRuleSet {
        let experimental = config.experimental_enabled();
        let mut enabled: Vec<bool> = self
            .ordered
            .iter()
            .map(|p| is_enabled(p.descriptor(), config, experimental))
            .collect();

        // Dependencies precede dependents, so one pass cascades.
        for i in 0..self.ordered.len() {
            if !enabled[i] {
                continue;
            }
            let descriptor = self.ordered[i].descriptor();
            let missing = descriptor
                .run_after
                .iter()
                .filter(|r| r.mode == RunAfterMode::OnlyWhenLoadedAndEnabled)
                .find(|r| !self.index.get(&r.rule_id).is_some_and(|&j| enabled[j]));
            if let Some(run_after) = missing {
                warn!(
                    "Skipping rule {}: it runs after {}, which is not loaded or not enabled",
                    descriptor.id, run_after.rule_id
                );
                enabled[i] = false;
            }
        }

        let rules = self
            .ordered
            .iter()
            .zip(enabled)
            .filter(|(_, on)| *on)
            .map(|(provider, _)| {
                let descriptor = provider.descriptor();
                let severity = config
                    .rule_severity(&descriptor.id)
                    .unwrap_or(descriptor.default_severity);
                ActiveRule {
                    provider: provider.clone(),
                    severity,
                }
            })
            .collect();

        ActiveRuleSet { rules }
    }
}

fn is_enabled(descriptor: &RuleDescriptor, config: &EffectiveConfig, experimental: bool) -> bool {
    let id = &descriptor.id;
    if let Some(execution) = config.rule_execution(&id.execution_key()) {
        debug!("Rule {} is {} by configuration", id, execution.as_str());
        return execution == RuleExecution::Enabled;
    }
    if config.rule_execution(&id.rule_set_execution_key()) == Some(RuleExecution::Disabled) {
        debug!("Rule {} is disabled with its rule set", id);
        return false;
    }
    match descriptor.status {
        RuleStatus::Stable => true,
        RuleStatus::Experimental => {
            if !experimental {
                debug!("Skipping experimental rule {}", id);
            }
            experimental
        }
    }
}

/// Kahn's algorithm, always picking the lowest catalog index available.
fn topological_order(
    providers: &[RuleProvider],
    catalog_index: &HashMap<RuleId, usize>,
) -> Result<Vec<usize>, ConfigurationError> {
    let n = providers.len();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];

    for (i, provider) in providers.iter().enumerate() {
        for run_after in &provider.descriptor().run_after {
            // Constraints on rules that are not loaded impose no order.
            if let Some(&j) = catalog_index.get(&run_after.rule_id) {
                dependents[j].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &d in &dependents[i] {
            in_degree[d] -= 1;
            if in_degree[d] == 0 {
                ready.insert(d);
            }
        }
    }

    if order.len() < n {
        let rules = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| providers[i].id().clone())
            .collect();
        return Err(ConfigurationError::CyclicRunAfter { rules });
    }
    Ok(order)
}

/// A rule selected to run, with its effective severity.
#[derive(Debug, Clone)]
pub struct ActiveRule {
    /// Factory of the rule.
    pub provider: RuleProvider,
    /// Severity of its violations.
    pub severity: Severity,
}

impl ActiveRule {
    /// Returns the rule id.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        self.provider.id()
    }

    /// Returns the rule descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &RuleDescriptor {
        self.provider.descriptor()
    }
}

/// The rules of one run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct ActiveRuleSet {
    rules: Vec<ActiveRule>,
}

impl ActiveRuleSet {
    /// Returns the rules in execution order.
    #[must_use]
    pub fn rules(&self) -> &[ActiveRule] {
        &self.rules
    }

    /// Returns the rule ids in execution order.
    #[must_use]
    pub fn ids(&self) -> Vec<&RuleId> {
        self.rules.iter().map(ActiveRule::id).collect()
    }

    /// Returns true if the rule is active.
    #[must_use]
    pub fn contains(&self, id: &RuleId) -> bool {
        self.rules.iter().any(|r| r.id() == id)
    }

    /// Returns the number of active rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
