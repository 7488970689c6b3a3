//! Per-scope configuration resolution.
//!
//! Precedence, highest first:
//!
//! 1. explicit overrides ([`ConfigOverride`]),
//! 2. the nearest discovered config containing the property
//!    ([`ConfigSnapshot`], walking up from the scope),
//! 3. the global discovered config,
//! 4. the property's hard-coded default.
//!
//! Resolution only reads its inputs, so a scope always resolves to the same
//! [`EffectiveConfig`]. [`ConfigResolver`] caches results per scope.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use super::property::{ConfigProperty, RuleExecution, EXPERIMENTAL_KEY};
use crate::rule::RuleId;
use crate::types::Severity;

/// Raw property values keyed by property name.
pub type RawProperties = BTreeMap<String, String>;

/// Explicit per-invocation property values. They beat every discovered config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverride {
    values: RawProperties,
}

impl ConfigOverride {
    /// Creates an empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a raw property value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a raw property value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Disables a rule. Bare names refer to the `standard` rule set.
    #[must_use]
    pub fn disable_rule(self, id: &str) -> Self {
        let key = RuleId::from(id).execution_key();
        self.with(key, RuleExecution::Disabled.as_str())
    }

    /// Enables a rule, including experimental ones.
    #[must_use]
    pub fn enable_rule(self, id: &str) -> Self {
        let key = RuleId::from(id).execution_key();
        self.with(key, RuleExecution::Enabled.as_str())
    }

    /// Opts into experimental rules.
    #[must_use]
    pub fn enable_experimental(self) -> Self {
        self.with(EXPERIMENTAL_KEY, RuleExecution::Enabled.as_str())
    }

    /// Returns the raw values.
    #[must_use]
    pub fn values(&self) -> &RawProperties {
        &self.values
    }

    /// Returns true if no value is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Discovered configuration, captured once before linting starts.
///
/// Each entry maps a directory to the raw properties found there. The
/// optional global entry applies below every directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    scoped: BTreeMap<PathBuf, RawProperties>,
    global: RawProperties,
}

impl ConfigSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or merges into) the properties discovered in `directory`.
    #[must_use]
    pub fn with_scope(mut self, directory: impl Into<PathBuf>, properties: RawProperties) -> Self {
        self.scoped
            .entry(directory.into())
            .or_default()
            .extend(properties);
        self
    }

    /// Sets the global fallback properties.
    #[must_use]
    pub fn with_global(mut self, properties: RawProperties) -> Self {
        self.global = properties;
        self
    }

    /// Returns the discovered directories.
    pub fn scopes(&self) -> impl Iterator<Item = &Path> {
        self.scoped.keys().map(PathBuf::as_path)
    }

    /// Merges the discovered properties applying to `scope`.
    ///
    /// `scope` may be a file or a directory; every ancestor is considered and
    /// the nearest one wins per property.
    #[must_use]
    pub fn properties_for(&self, scope: Option<&Path>) -> RawProperties {
        let mut merged = self.global.clone();
        if let Some(scope) = scope {
            let chain: Vec<&Path> = scope.ancestors().collect();
            for directory in chain.into_iter().rev() {
                if let Some(properties) = self.scoped.get(directory) {
                    merged.extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }
        merged
    }
}

/// The resolved configuration of one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveConfig {
    values: RawProperties,
}

impl EffectiveConfig {
    /// Builds an effective configuration directly from raw values.
    #[must_use]
    pub fn from_raw(values: RawProperties) -> Self {
        Self { values }
    }

    /// Resolves the configuration of `scope`.
    #[must_use]
    pub fn resolve(
        snapshot: &ConfigSnapshot,
        overrides: &ConfigOverride,
        scope: Option<&Path>,
    ) -> Self {
        let mut values = snapshot.properties_for(scope);
        values.extend(
            overrides
                .values()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Self { values }
    }

    /// Returns the typed value of a property.
    ///
    /// Values that do not parse fall back to the default.
    #[must_use]
    pub fn get<T: Copy + 'static>(&self, property: &ConfigProperty<T>) -> T {
        match self.values.get(property.name()) {
            Some(raw) => property.parse(raw).unwrap_or_else(|| {
                warn!(
                    "Invalid value '{}' for property '{}', using the default",
                    raw,
                    property.name()
                );
                property.default_value()
            }),
            None => property.default_value(),
        }
    }

    /// Returns the raw value of a property.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns all raw values.
    #[must_use]
    pub fn values(&self) -> &RawProperties {
        &self.values
    }

    /// Returns the execution setting stored under `key`, if any.
    #[must_use]
    pub fn rule_execution(&self, key: &str) -> Option<RuleExecution> {
        let raw = self.raw(key)?;
        let parsed = RuleExecution::parse(raw);
        if parsed.is_none() {
            warn!("Invalid rule execution value '{}' for '{}'", raw, key);
        }
        parsed
    }

    /// Returns true if experimental rules were opted into.
    #[must_use]
    pub fn experimental_enabled(&self) -> bool {
        self.rule_execution(EXPERIMENTAL_KEY) == Some(RuleExecution::Enabled)
    }

    /// Returns the configured severity of a rule, if overridden.
    #[must_use]
    pub fn rule_severity(&self, id: &RuleId) -> Option<Severity> {
        let key = id.severity_key();
        let raw = self.raw(&key)?;
        let parsed = Severity::parse(raw);
        if parsed.is_none() {
            warn!("Invalid severity '{}' for '{}'", raw, key);
        }
        parsed
    }
}

/// Resolves and caches [`EffectiveConfig`] per scope.
///
/// Safe to share between threads linting different files.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    snapshot: ConfigSnapshot,
    overrides: ConfigOverride,
    cache: Mutex<HashMap<Option<PathBuf>, Arc<EffectiveConfig>>>,
}

impl ConfigResolver {
    /// Creates a resolver over fixed inputs.
    #[must_use]
    pub fn new(snapshot: ConfigSnapshot, overrides: ConfigOverride) -> Self {
        Self {
            snapshot,
            overrides,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the explicit overrides.
    #[must_use]
    pub fn overrides(&self) -> &ConfigOverride {
        &self.overrides
    }

    /// Returns the discovered configuration.
    #[must_use]
    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Resolves the configuration for `scope`, using the cache.
    #[must_use]
    pub fn resolve(&self, scope: Option<&Path>) -> Arc<EffectiveConfig> {
        let key = scope.map(Path::to_path_buf);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(key).or_insert_with(|| {
            Arc::new(EffectiveConfig::resolve(
                &self.snapshot,
                &self.overrides,
                scope,
            ))
        }))
    }
}
