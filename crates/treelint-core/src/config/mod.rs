//! Configuration for treelint.
//!
//! - [`property`]: typed properties and their defaults
//! - [`scope`]: override/discovered/default resolution per scope
//! - [`ConfigFile`]: the TOML file format feeding discovered configs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub mod property;
pub mod scope;

use crate::rule::RuleId;
use crate::types::Severity;
use property::{RuleExecution, EXPERIMENTAL_KEY};
use scope::RawProperties;

/// Contents of a `treelint.toml` / `.treelint.toml` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Opt into experimental rules.
    #[serde(default)]
    pub experimental: Option<bool>,

    /// Property values, e.g. `indent_size = 4`.
    #[serde(default)]
    pub properties: BTreeMap<String, toml::Value>,

    /// Per-rule configurations, keyed by rule id (`no-var`, `custom:rule`).
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,

    /// File selection.
    #[serde(default)]
    pub files: FilesConfig,
}

impl ConfigFile {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Flattens the file into raw properties.
    ///
    /// `[rules.<id>] enabled` becomes the rule execution key and `severity`
    /// becomes the rule severity key, so both resolve per scope like any
    /// other property.
    #[must_use]
    pub fn to_properties(&self) -> RawProperties {
        let mut out: RawProperties = self
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), raw_value(v)))
            .collect();

        if let Some(experimental) = self.experimental {
            let execution = if experimental {
                RuleExecution::Enabled
            } else {
                RuleExecution::Disabled
            };
            out.insert(EXPERIMENTAL_KEY.to_string(), execution.as_str().to_string());
        }

        for (name, rule) in &self.rules {
            let id = RuleId::from(name.as_str());
            if let Some(enabled) = rule.enabled {
                let execution = if enabled {
                    RuleExecution::Enabled
                } else {
                    RuleExecution::Disabled
                };
                out.insert(id.execution_key(), execution.as_str().to_string());
            }
            if let Some(severity) = rule.severity {
                out.insert(id.severity_key(), severity.to_string());
            }
        }

        out
    }

    /// Checks if a rule is enabled by this file alone.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        let id = RuleId::from(rule_id);
        self.rules
            .iter()
            .find(|(name, _)| RuleId::from(name.as_str()) == id)
            .map_or(true, |(_, c)| c.enabled.unwrap_or(true))
    }
}

fn raw_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// File selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// File extensions to lint.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns to exclude from linting.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: vec!["**/target/**".to_string(), "**/build/**".to_string()],
            respect_gitignore: true,
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["kt".to_string(), "kts".to_string()]
}

fn default_true() -> bool {
    true
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}
