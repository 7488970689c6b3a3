//! Runs the engine over the selected files.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use treelint_core::{Code, ConfigOverride, FileOutcome, LintResult, RuleEngine};
use treelint_rules::StandardRuleSetProvider;

use crate::config_resolver::{self, ConfigSource};
use crate::files::FileSelection;
use crate::RuleArgs;

/// What to do with each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report only.
    Check,
    /// Fix, and write the result unless `dry_run`.
    Format {
        /// Leave files untouched.
        dry_run: bool,
    },
}

/// Outcome of a run over many files.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Merged results of the files that could be processed.
    pub result: LintResult,
    /// Final text of every file with remaining violations.
    pub sources: BTreeMap<PathBuf, String>,
    /// Files that could not be read, parsed or written.
    pub failures: Vec<(PathBuf, String)>,
}

impl RunReport {
    /// Returns true when the run should exit with a failure code.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.result.has_errors() || !self.failures.is_empty()
    }
}

/// An engine together with the files it will process.
pub struct Runner {
    engine: RuleEngine,
    files: Vec<PathBuf>,
}

impl Runner {
    /// Loads configuration, builds the engine and discovers files.
    ///
    /// # Errors
    ///
    /// Fails on unreadable configuration, malformed `--set` values, an invalid
    /// rule catalog or unknown properties.
    pub fn prepare(paths: &[PathBuf], args: &RuleArgs, config: Option<&Path>) -> Result<Self> {
        let roots: Vec<PathBuf> = paths.iter().map(|p| scope_root(p)).collect();
        let loaded = config_resolver::load(&roots, config)?;
        if loaded.source == Some(ConfigSource::Default) {
            tracing::debug!("No config file found, using defaults");
        }

        let engine = RuleEngine::builder()
            .rule_set(&StandardRuleSetProvider)
            .config_snapshot(loaded.snapshot)
            .overrides(overrides(args)?)
            .stop_on_first_violation(args.fail_fast)
            .build()
            .context("Failed to build rule engine")?;

        let files = FileSelection::new(&loaded.files, &args.exclude)?.discover(paths)?;
        Ok(Self { engine, files })
    }

    /// Processes all files in parallel.
    #[must_use]
    pub fn run(&self, mode: Mode) -> RunReport {
        tracing::info!(
            "Processing {} file(s) with {} rule(s)",
            self.files.len(),
            self.engine.rule_providers().len()
        );

        let outcomes: Vec<(PathBuf, Result<(FileOutcome, bool)>)> = self
            .files
            .par_iter()
            .map(|path| (path.clone(), self.process(path, mode)))
            .collect();

        let mut report = RunReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok((outcome, changed)) => {
                    if !outcome.violations.is_empty() {
                        report.sources.insert(path, outcome.text());
                    }
                    report.result.add_file(outcome, changed);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {:#}", path.display(), e);
                    report.failures.push((path, format!("{e:#}")));
                }
            }
        }
        report
    }

    fn process(&self, path: &Path, mode: Mode) -> Result<(FileOutcome, bool)> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let code = Code::from_file(path, content);

        let outcome = match mode {
            Mode::Check => self.engine.lint(&code)?,
            Mode::Format { .. } => self.engine.format(&code)?,
        };
        for failure in &outcome.rule_failures {
            tracing::warn!("{}: {}", path.display(), failure);
        }

        let text = outcome.text();
        let changed = text != code.content();
        if changed {
            match mode {
                Mode::Format { dry_run: false } => {
                    std::fs::write(path, &text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::debug!("Formatted {}", path.display());
                }
                Mode::Format { dry_run: true } => {
                    tracing::info!("Would reformat {}", path.display());
                }
                Mode::Check => {}
            }
        }
        Ok((outcome, changed))
    }
}

/// Directory whose config scope applies to a command-line path.
fn scope_root(path: &Path) -> PathBuf {
    if path.is_dir() {
        return path.to_path_buf();
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Turns the rule flags into engine overrides.
fn overrides(args: &RuleArgs) -> Result<ConfigOverride> {
    let mut overrides = ConfigOverride::new();
    for assignment in &args.properties {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("Invalid --set value '{assignment}', expected key=value");
        };
        overrides.set(key.trim(), value.trim());
    }
    for id in &args.disable {
        overrides = overrides.disable_rule(id.trim());
    }
    if args.experimental {
        overrides = overrides.enable_experimental();
    }
    Ok(overrides)
}
