//! Configuration file resolution with global fallback.
//!
//! Resolves configuration using a deterministic priority order:
//!
//! 1. `--config` flag (explicit path, used alone)
//! 2. `treelint.toml` or `.treelint.toml` in the checked directories and
//!    their ancestors, nearest wins per property
//! 3. `~/.treelint/config.toml` (global fallback)
//! 4. No config found → defaults

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use treelint_core::config::FilesConfig;
use treelint_core::{ConfigFile, ConfigSnapshot};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Loaded from the global config directory (`~/.treelint/`).
    Global(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }
}

/// Everything read from configuration files before linting starts.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Raw properties per directory, handed to the engine.
    pub snapshot: ConfigSnapshot,
    /// File selection of the config closest to the first checked path.
    pub files: FilesConfig,
    /// The config that decided `files`.
    pub source: Option<ConfigSource>,
}

/// Project-level config file names, checked in order.
pub const PROJECT_CONFIG_NAMES: &[&str] = &["treelint.toml", ".treelint.toml"];

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the single config file that applies to `project_dir`.
fn resolve_inner(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(candidate) = project_config(project_dir) {
        tracing::debug!("Found project config: {}", candidate.display());
        return ConfigSource::Project(candidate);
    }

    if let Some(candidate) = global_config(global_dir) {
        tracing::debug!("Found global config: {}", candidate.display());
        return ConfigSource::Global(candidate);
    }

    ConfigSource::Default
}

/// Returns the global config directory path.
///
/// Resolution: `$TREELINT_CONFIG_DIR` > `~/.treelint/`
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("TREELINT_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".treelint"))
}

fn project_config(dir: &Path) -> Option<PathBuf> {
    PROJECT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn global_config(global_dir: Option<PathBuf>) -> Option<PathBuf> {
    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|candidate| candidate.is_file())
}

fn read(path: &Path) -> Result<ConfigFile> {
    ConfigFile::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Loads every config file relevant to `roots`.
///
/// # Errors
///
/// Returns an error if a discovered config file cannot be read or parsed.
pub fn load(roots: &[PathBuf], explicit: Option<&Path>) -> Result<LoadedConfig> {
    load_inner(roots, explicit, global_config_dir())
}

fn load_inner(
    roots: &[PathBuf],
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig::default();

    if let Some(path) = explicit {
        let file = read(path)?;
        tracing::info!("Using config: {}", path.display());
        loaded.files = file.files.clone();
        loaded.snapshot = ConfigSnapshot::new().with_global(file.to_properties());
        loaded.source = Some(ConfigSource::Explicit(path.to_path_buf()));
        return Ok(loaded);
    }

    if let Some(path) = global_config(global_dir.clone()) {
        let file = read(&path)?;
        tracing::info!("Using global config: {}", path.display());
        loaded.snapshot = loaded.snapshot.with_global(file.to_properties());
    }

    for root in roots {
        for (scope, path) in project_configs(root) {
            let file = read(&path)?;
            loaded.snapshot = loaded.snapshot.with_scope(scope, file.to_properties());
        }
    }

    if let Some(root) = roots.first() {
        let source = resolve_inner(root, None, global_dir);
        if let Some(path) = source.path() {
            loaded.files = read(path)?.files;
        }
        loaded.source = Some(source);
    }

    Ok(loaded)
}

/// Config files applying to `root`, as `(scope, file)` pairs, farthest first.
///
/// Configs in ancestors of `root` are attached to `root` itself so that the
/// scopes match the paths produced by the file walk.
fn project_configs(root: &Path) -> Vec<(PathBuf, PathBuf)> {
    let mut configs = Vec::new();

    if let Ok(canonical) = root.canonicalize() {
        let ancestors: Vec<&Path> = canonical.ancestors().skip(1).collect();
        for dir in ancestors.into_iter().rev() {
            if let Some(path) = project_config(dir) {
                tracing::debug!("Found ancestor config: {}", path.display());
                configs.push((root.to_path_buf(), path));
            }
        }
    }

    let walker = ignore::WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .build();
    for entry in walker.flatten() {
        if !entry.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        if let Some(path) = project_config(entry.path()) {
            tracing::debug!("Found project config: {}", path.display());
            configs.push((entry.path().to_path_buf(), path));
        }
    }

    configs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use treelint_core::{EffectiveConfig, MAX_LINE_LENGTH_PROPERTY};

    #[test]
    fn explicit_takes_priority_over_project() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("custom.toml");
        fs::write(&explicit, "").unwrap();

        let project = tmp.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(project.join("treelint.toml"), "").unwrap();

        let result = resolve_inner(&project, Some(&explicit), None);
        assert_eq!(result, ConfigSource::Explicit(explicit));
    }

    #[test]
    fn explicit_does_not_check_existence() {
        let result = resolve_inner(
            Path::new("/tmp"),
            Some(Path::new("/nonexistent.toml")),
            None,
        );
        assert_eq!(
            result,
            ConfigSource::Explicit(PathBuf::from("/nonexistent.toml"))
        );
    }

    #[test]
    fn project_treelint_toml_found() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("treelint.toml"), "").unwrap();

        let result = resolve_inner(tmp.path(), None, None);
        assert_eq!(
            result,
            ConfigSource::Project(tmp.path().join("treelint.toml"))
        );
    }

    #[test]
    fn treelint_toml_preferred_over_dot_prefix() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("treelint.toml"), "").unwrap();
        fs::write(tmp.path().join(".treelint.toml"), "").unwrap();

        let result = resolve_inner(tmp.path(), None, None);
        assert_eq!(
            result,
            ConfigSource::Project(tmp.path().join("treelint.toml"))
        );
    }

    #[test]
    fn global_fallback_when_no_project_config() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join("config.toml"), "").unwrap();

        let result = resolve_inner(project.path(), None, Some(global.path().to_path_buf()));
        assert_eq!(
            result,
            ConfigSource::Global(global.path().join("config.toml"))
        );
    }

    #[test]
    fn no_config_anywhere_returns_default() {
        let project = TempDir::new().unwrap();
        let result = resolve_inner(project.path(), None, None);
        assert_eq!(result, ConfigSource::Default);
        assert!(result.path().is_none());
    }

    #[test]
    fn nested_configs_become_scopes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let nested = root.join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(
            root.join("treelint.toml"),
            "[properties]\nmax_line_length = 100\nindent_size = 2\n",
        )
        .unwrap();
        fs::write(
            nested.join(".treelint.toml"),
            "[properties]\nmax_line_length = 80\n",
        )
        .unwrap();

        let loaded = load_inner(&[root.clone()], None, None).unwrap();
        let at_root = EffectiveConfig::from_raw(loaded.snapshot.properties_for(Some(&root)));
        let below = EffectiveConfig::from_raw(loaded.snapshot.properties_for(Some(&nested)));
        assert_eq!(at_root.get(&MAX_LINE_LENGTH_PROPERTY), 100);
        assert_eq!(below.get(&MAX_LINE_LENGTH_PROPERTY), 80);
        assert_eq!(below.raw("indent_size"), Some("2"));
        assert_eq!(
            loaded.source,
            Some(ConfigSource::Project(root.join("treelint.toml")))
        );
    }

    #[test]
    fn global_config_applies_everywhere() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(
            global.path().join("config.toml"),
            "[properties]\nmax_line_length = 90\n",
        )
        .unwrap();

        let roots = [project.path().to_path_buf()];
        let loaded = load_inner(&roots, None, Some(global.path().to_path_buf())).unwrap();
        let config = EffectiveConfig::from_raw(loaded.snapshot.properties_for(Some(project.path())));
        assert_eq!(config.get(&MAX_LINE_LENGTH_PROPERTY), 90);
    }

    #[test]
    fn explicit_config_is_used_alone() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("treelint.toml"),
            "[properties]\nmax_line_length = 100\n",
        )
        .unwrap();
        let explicit = tmp.path().join("ci.toml");
        fs::write(
            &explicit,
            "[properties]\nmax_line_length = 120\n\n[files]\nexclude = [\"gen/**\"]\n",
        )
        .unwrap();

        let roots = [tmp.path().to_path_buf()];
        let loaded = load_inner(&roots, Some(&explicit), None).unwrap();
        let config = EffectiveConfig::from_raw(loaded.snapshot.properties_for(Some(tmp.path())));
        assert_eq!(config.get(&MAX_LINE_LENGTH_PROPERTY), 120);
        assert_eq!(loaded.files.exclude, vec!["gen/**".to_string()]);
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("treelint.toml"), "[properties\n").unwrap();
        assert!(load_inner(&[tmp.path().to_path_buf()], None, None).is_err());
    }
}
