//! Discovery of the files to lint.

use anyhow::{Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use treelint_core::config::FilesConfig;

/// Which files a run looks at.
#[derive(Debug, Clone)]
pub struct FileSelection {
    extensions: Vec<String>,
    exclude: Vec<Pattern>,
    respect_gitignore: bool,
}

impl FileSelection {
    /// Builds the selection from the `[files]` config plus `--exclude` flags.
    ///
    /// # Errors
    ///
    /// Returns an error if an exclude pattern is not a valid glob.
    pub fn new(config: &FilesConfig, extra_excludes: &[String]) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .chain(extra_excludes)
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid exclude pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            extensions: config.extensions.clone(),
            exclude,
            respect_gitignore: config.respect_gitignore,
        })
    }

    /// Expands `paths` into a sorted list of files.
    ///
    /// Files named explicitly are kept whatever their extension; directories
    /// are walked for files with a configured extension.
    ///
    /// # Errors
    ///
    /// Returns an error if a path does not exist or cannot be walked.
    pub fn discover(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_file() {
                if !self.is_excluded(path, path) {
                    files.push(normalize_file(path));
                }
                continue;
            }
            if !path.is_dir() {
                anyhow::bail!("No such file or directory: {}", path.display());
            }

            let mut builder = ignore::WalkBuilder::new(path);
            builder
                .hidden(false)
                .git_ignore(self.respect_gitignore)
                .filter_entry(|entry| entry.file_name() != ".git");
            for entry in builder.build() {
                let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
                let file = entry.path();
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                if !self.has_extension(file) {
                    continue;
                }
                if self.is_excluded(file, path) {
                    tracing::debug!("Excluding: {}", file.display());
                    continue;
                }
                files.push(file.to_path_buf());
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Matches the patterns against the path and the path relative to `root`.
    fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        self.exclude
            .iter()
            .any(|pattern| pattern.matches_path(path) || pattern.matches_path(relative))
    }
}

/// Gives a bare file name a `./` parent so its config scope is `.`.
fn normalize_file(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new(".").join(path),
        _ => path.to_path_buf(),
    }
}
