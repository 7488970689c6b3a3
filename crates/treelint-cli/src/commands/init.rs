//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const CONFIG_FILE_NAME: &str = "treelint.toml";

const DEFAULT_CONFIG: &str = r#"# treelint configuration
#
# Files in subdirectories may carry their own treelint.toml; the nearest
# config wins for each property.

# Run experimental rules
experimental = false

[properties]
indent_size = 4
indent_style = "space"
# "off" disables the max-line-length rule
max_line_length = "off"
insert_final_newline = true
code_style = "official"

[files]
extensions = ["kt", "kts"]
# Glob patterns to exclude from linting
exclude = [
    "**/build/**",
    "**/generated/**",
]
# Respect .gitignore files
respect_gitignore = true

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden.
# Bare ids refer to the standard rule set.

[rules.no-var]
enabled = true
# severity = "warning"

# [rules.max-line-length]
# severity = "warning"

# [rules.no-single-line-block-comment]
# enabled = true  # enables this experimental rule alone
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new(CONFIG_FILE_NAME), force)?;

    println!("Created {CONFIG_FILE_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE_NAME} to configure rules");
    println!("  2. Run: treelint check");

    Ok(())
}

fn write_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use treelint_core::{ConfigFile, EffectiveConfig, MAX_LINE_LENGTH_PROPERTY};

    #[test]
    fn default_config_parses() {
        let file = ConfigFile::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(file.experimental, Some(false));
        assert!(file.is_rule_enabled("no-var"));
        assert!(file.files.respect_gitignore);

        let config = EffectiveConfig::from_raw(file.to_properties());
        assert_eq!(config.get(&MAX_LINE_LENGTH_PROPERTY), usize::MAX);
        assert!(!config.experimental_enabled());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "# mine\n").unwrap();

        assert!(write_config(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");

        write_config(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
