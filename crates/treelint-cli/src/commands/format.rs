//! Format command implementation.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::runner::{Mode, Runner};
use crate::{OutputFormat, RuleArgs};

/// Runs the format command.
///
/// Files are rewritten in place unless `dry_run` is set. Violations that
/// could not be fixed are reported like `check` does.
pub fn run(
    paths: &[PathBuf],
    format: OutputFormat,
    dry_run: bool,
    args: &RuleArgs,
    config: Option<&Path>,
) -> Result<()> {
    let runner = Runner::prepare(paths, args, config)?;
    let report = runner.run(Mode::Format { dry_run });

    super::output::print(&report, format)?;

    if report.failed() {
        std::process::exit(1);
    }

    Ok(())
}
