//! Check command implementation.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::runner::{Mode, Runner};
use crate::{OutputFormat, RuleArgs};

/// Runs the check command.
pub fn run(
    paths: &[PathBuf],
    format: OutputFormat,
    args: &RuleArgs,
    config: Option<&Path>,
) -> Result<()> {
    let runner = Runner::prepare(paths, args, config)?;
    let report = runner.run(Mode::Check);

    super::output::print(&report, format)?;

    if report.failed() {
        std::process::exit(1);
    }

    Ok(())
}
