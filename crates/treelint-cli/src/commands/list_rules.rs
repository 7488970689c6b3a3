//! List rules command implementation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use treelint_core::{
    RuleEngine, RuleStatus, CODE_STYLE_PROPERTY, INDENT_SIZE_PROPERTY, INDENT_STYLE_PROPERTY,
    INSERT_FINAL_NEWLINE_PROPERTY, MAX_LINE_LENGTH_PROPERTY,
};
use treelint_rules::StandardRuleSetProvider;

use crate::config_resolver;

/// Runs the list-rules command.
///
/// Rules are listed in run order; the active column reflects the
/// configuration of the current directory.
pub fn run(config: Option<&Path>) -> Result<()> {
    let cwd = PathBuf::from(".");
    let loaded = config_resolver::load(std::slice::from_ref(&cwd), config)?;
    let engine = RuleEngine::builder()
        .rule_set(&StandardRuleSetProvider)
        .config_snapshot(loaded.snapshot)
        .build()
        .context("Failed to build rule engine")?;
    let active = engine.active_rules(Some(&cwd));

    println!("Available rules (in run order):\n");
    println!(
        "{:<42} {:<13} {:<7} Description",
        "Id", "Status", "Active"
    );
    println!("{}", "-".repeat(100));

    for provider in engine.rule_providers() {
        let descriptor = provider.descriptor();
        let status = match descriptor.status {
            RuleStatus::Stable => "stable",
            RuleStatus::Experimental => "experimental",
        };
        let is_active = if active.contains(&descriptor.id) { "yes" } else { "no" };
        println!(
            "{:<42} {:<13} {:<7} {}",
            descriptor.id.to_string(),
            status,
            is_active,
            descriptor.description
        );
    }

    println!("\nProperties:");
    let properties = [
        (INDENT_SIZE_PROPERTY.name(), INDENT_SIZE_PROPERTY.description()),
        (INDENT_STYLE_PROPERTY.name(), INDENT_STYLE_PROPERTY.description()),
        (MAX_LINE_LENGTH_PROPERTY.name(), MAX_LINE_LENGTH_PROPERTY.description()),
        (
            INSERT_FINAL_NEWLINE_PROPERTY.name(),
            INSERT_FINAL_NEWLINE_PROPERTY.description(),
        ),
        (CODE_STYLE_PROPERTY.name(), CODE_STYLE_PROPERTY.description()),
    ];
    for (name, description) in properties {
        println!("  {name:<22} {description}");
    }

    println!("\nUse --disable to turn rules off, e.g.:");
    println!("  treelint check --disable no-var,max-line-length");
    println!("  treelint check --experimental --set max_line_length=120");

    Ok(())
}
