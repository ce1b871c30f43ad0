//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up ctrlcmd defaults.

use std::path::PathBuf;

use crate::config::Config;
use anyhow::{bail, Result};

/// Handle the configure command
///
/// # Arguments
/// * `source_root` - Optional driver source root to set as default
/// * `show` - If true, show current configuration
pub fn handle(source_root: Option<PathBuf>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if let Some(root) = source_root {
        set_source_root(&mut config, root)?;
    } else {
        show_usage();
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    print!("{}", describe(config));

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

fn describe(config: &Config) -> String {
    let show = |path: &Option<PathBuf>| match path {
        Some(p) => p.display().to_string(),
        None => "(derived)".to_string(),
    };

    let mut out = String::new();
    match &config.source_root {
        Some(root) => out.push_str(&format!("Source root: {}\n", root.display())),
        None => out.push_str("No source root configured\n"),
    }
    out.push_str(&format!("Generated dir: {}\n", show(&config.generated_dir)));
    out.push_str(&format!("Ctrl dir: {}\n", show(&config.ctrl_dir)));
    out.push_str(&format!("Output header: {}\n", show(&config.output)));
    if !config.deny_fragments.is_empty() {
        out.push_str(&format!("Extra deny fragments: {}\n", config.deny_fragments.join(", ")));
    }
    out
}

/// Set the source root in configuration
fn set_source_root(config: &mut Config, root: PathBuf) -> Result<()> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let root = root.canonicalize().unwrap_or(root);
    println!("Source root configured: {}", root.display());
    config.set_source_root(root);
    config.save()?;

    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: ctrlcmd configure --source-root /path/to/open-gpu-kernel-modules");
    println!("   or: ctrlcmd configure --show");
    println!();
    println!("Paths under the source root are derived unless overridden in the");
    println!("config file (generated_dir, ctrl_dir, output, deny_fragments).");
}
