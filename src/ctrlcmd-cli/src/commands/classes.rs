//! Classes command handler

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use ctrlcmd::ClassSummary;

use super::escape_csv;
use crate::cli::OutputFormat;

/// Handle the classes command
pub fn handle(generated_dir: &Path, format: OutputFormat) -> Result<()> {
    let summaries = ctrlcmd::summarize_classes(generated_dir)
        .with_context(|| format!("Failed to list classes in {}", generated_dir.display()))?;

    if summaries.is_empty() {
        eprintln!("No classes with exported commands in {}", generated_dir.display());
        return Ok(());
    }

    print!("{}", render(&summaries, format)?);
    Ok(())
}

fn render(summaries: &[ClassSummary], format: OutputFormat) -> Result<String> {
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            out.push_str(&serde_json::to_string_pretty(summaries)?);
            out.push('\n');
        }
        OutputFormat::Csv => {
            out.push_str("name,commands\n");
            for s in summaries {
                writeln!(out, "{},{}", escape_csv(&s.name), s.commands)?;
            }
        }
        OutputFormat::Table => {
            let width = summaries
                .iter()
                .map(|s| s.name.len())
                .max()
                .unwrap_or(0)
                .max("Class".len());

            writeln!(out, "{:<width$}  Commands", "Class", width = width)?;
            writeln!(out, "{}", "-".repeat(width + 10))?;
            for s in summaries {
                writeln!(out, "{:<width$}  {}", s.name, s.commands, width = width)?;
            }
            writeln!(out)?;
            let total: usize = summaries.iter().map(|s| s.commands).sum();
            writeln!(out, "{} classes, {} commands", summaries.len(), total)?;
        }
    }

    Ok(out)
}
