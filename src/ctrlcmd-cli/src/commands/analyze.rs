//! Analyze command handlers
//!
//! Lists, searches and summarizes the exported commands of one class.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use ctrlcmd::CommandRecord;
use serde::Serialize;

use super::escape_csv;
use crate::cli::OutputFormat;

const FUNCTION_WIDTH: usize = 50;

/// What to show for the selected class
#[derive(Debug, Clone, Copy)]
pub enum Mode<'a> {
    List { pattern: Option<&'a str> },
    Lookup { method_id: &'a str },
    Stats,
}

/// Handle the analyze command
pub fn handle(
    generated_dir: &Path,
    class: &str,
    mode: Mode<'_>,
    format: OutputFormat,
) -> Result<()> {
    let records = load_records(generated_dir, class)?;

    let output = match mode {
        Mode::List { pattern } => {
            let mut selected: Vec<&CommandRecord> = match pattern {
                Some(p) => ctrlcmd::filter_by_pattern(&records, p),
                None => records.iter().collect(),
            };
            if pattern.is_none() {
                selected.sort_by_key(|r| r.method_id);
            }
            if selected.is_empty() {
                eprintln!("No commands match '{}'", pattern.unwrap_or_default());
                return Ok(());
            }
            render_records(&selected, format)?
        }
        Mode::Lookup { method_id } => {
            if ctrlcmd::normalize_id(method_id).is_none() {
                bail!("Invalid command id '{}' (expected hex, e.g. 0x20803601)", method_id);
            }
            let hits = ctrlcmd::find_all_by_id(&records, method_id);
            let Some(first) = hits.first() else {
                bail!("Command {} not found in class {}", method_id, class);
            };
            if hits.len() > 1 {
                eprintln!("Note: {} records share this id; showing the first", hits.len());
            }
            render_record(first, format)?
        }
        Mode::Stats => render_stats(&records, format)?,
    };

    print!("{}", output);
    Ok(())
}

/// Parse the generated source of `class`
///
/// A missing source lists the classes that do exist before failing.
fn load_records(generated_dir: &Path, class: &str) -> Result<Vec<CommandRecord>> {
    let path = ctrlcmd::class_source_path(generated_dir, class);

    if !path.is_file() {
        eprintln!("Error: {} not found", path.display());
        if let Ok(classes) = ctrlcmd::available_classes(generated_dir) {
            eprintln!();
            eprintln!("Available classes:");
            for name in classes {
                eprintln!("  {}", name);
            }
        }
        bail!("Unknown class '{}'", class);
    }

    let records = ctrlcmd::parse_export_file(&path)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if records.is_empty() {
        tracing::warn!("No exported commands found in {}", path.display());
        bail!("Class '{}' exports no control commands", class);
    }

    tracing::info!("Found {} exported commands in {}", records.len(), path.display());
    Ok(records)
}

fn render_records(records: &[&CommandRecord], format: OutputFormat) -> Result<String> {
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            out.push_str(&serde_json::to_string_pretty(records)?);
            out.push('\n');
        }
        OutputFormat::Csv => {
            out.push_str("method_id,function_name,flags,param_type\n");
            for r in records {
                writeln!(
                    out,
                    "0x{},{},0x{:x},{}",
                    r.id_hex(),
                    escape_csv(&r.function_name),
                    r.flags,
                    escape_csv(&r.param_type)
                )?;
            }
        }
        OutputFormat::Table => {
            let header = format!(
                "{:<10} {:<width$} {:<10} {}",
                "Method ID",
                "Function",
                "Flags",
                "Parameter type",
                width = FUNCTION_WIDTH
            );
            writeln!(out, "{}", header)?;
            writeln!(out, "{}", "-".repeat(header.len()))?;
            for r in records {
                writeln!(
                    out,
                    "0x{} {:<width$} {:<10} {}",
                    r.id_hex(),
                    r.function_name,
                    format!("0x{:x}", r.flags),
                    r.param_type,
                    width = FUNCTION_WIDTH
                )?;
            }
            writeln!(out)?;
            writeln!(out, "{} commands", records.len())?;
        }
    }

    Ok(out)
}

fn render_record(record: &CommandRecord, format: OutputFormat) -> Result<String> {
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            out.push_str(&serde_json::to_string_pretty(record)?);
            out.push('\n');
        }
        OutputFormat::Csv => return render_records(&[record], format),
        OutputFormat::Table => {
            writeln!(out, "Method ID:      0x{}", record.id_hex())?;
            writeln!(out, "Function:       {}", record.function_name)?;
            writeln!(out, "Flags:          0x{:x}", record.flags)?;
            writeln!(out, "Parameter type: {}", record.param_type)?;
        }
    }

    Ok(out)
}

#[derive(Serialize)]
struct PrefixCount<'a> {
    prefix: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct Stats<'a> {
    total: usize,
    prefixes: Vec<PrefixCount<'a>>,
}

fn render_stats(records: &[CommandRecord], format: OutputFormat) -> Result<String> {
    let counts = ctrlcmd::prefix_stats(records);
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            let stats = Stats {
                total: records.len(),
                prefixes: counts
                    .iter()
                    .map(|(prefix, count)| PrefixCount {
                        prefix,
                        count: *count,
                    })
                    .collect(),
            };
            out.push_str(&serde_json::to_string_pretty(&stats)?);
            out.push('\n');
        }
        OutputFormat::Csv => {
            out.push_str("prefix,count\n");
            for (prefix, count) in &counts {
                writeln!(out, "{},{}", prefix, count)?;
            }
        }
        OutputFormat::Table => {
            writeln!(out, "Total commands: {}", records.len())?;
            writeln!(out)?;
            writeln!(out, "By prefix:")?;
            for (prefix, count) in &counts {
                writeln!(out, "  {}xxxx: {}", prefix, count)?;
            }
        }
    }

    Ok(out)
}
