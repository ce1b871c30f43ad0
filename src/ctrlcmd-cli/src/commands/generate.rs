//! Generate command handler
//!
//! Rebuilds the command table of `nv_ctrl_cmd_table.h` from the control
//! headers, leaving everything outside the table anchors untouched.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ctrlcmd::{Anchors, DefinitionFilter, Rejection, ScanReport};

/// Handle the generate command
///
/// # Arguments
/// * `ctrl_dir` - Root of the control headers to scan
/// * `output` - Header holding the table anchors
/// * `extra_fragments` - Deny-list fragments added to the built-in ones
/// * `check` - If true, report staleness instead of writing
pub fn handle(
    ctrl_dir: &Path,
    output: &Path,
    extra_fragments: &[String],
    check: bool,
) -> Result<()> {
    let filter =
        DefinitionFilter::default().with_extra_fragments(extra_fragments.iter().cloned());

    let report = ctrlcmd::extract_definitions(ctrl_dir, &filter)
        .with_context(|| format!("Failed to scan {}", ctrl_dir.display()))?;

    if report.files_failed > 0 {
        tracing::warn!("{} headers could not be read", report.files_failed);
    }
    tracing::info!("Rejected: {}", rejection_summary(&report));

    let table = report.into_table();
    if table.is_empty() {
        return Err(ctrlcmd::Error::NoDefinitions {
            root: ctrl_dir.to_path_buf(),
        }
        .into());
    }

    let anchors = Anchors::default();

    if check {
        let outcome = ctrlcmd::check_file(output, &anchors, &table)?;
        if outcome.changed {
            bail!(
                "{} is out of date ({} commands); run ctrlcmd generate",
                output.display(),
                outcome.entries
            );
        }
        println!("{} is up to date ({} commands)", output.display(), outcome.entries);
        return Ok(());
    }

    let outcome = ctrlcmd::merge_into_file(output, &anchors, &table)?;
    if outcome.changed {
        println!("Updated {} with {} commands", output.display(), outcome.entries);
    } else {
        println!("{} already up to date ({} commands)", output.display(), outcome.entries);
    }

    Ok(())
}

/// Per-stage rejection counts in the order the stages run
fn rejection_summary(report: &ScanReport) -> String {
    Rejection::ALL
        .iter()
        .map(|stage| {
            let count = report.rejected.get(stage).copied().unwrap_or(0);
            format!("{} {}", stage.describe(), count)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
