//! Command-code extraction from control headers
//!
//! Recognized shapes:
//!
//! ```text
//! #define NV2080_CTRL_CMD_GPU_GET_INFO (0x20800101) /* finn: Evaluated from ... */
//! #define NV2080_CTRL_CMD_GPU_GET_INFO 0x20800101U
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::filter::{DefinitionFilter, Rejection};
use crate::source::{read_lossy, walk_files_with_suffix};
use crate::Result;

/// File-name suffix of the headers that are scanned
pub const HEADER_SUFFIX: &str = ".h";

/// A `#define` that has the shape of a command code but is not yet filtered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    /// Hex literal as written, without parentheses or unsigned suffix
    pub literal: String,
}

/// A command code that passed every filter stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(serialize_with = "crate::serialize_hex32")]
    pub value: u32,
    #[serde(skip)]
    pub literal: String,
}

impl CommandDefinition {
    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            name: self.name.clone(),
            literal: self.literal.clone(),
        }
    }
}

static DEFINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"#define\s+(NV[A-Za-z0-9_]*_CTRL_CMD_[A-Z0-9_]+)\s+\(?(0x[0-9a-fA-F]+)[uU]?\)?(?s:\s*/\*.*?\*/)?",
    )
    .unwrap()
});

/// Find every command-shaped `#define` in a header's text, in order
pub fn scan_definitions(content: &str) -> Vec<Candidate> {
    DEFINE_PATTERN
        .captures_iter(content)
        .map(|caps| Candidate {
            name: caps[1].to_string(),
            literal: caps[2].to_string(),
        })
        .collect()
}

/// Result of walking a header tree
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Accepted definitions in traversal order, duplicates included
    pub definitions: Vec<CommandDefinition>,
    pub files_scanned: usize,
    pub files_failed: usize,
    pub rejected: BTreeMap<Rejection, usize>,
}

impl ScanReport {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Deduplicated table sorted by value
    pub fn into_table(self) -> Vec<CommandDefinition> {
        dedup_and_sort(self.definitions)
    }

    fn collect(&mut self, content: &str, filter: &DefinitionFilter, path: &Path) {
        for candidate in scan_definitions(content) {
            match filter.check(&candidate) {
                Ok(definition) => self.definitions.push(definition),
                Err(stage) => {
                    tracing::debug!(
                        "{}: rejected {} ({})",
                        path.display(),
                        candidate.name,
                        stage.describe()
                    );
                    *self.rejected.entry(stage).or_default() += 1;
                }
            }
        }
    }
}

/// Walk `root` and collect the command definitions of every header
///
/// A missing root is an error. A header that cannot be read is logged and
/// skipped; the walk carries on with the rest.
pub fn extract_definitions(root: &Path, filter: &DefinitionFilter) -> Result<ScanReport> {
    tracing::info!("Extracting commands from {}", root.display());

    let mut report = ScanReport::default();
    walk_files_with_suffix(root, HEADER_SUFFIX, |path| match read_lossy(path) {
        Ok(content) => {
            report.files_scanned += 1;
            report.collect(&content, filter, path);
        }
        Err(err) => {
            report.files_failed += 1;
            tracing::error!("Error reading {}: {}", path.display(), err);
        }
    })?;

    tracing::info!(
        "Found {} command definitions in {} headers ({} rejected, {} unreadable)",
        report.definitions.len(),
        report.files_scanned,
        report.rejected_total(),
        report.files_failed
    );

    Ok(report)
}

/// Keep the first definition of each value, then sort by value
pub fn dedup_and_sort(definitions: Vec<CommandDefinition>) -> Vec<CommandDefinition> {
    let mut seen = HashSet::new();
    let mut table: Vec<CommandDefinition> = definitions
        .into_iter()
        .filter(|d| seen.insert(d.value))
        .collect();

    table.sort_by_key(|d| d.value);
    table
}
