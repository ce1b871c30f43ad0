//! Generated class sources
//!
//! Each class with exported methods has a translation unit named
//! `g_<class>_nvoc.c` in the generated directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::export_table::parse_export_file;
use crate::{Error, Result};

const FILE_PREFIX: &str = "g_";
const FILE_SUFFIX: &str = "_nvoc.c";

/// A class and the number of control commands it exports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub name: String,
    pub commands: usize,
}

/// Path of the generated source for `class` (matched case-insensitively)
pub fn class_source_path(generated_dir: &Path, class: &str) -> PathBuf {
    generated_dir.join(format!("{}{}{}", FILE_PREFIX, class.to_lowercase(), FILE_SUFFIX))
}

/// Class name encoded in a generated file name, if it follows the convention
pub fn class_name_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let class = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;

    if class.is_empty() {
        None
    } else {
        Some(class.to_string())
    }
}

fn class_sources(generated_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !generated_dir.is_dir() {
        return Err(Error::NotFound {
            path: generated_dir.to_path_buf(),
        });
    }

    let sources = WalkDir::new(generated_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| class_name_from_path(e.path()).map(|name| (name, e.into_path())))
        .collect();

    Ok(sources)
}

/// Names of every class with a generated source, in lexicographic order
pub fn available_classes(generated_dir: &Path) -> Result<Vec<String>> {
    Ok(class_sources(generated_dir)?
        .into_iter()
        .map(|(name, _)| name)
        .collect())
}

/// Parse every generated source and report the classes that export commands
///
/// A source that cannot be read is logged and left out.
pub fn summarize_classes(generated_dir: &Path) -> Result<Vec<ClassSummary>> {
    let mut summaries = Vec::new();

    for (name, path) in class_sources(generated_dir)? {
        match parse_export_file(&path) {
            Ok(records) if !records.is_empty() => summaries.push(ClassSummary {
                name,
                commands: records.len(),
            }),
            Ok(_) => {}
            Err(err) => tracing::error!("Error reading {}: {}", path.display(), err),
        }
    }

    Ok(summaries)
}
