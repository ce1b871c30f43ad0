//! # ctrlcmd
//!
//! Control-command table extraction for driver sources.
//!
//! This library provides functionality to:
//! - Parse the exported-method tables of generated `g_<class>_nvoc.c` files
//! - Look up, filter and summarize the extracted command records
//! - Collect `NVxxxx_CTRL_CMD_*` command codes from the control headers
//! - Regenerate the command table inside a hand-maintained lookup header
//!
//! Nothing here is a C parser. Every operation is a textual pattern match
//! that tolerates partial or malformed input and keeps whatever it can.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctrl_dir = Path::new("src/common/sdk/nvidia/inc/ctrl");
//! let report = ctrlcmd::extract_definitions(ctrl_dir, &ctrlcmd::DefinitionFilter::default())?;
//! let table = report.into_table();
//!
//! let outcome = ctrlcmd::merge_into_file(
//!     Path::new("tools/hook/nv_ctrl_cmd_table.h"),
//!     &ctrlcmd::Anchors::default(),
//!     &table,
//! )?;
//! println!("{} entries, changed: {}", outcome.entries, outcome.changed);
//! # Ok(())
//! # }
//! ```

pub mod classes;
pub mod definitions;
pub mod export_table;
pub mod filter;
pub mod header;
pub mod query;
mod source;

use std::fmt;
use std::path::PathBuf;

// Re-export commonly used items
#[doc(inline)]
pub use classes::{
    available_classes, class_name_from_path, class_source_path, summarize_classes, ClassSummary,
};
#[doc(inline)]
pub use definitions::{
    dedup_and_sort, extract_definitions, scan_definitions, Candidate, CommandDefinition,
    ScanReport,
};
#[doc(inline)]
pub use export_table::{parse_export_file, parse_export_table, CommandRecord, UNKNOWN};
#[doc(inline)]
pub use filter::{DefinitionFilter, Rejection};
#[doc(inline)]
pub use header::{check_file, merge_into_file, render_entry, splice, Anchors, MergeOutcome};
#[doc(inline)]
pub use query::{filter_by_pattern, find_all_by_id, find_by_id, normalize_id, prefix_stats};
pub use source::read_lossy;

/// Which of the two table anchors a merge could not locate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    Start,
    End,
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorKind::Start => f.write_str("start-of-table"),
            AnchorKind::End => f.write_str("end-of-table"),
        }
    }
}

/// Errors from extraction and header generation
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Target header {} does not exist; it must be created by hand with both table anchors", path.display())]
    TargetMissing { path: PathBuf },

    #[error("Missing {anchor} anchor in {}", path.display())]
    MissingAnchor { path: PathBuf, anchor: AnchorKind },

    #[error("No command definitions found under {}", root.display())]
    NoDefinitions { root: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Serialize a 32-bit code as `0x` followed by eight hex digits
pub(crate) fn serialize_hex32<S>(
    value: &u32,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("0x{:08x}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_anchor_kind_display() {
        assert_eq!(AnchorKind::Start.to_string(), "start-of-table");
        assert_eq!(AnchorKind::End.to_string(), "end-of-table");
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound {
            path: Path::new("/tmp/missing.c").to_path_buf(),
        };
        assert!(err.to_string().contains("/tmp/missing.c"));

        let err = Error::MissingAnchor {
            path: Path::new("table.h").to_path_buf(),
            anchor: AnchorKind::End,
        };
        assert_eq!(err.to_string(), "Missing end-of-table anchor in table.h");

        let err = Error::TargetMissing {
            path: Path::new("table.h").to_path_buf(),
        };
        assert!(err.to_string().contains("both table anchors"));

        let err = Error::NoDefinitions {
            root: Path::new("ctrl").to_path_buf(),
        };
        assert!(err.to_string().contains("No command definitions"));
    }

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::Read {
            path: Path::new("x.h").to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("denied"));
    }
}
