//! Exported-method table extraction
//!
//! Generated `g_<class>_nvoc.c` files carry one brace-delimited initializer
//! per control command:
//!
//! ```text
//! {               /*  [3] */
//! #if NVOC_EXPORTED_METHOD_DISABLED_BY_FLAG(0x10u)
//!     /*pFunc=*/      (void (*)(void)) NULL,
//! #else
//!     /*pFunc=*/      (void (*)(void)) subdeviceCtrlCmdGpuGetInfoV2_IMPL,
//! #endif // NVOC_EXPORTED_METHOD_DISABLED_BY_FLAG(0x10u)
//!     /*flags=*/      0x10u,
//!     /*accessRight=*/0x0u,
//!     /*methodId=*/   0x20800102u,
//!     /*paramSize=*/  sizeof(NV2080_CTRL_GPU_GET_INFO_V2_PARAMS),
//!     /*pClassInfo=*/ &(__nvoc_class_def_Subdevice.classInfo),
//! #if NV_PRINTF_STRINGS_ALLOWED
//!     /*func=*/       "subdeviceCtrlCmdGpuGetInfoV2"
//! #endif
//! },
//! ```
//!
//! Extraction runs in two levels. The outer pass finds innermost brace
//! blocks; every field is then located by its own small search over that
//! block's text only, so a `flags` field in one block can never be paired
//! with the `methodId` of another.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::source::read_lossy;
use crate::Result;

/// Placeholder for a function name or parameter type absent from a block
pub const UNKNOWN: &str = "unknown";

/// One exported control command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRecord {
    #[serde(serialize_with = "crate::serialize_hex32")]
    pub method_id: u32,
    pub function_name: String,
    pub flags: u32,
    pub param_type: String,
}

impl CommandRecord {
    /// Canonical id string: eight lowercase hex digits, no prefix
    pub fn id_hex(&self) -> String {
        format!("{:08x}", self.method_id)
    }

    /// Class/subclass prefix used for grouping (first six id digits)
    pub fn prefix(&self) -> String {
        let mut hex = self.id_hex();
        hex.truncate(6);
        hex
    }
}

struct Patterns {
    block: Regex,
    method_id: Regex,
    function: Regex,
    flags: Regex,
    param_type: Regex,
}

static PATTERNS: Lazy<Patterns> = Lazy::new(|| Patterns {
    block: Regex::new(r"\{[^{}]*\}").unwrap(),
    method_id: Regex::new(r"\bmethodId\W*0x([0-9a-fA-F]+)[uU]\b").unwrap(),
    function: Regex::new(r#"\bfunc\W*?"([^"\n]+)""#).unwrap(),
    flags: Regex::new(r"\bflags\W*0x([0-9a-fA-F]+)[uU]\b").unwrap(),
    param_type: Regex::new(r"\bparamSize\W*sizeof\s*\(([^)]+)\)").unwrap(),
});

/// Extract every command record from the text of one generated file
///
/// Records come back in order of appearance. Blocks without a well-formed
/// `methodId` literal are skipped; missing optional fields get their
/// defaults (`UNKNOWN` for names and types, `0` for flags).
pub fn parse_export_table(content: &str) -> Vec<CommandRecord> {
    PATTERNS
        .block
        .find_iter(content)
        .filter_map(|block| parse_block(&PATTERNS, block.as_str()))
        .collect()
}

/// Read a generated file and extract its command records
pub fn parse_export_file(path: &Path) -> Result<Vec<CommandRecord>> {
    let content = read_lossy(path)?;
    let records = parse_export_table(&content);
    tracing::debug!("{} records in {}", records.len(), path.display());
    Ok(records)
}

fn parse_block(patterns: &Patterns, block: &str) -> Option<CommandRecord> {
    let method_id = patterns
        .method_id
        .captures(block)
        .and_then(|caps| u32::from_str_radix(&caps[1], 16).ok())?;

    let function_name = patterns
        .function
        .captures(block)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let flags = patterns
        .flags
        .captures(block)
        .and_then(|caps| u32::from_str_radix(&caps[1], 16).ok())
        .unwrap_or(0);

    let param_type = patterns
        .param_type
        .captures(block)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());

    Some(CommandRecord {
        method_id,
        function_name,
        flags,
        param_type,
    })
}
