//! Command table regeneration inside a hand-maintained header
//!
//! `nv_ctrl_cmd_table.h` holds a generated array between two fixed lines
//! plus hand-written code around it (entry struct, lookup function). Only
//! the array body is rewritten:
//!
//! ```text
//! ...hand-written prefix...
//! static const nv_ctrl_cmd_entry_t g_nvCtrlCmdTable[] = {     <- start anchor
//!     { 0x20800101, "NV2080_CTRL_CMD_GPU_GET_INFO", NULL },
//!     ...
//!     { 0, NULL, NULL }  /* 结束标记 */                          <- end anchor
//! ...hand-written suffix...
//! ```
//!
//! Everything before the start anchor and after the end anchor is kept
//! byte for byte. The file is handled as raw bytes so even content that is
//! not valid UTF-8 survives. There is no way to create the file from
//! scratch: the target and both anchors must already exist.

use std::fs;
use std::io;
use std::path::Path;

use memchr::memmem;

use crate::definitions::CommandDefinition;
use crate::{AnchorKind, Error, Result};

/// First line of the generated region
pub const TABLE_START: &str = "static const nv_ctrl_cmd_entry_t g_nvCtrlCmdTable[] = {";

/// Terminator entry closing the generated region
pub const TABLE_END: &str = "    { 0, NULL, NULL }  /* 结束标记 */";

/// The pair of literal lines delimiting the generated region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchors {
    pub start: String,
    pub end: String,
}

impl Default for Anchors {
    fn default() -> Self {
        Self {
            start: TABLE_START.to_string(),
            end: TABLE_END.to_string(),
        }
    }
}

/// Result of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub entries: usize,
    /// Whether the file content differs from the merged content
    pub changed: bool,
}

/// Render one table line
///
/// The value is written the way the header spelled it; definitions built
/// without a literal fall back to eight hex digits.
pub fn render_entry(definition: &CommandDefinition) -> String {
    let value = if definition.literal.is_empty() {
        format!("0x{:08x}", definition.value)
    } else {
        definition.literal.clone()
    };

    format!("    {{ {}, \"{}\", NULL }},", value, definition.name)
}

/// Replace the region between the anchors with freshly rendered entries
///
/// The end anchor is searched only after the start anchor.
pub fn splice(
    existing: &[u8],
    anchors: &Anchors,
    definitions: &[CommandDefinition],
) -> std::result::Result<Vec<u8>, AnchorKind> {
    let start = memmem::find(existing, anchors.start.as_bytes()).ok_or(AnchorKind::Start)?;
    let body_start = start + anchors.start.len();
    let end = memmem::find(&existing[body_start..], anchors.end.as_bytes())
        .map(|offset| body_start + offset)
        .ok_or(AnchorKind::End)?;
    let suffix_start = end + anchors.end.len();

    let mut region = String::new();
    region.push_str(&anchors.start);
    region.push('\n');
    for definition in definitions {
        region.push_str(&render_entry(definition));
        region.push('\n');
    }
    region.push_str(&anchors.end);

    let mut merged = Vec::with_capacity(start + region.len() + existing.len() - suffix_start);
    merged.extend_from_slice(&existing[..start]);
    merged.extend_from_slice(region.as_bytes());
    merged.extend_from_slice(&existing[suffix_start..]);
    Ok(merged)
}

fn prepare(
    path: &Path,
    anchors: &Anchors,
    definitions: &[CommandDefinition],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let existing = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            Error::TargetMissing {
                path: path.to_path_buf(),
            }
        } else {
            Error::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let merged = splice(&existing, anchors, definitions).map_err(|anchor| Error::MissingAnchor {
        path: path.to_path_buf(),
        anchor,
    })?;

    Ok((existing, merged))
}

/// Compute the merge without touching the file
pub fn check_file(
    path: &Path,
    anchors: &Anchors,
    definitions: &[CommandDefinition],
) -> Result<MergeOutcome> {
    let (existing, merged) = prepare(path, anchors, definitions)?;

    Ok(MergeOutcome {
        entries: definitions.len(),
        changed: existing != merged,
    })
}

/// Splice the table into `path` and write it back when it changed
///
/// Nothing is written when the target or an anchor is missing.
pub fn merge_into_file(
    path: &Path,
    anchors: &Anchors,
    definitions: &[CommandDefinition],
) -> Result<MergeOutcome> {
    let (existing, merged) = prepare(path, anchors, definitions)?;
    let changed = existing != merged;

    if changed {
        fs::write(path, &merged).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Updated {} with {} commands", path.display(), definitions.len());
    } else {
        tracing::info!("{} is already up to date", path.display());
    }

    Ok(MergeOutcome {
        entries: definitions.len(),
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "#ifndef NV_CTRL_CMD_TABLE_H\n\
                          #define NV_CTRL_CMD_TABLE_H\n\n\
                          typedef struct {\n    NvU32 cmd;\n    const char *name;\n    void *handler;\n} nv_ctrl_cmd_entry_t;\n\n";

    const SUFFIX: &str = "\n};\n\n\
                          static inline const char *nv_ctrl_cmd_name(NvU32 cmd)\n{\n    \
                          for (int i = 0; g_nvCtrlCmdTable[i].name; i++)\n        \
                          if (g_nvCtrlCmdTable[i].cmd == cmd)\n            return g_nvCtrlCmdTable[i].name;\n    \
                          return \"UNKNOWN\";\n}\n\n#endif\n";

    fn def(name: &str, literal: &str, value: u32) -> CommandDefinition {
        CommandDefinition {
            name: name.to_string(),
            value,
            literal: literal.to_string(),
        }
    }

    fn header_with(entries: &str) -> String {
        format!("{}{}\n{}{}{}", PREFIX, TABLE_START, entries, TABLE_END, SUFFIX)
    }

    fn sample_table() -> Vec<CommandDefinition> {
        vec![
            def("NV0000_CTRL_CMD_SYSTEM_NOTIFY_EVENT", "0x1002", 0x1002),
            def("NV2080_CTRL_CMD_GPU_GET_INFO", "0x20800101", 0x20800101),
        ]
    }

    #[test]
    fn test_render_entry() {
        let line = render_entry(&def("NV2080_CTRL_CMD_GPU_GET_INFO", "0x20800101", 0x20800101));
        assert_eq!(line, "    { 0x20800101, \"NV2080_CTRL_CMD_GPU_GET_INFO\", NULL },");

        let line = render_entry(&def("NV0000_CTRL_CMD_X", "", 0x1001));
        assert_eq!(line, "    { 0x00001001, \"NV0000_CTRL_CMD_X\", NULL },");
    }

    #[test]
    fn test_splice_replaces_only_the_region() {
        let old = header_with("    { 0x1, \"OLD\", NULL },\n");
        let merged = splice(old.as_bytes(), &Anchors::default(), &sample_table()).unwrap();

        let expected = header_with(
            "    { 0x1002, \"NV0000_CTRL_CMD_SYSTEM_NOTIFY_EVENT\", NULL },\n    \
             { 0x20800101, \"NV2080_CTRL_CMD_GPU_GET_INFO\", NULL },\n",
        );
        assert_eq!(String::from_utf8(merged).unwrap(), expected);
    }

    #[test]
    fn test_splice_preserves_non_utf8_surroundings() {
        let mut old = b"/* \xff legacy \xfe */\n".to_vec();
        old.extend_from_slice(TABLE_START.as_bytes());
        old.extend_from_slice(b"\n    { 0x1, \"OLD\", NULL },\n");
        old.extend_from_slice(TABLE_END.as_bytes());
        old.extend_from_slice(b"\n};\n/* \x80 */\n");

        let merged = splice(&old, &Anchors::default(), &sample_table()).unwrap();
        assert!(merged.starts_with(b"/* \xff legacy \xfe */\n"));
        assert!(merged.ends_with(b"\n};\n/* \x80 */\n"));
        assert!(memmem::find(&merged, b"OLD").is_none());
    }

    #[test]
    fn test_splice_missing_anchors() {
        let anchors = Anchors::default();
        let table = sample_table();

        let no_start = format!("{}{}{}", PREFIX, TABLE_END, SUFFIX);
        assert_eq!(splice(no_start.as_bytes(), &anchors, &table), Err(AnchorKind::Start));

        let no_end = format!("{}{}\n{}", PREFIX, TABLE_START, SUFFIX);
        assert_eq!(splice(no_end.as_bytes(), &anchors, &table), Err(AnchorKind::End));

        // end anchor only before the start anchor
        let reversed = format!("{}{}\n{}\n", PREFIX, TABLE_END, TABLE_START);
        assert_eq!(splice(reversed.as_bytes(), &anchors, &table), Err(AnchorKind::End));
    }

    #[test]
    fn test_custom_anchors() {
        let anchors = Anchors {
            start: "/* BEGIN TABLE */".to_string(),
            end: "/* END TABLE */".to_string(),
        };
        let old = "head\n/* BEGIN TABLE */\nstale\n/* END TABLE */\ntail\n";
        let merged = splice(old.as_bytes(), &anchors, &sample_table()[1..]).unwrap();
        assert_eq!(
            String::from_utf8(merged).unwrap(),
            "head\n/* BEGIN TABLE */\n    { 0x20800101, \"NV2080_CTRL_CMD_GPU_GET_INFO\", NULL },\n/* END TABLE */\ntail\n"
        );
    }

    #[test]
    fn test_merge_round_trip_keeps_prefix_and_suffix_bytes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nv_ctrl_cmd_table.h");
        fs::write(&path, header_with("    { 0x1, \"OLD\", NULL },\n")).unwrap();

        let outcome = merge_into_file(&path, &Anchors::default(), &sample_table()).unwrap();
        assert_eq!(outcome, MergeOutcome { entries: 2, changed: true });

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with(&format!("{}{}\n", PREFIX, TABLE_START)));
        assert!(written.ends_with(&format!("{}{}", TABLE_END, SUFFIX)));
        assert!(written.contains("\"NV2080_CTRL_CMD_GPU_GET_INFO\""));
        assert!(!written.contains("OLD"));

        // second run is a no-op
        let again = merge_into_file(&path, &Anchors::default(), &sample_table()).unwrap();
        assert!(!again.changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
    }

    #[test]
    fn test_merge_missing_target() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nv_ctrl_cmd_table.h");

        let result = merge_into_file(&path, &Anchors::default(), &sample_table());
        assert!(matches!(result, Err(Error::TargetMissing { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_merge_missing_anchor_leaves_file_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nv_ctrl_cmd_table.h");
        let original = format!("{}{}\n{}", PREFIX, TABLE_START, SUFFIX);
        fs::write(&path, &original).unwrap();

        let result = merge_into_file(&path, &Anchors::default(), &sample_table());
        assert!(matches!(
            result,
            Err(Error::MissingAnchor {
                anchor: AnchorKind::End,
                ..
            })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_check_file_does_not_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nv_ctrl_cmd_table.h");
        let original = header_with("    { 0x1, \"OLD\", NULL },\n");
        fs::write(&path, &original).unwrap();

        let outcome = check_file(&path, &Anchors::default(), &sample_table()).unwrap();
        assert!(outcome.changed);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);

        merge_into_file(&path, &Anchors::default(), &sample_table()).unwrap();
        let outcome = check_file(&path, &Anchors::default(), &sample_table()).unwrap();
        assert!(!outcome.changed);
    }
}
