//! Lookups and summaries over extracted command records
//!
//! All functions are pure and never reorder their input slice.

use std::collections::BTreeMap;

use crate::export_table::CommandRecord;

/// Normalize a user-supplied command id
///
/// Accepts `0x20803601`, `20803601`, `0X20803601` and surrounding
/// whitespace. Returns `None` when the text is not a 32-bit hex number.
pub fn normalize_id(id: &str) -> Option<u32> {
    let trimmed = id.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    u32::from_str_radix(digits, 16).ok()
}

/// Find the first record with the given id
pub fn find_by_id<'a>(records: &'a [CommandRecord], id: &str) -> Option<&'a CommandRecord> {
    let wanted = normalize_id(id)?;
    records.iter().find(|r| r.method_id == wanted)
}

/// Find every record with the given id, in order of appearance
///
/// Generated tables are expected to hold each id once; more than one hit
/// means the first one is what [`find_by_id`] reports.
pub fn find_all_by_id<'a>(records: &'a [CommandRecord], id: &str) -> Vec<&'a CommandRecord> {
    let Some(wanted) = normalize_id(id) else {
        return Vec::new();
    };

    let hits: Vec<&CommandRecord> = records.iter().filter(|r| r.method_id == wanted).collect();
    if hits.len() > 1 {
        tracing::warn!(
            "Command id 0x{:08x} appears {} times; using the first",
            wanted,
            hits.len()
        );
    }
    hits
}

/// Records whose function name, id or parameter type contains `pattern`
///
/// Matching ignores case. The result is sorted by id; records sharing an
/// id keep their original relative order.
pub fn filter_by_pattern<'a>(
    records: &'a [CommandRecord],
    pattern: &str,
) -> Vec<&'a CommandRecord> {
    let needle = pattern.to_lowercase();

    let mut matched: Vec<&CommandRecord> = records
        .iter()
        .filter(|r| {
            r.function_name.to_lowercase().contains(&needle)
                || r.id_hex().contains(&needle)
                || r.param_type.to_lowercase().contains(&needle)
        })
        .collect();

    matched.sort_by_key(|r| r.method_id);
    matched
}

/// Count records per id prefix, ordered by prefix
pub fn prefix_stats(records: &[CommandRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.prefix()).or_default() += 1;
    }
    counts.into_iter().collect()
}
