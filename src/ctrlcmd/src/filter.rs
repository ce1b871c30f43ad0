//! Heuristic filter separating command codes from same-shaped constants
//!
//! Control headers define many macros that look like commands
//! (`NV2080_CTRL_CMD_..._FLAGS_...`, size limits, message ids). A candidate
//! must survive five stages, always applied in this order:
//!
//! 1. identifier does not contain the message-id marker
//! 2. literal parses as a 32-bit hex number
//! 3. value is at least [`MIN_COMMAND_VALUE`]
//! 4. a value above [`CLASS_ID_FLOOR`] carries a nonzero class id in its high half
//! 5. identifier contains none of the deny-list fragments
//!
//! Each stage is a standalone function so it can be tested or reused alone.

use serde::Serialize;

use crate::definitions::{Candidate, CommandDefinition};

/// Smallest value accepted as a command code
pub const MIN_COMMAND_VALUE: u32 = 0x1000;

/// Values above this must encode a class id in bits 16..32
pub const CLASS_ID_FLOOR: u32 = 0x10000;

/// Identifier marker for payload-framing message ids
pub const MESSAGE_ID_MARKER: &str = "MESSAGE_ID";

/// Identifier fragments that denote metadata rather than commands
pub const DENY_FRAGMENTS: &[&str] = &[
    "_FLAGS_",
    "_MODE_",
    "_TYPE_",
    "_STATE_",
    "_STATUS_",
    "_OFFSET_",
    "_SIZE_",
    "_MAX_",
    "_MIN_",
    "_INDEX_",
    "_COUNT_",
    "_MASK_",
    "_VAL_",
    "_FMT_",
    "_PROTOCOL_",
    "_OWNER_",
    "_BW_",
    "_LEVEL_",
    "_ID_",
    "_CAPS_",
    "_TABLE_",
    "_NONE_",
    "_DEFAULT_",
    "_INVALID_",
    "_SHIFT_",
    "_WIDTH_",
    "_BASE_",
    "_LIMIT_",
    "_RANGE_",
    "_VERSION_",
    "_REV_",
    "_PARAM_",
    "_PARAMS_MESSAGE_ID",
];

/// Stage that rejected a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Rejection {
    MessageId,
    UnparseableLiteral,
    BelowThreshold,
    MissingClassId,
    DeniedFragment,
}

impl Rejection {
    /// All stages in application order
    pub const ALL: [Rejection; 5] = [
        Rejection::MessageId,
        Rejection::UnparseableLiteral,
        Rejection::BelowThreshold,
        Rejection::MissingClassId,
        Rejection::DeniedFragment,
    ];

    pub fn describe(self) -> &'static str {
        match self {
            Rejection::MessageId => "message id",
            Rejection::UnparseableLiteral => "unparseable literal",
            Rejection::BelowThreshold => "below threshold",
            Rejection::MissingClassId => "missing class id",
            Rejection::DeniedFragment => "denied fragment",
        }
    }
}

/// Stage 1
pub fn reject_message_id(name: &str, marker: &str) -> Result<(), Rejection> {
    if name.contains(marker) {
        Err(Rejection::MessageId)
    } else {
        Ok(())
    }
}

/// Stage 2: `0x` literal to value, case-insensitive, no suffix
pub fn parse_literal(literal: &str) -> Result<u32, Rejection> {
    let digits = literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
        .ok_or(Rejection::UnparseableLiteral)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Rejection::UnparseableLiteral);
    }

    u32::from_str_radix(digits, 16).map_err(|_| Rejection::UnparseableLiteral)
}

/// Stage 3
pub fn check_threshold(value: u32, min_value: u32) -> Result<(), Rejection> {
    if value < min_value {
        Err(Rejection::BelowThreshold)
    } else {
        Ok(())
    }
}

/// Stage 4
pub fn check_class_id(value: u32) -> Result<(), Rejection> {
    let class_id = (value >> 16) & 0xFFFF;
    if class_id == 0 && value > CLASS_ID_FLOOR {
        Err(Rejection::MissingClassId)
    } else {
        Ok(())
    }
}

/// Stage 5
pub fn check_deny_list<S: AsRef<str>>(name: &str, fragments: &[S]) -> Result<(), Rejection> {
    if fragments.iter().any(|f| name.contains(f.as_ref())) {
        Err(Rejection::DeniedFragment)
    } else {
        Ok(())
    }
}

/// Ordered predicate chain with its tunable parameters
#[derive(Debug, Clone)]
pub struct DefinitionFilter {
    pub min_value: u32,
    pub message_id_marker: String,
    pub deny_fragments: Vec<String>,
}

impl Default for DefinitionFilter {
    fn default() -> Self {
        Self {
            min_value: MIN_COMMAND_VALUE,
            message_id_marker: MESSAGE_ID_MARKER.to_string(),
            deny_fragments: DENY_FRAGMENTS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl DefinitionFilter {
    /// Append deny-list fragments, skipping empty and repeated ones
    pub fn with_extra_fragments<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for fragment in extra {
            let fragment = fragment.into();
            if !fragment.is_empty() && !self.deny_fragments.contains(&fragment) {
                self.deny_fragments.push(fragment);
            }
        }
        self
    }

    /// Run every stage on one candidate
    pub fn check(&self, candidate: &Candidate) -> Result<CommandDefinition, Rejection> {
        reject_message_id(&candidate.name, &self.message_id_marker)?;
        let value = parse_literal(&candidate.literal)?;
        check_threshold(value, self.min_value)?;
        check_class_id(value)?;
        check_deny_list(&candidate.name, self.deny_fragments.as_slice())?;

        Ok(CommandDefinition {
            name: candidate.name.clone(),
            value,
            literal: candidate.literal.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, literal: &str) -> Candidate {
        Candidate {
            name: name.to_string(),
            literal: literal.to_string(),
        }
    }

    #[test]
    fn test_accepts_real_command() {
        let filter = DefinitionFilter::default();
        let def = filter
            .check(&candidate("NV2080_CTRL_CMD_GPU_GET_INFO", "0x20800101"))
            .unwrap();
        assert_eq!(def.value, 0x20800101);
        assert_eq!(def.name, "NV2080_CTRL_CMD_GPU_GET_INFO");
        assert_eq!(def.literal, "0x20800101");
    }

    #[test]
    fn test_small_constant_rejected_at_threshold() {
        let filter = DefinitionFilter::default();
        // also carries _MAX_, but the threshold stage runs first
        let result = filter.check(&candidate("NV2080_CTRL_GPU_INFO_MAX_LIST_SIZE", "0x20"));
        assert_eq!(result, Err(Rejection::BelowThreshold));
    }

    #[test]
    fn test_flags_table_rejected_by_deny_list() {
        let filter = DefinitionFilter::default();
        let name = "NV0000_CTRL_CMD_SYSTEM_GET_CAPS_FLAGS_TABLE";

        // 0xC01 already fails the threshold; the deny stage rejects it on its own too
        assert!(filter.check(&candidate(name, "0x00000C01")).is_err());
        assert_eq!(check_deny_list(name, DENY_FRAGMENTS), Err(Rejection::DeniedFragment));

        let result = filter.check(&candidate(name, "0x00010C01"));
        assert_eq!(result, Err(Rejection::DeniedFragment));
    }

    #[test]
    fn test_message_id_rejected_first() {
        let filter = DefinitionFilter::default();
        let result = filter.check(&candidate(
            "NV2080_CTRL_CMD_GPU_GET_INFO_PARAMS_MESSAGE_ID",
            "garbage",
        ));
        assert_eq!(result, Err(Rejection::MessageId));
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(parse_literal("0x20800101"), Ok(0x20800101));
        assert_eq!(parse_literal("0X00000c01"), Ok(0xc01));
        assert_eq!(parse_literal("0x"), Err(Rejection::UnparseableLiteral));
        assert_eq!(parse_literal("20800101"), Err(Rejection::UnparseableLiteral));
        assert_eq!(parse_literal("0x+1"), Err(Rejection::UnparseableLiteral));
        assert_eq!(parse_literal("0x123456789"), Err(Rejection::UnparseableLiteral));
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(check_threshold(0xFFF, MIN_COMMAND_VALUE), Err(Rejection::BelowThreshold));
        assert_eq!(check_threshold(0x1000, MIN_COMMAND_VALUE), Ok(()));
    }

    #[test]
    fn test_class_id_stage() {
        assert_eq!(check_class_id(0x20800101), Ok(()));
        assert_eq!(check_class_id(0x00000C01), Ok(()));
        assert_eq!(check_class_id(0x0000FFFF), Ok(()));
        assert_eq!(check_class_id(0x00010000), Ok(()));
    }

    #[test]
    fn test_deny_list_fragments() {
        assert_eq!(check_deny_list("NV2080_CTRL_CMD_GPU_GET_INFO", DENY_FRAGMENTS), Ok(()));
        assert_eq!(
            check_deny_list("NV2080_CTRL_CMD_BUS_MODE_PCIE", DENY_FRAGMENTS),
            Err(Rejection::DeniedFragment)
        );
        // fragments need both underscores
        assert_eq!(check_deny_list("NV2080_CTRL_CMD_GPU_GET_ID", DENY_FRAGMENTS), Ok(()));
    }

    #[test]
    fn test_extra_fragments() {
        let debug_read = candidate("NV2080_CTRL_CMD_DEBUG_READ", "0x20800101");
        assert!(DefinitionFilter::default().check(&debug_read).is_ok());

        let filter = DefinitionFilter::default().with_extra_fragments(["_DEBUG_", "", "_MODE_"]);
        assert_eq!(filter.deny_fragments.len(), DENY_FRAGMENTS.len() + 1);
        assert_eq!(filter.check(&debug_read), Err(Rejection::DeniedFragment));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let filter = DefinitionFilter::default();
        let candidates = vec![
            candidate("NV2080_CTRL_CMD_GPU_GET_INFO", "0x20800101"),
            candidate("NV0000_CTRL_CMD_SYSTEM_GET_BUILD_VERSION", "0x101"),
            candidate("NV0000_CTRL_CMD_CLIENT_GET_ADDR_SPACE_TYPE", "0xd01"),
            candidate("NV0080_CTRL_CMD_FB_GET_CAPS_V2", "0x801307"),
            candidate("NV0080_CTRL_CMD_FIFO_GET_CHANNELLIST", "0x801701"),
            candidate("NV2080_CTRL_CMD_BUS_GET_INFO_V2", "0x20801823"),
        ];

        let first: Vec<CommandDefinition> = candidates
            .iter()
            .filter_map(|c| filter.check(c).ok())
            .collect();
        assert_eq!(first.len(), 3);

        let second: Vec<CommandDefinition> = first
            .iter()
            .filter_map(|d| filter.check(&d.to_candidate()).ok())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stage_order_and_descriptions() {
        assert_eq!(Rejection::ALL.len(), 5);
        assert_eq!(Rejection::ALL[0], Rejection::MessageId);
        assert_eq!(Rejection::ALL[4], Rejection::DeniedFragment);
        for stage in Rejection::ALL {
            assert!(!stage.describe().is_empty());
        }
    }
}
