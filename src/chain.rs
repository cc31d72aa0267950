use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Channel numbers and state for one local/counterparty pair, as written to
/// the output file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelMapEntry {
    pub source_channel: Option<u64>,
    pub destination_channel: Option<u64>,
    pub state: String,
}

/// A leaf of the output map: a channel entry, or the diagnostic stored
/// under `"__error__"` when an endpoint could not be queried at all.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum MapLeaf {
    Channel(ChannelMapEntry),
    Error { message: String },
}

/// counterparty symbol (or raw chain id) -> entry
pub type TransferMap = BTreeMap<String, MapLeaf>;
/// local symbol -> transfers
pub type ChannelMap = BTreeMap<String, TransferMap>;

/// `channel-56` -> 56, a bare `7` -> 7, anything else unparseable -> None.
pub fn parse_channel_number(channel_id: Option<&str>) -> Option<u64> {
    let id = channel_id?;
    match id.strip_prefix("channel-") {
        Some(n) => n.parse().ok(),
        None => id.parse().ok(),
    }
}

/// `STATE_OPEN` -> `OPEN`; a missing or empty state becomes `UNKNOWN`.
pub fn normalize_state(state: Option<&str>) -> String {
    match state {
        Some(s) if !s.is_empty() => s.strip_prefix("STATE_").unwrap_or(s).to_string(),
        _ => "UNKNOWN".to_string(),
    }
}

/// Decide whether `candidate` displaces `existing` for the same
/// local/counterparty pair. OPEN always beats non-OPEN; with equal OPEN-ness
/// the smaller source channel number wins, and an entry without a parseable
/// number loses to any entry that has one. The outcome never depends on the
/// order candidates arrive in, except that a numberless entry keeps its slot
/// against an equally numberless one.
pub fn should_replace(existing: &ChannelMapEntry, candidate: &ChannelMapEntry) -> bool {
    let existing_open = existing.state == "OPEN";
    let candidate_open = candidate.state == "OPEN";
    if !existing_open && candidate_open {
        return true;
    }
    if existing_open && !candidate_open {
        return false;
    }
    match (existing.source_channel, candidate.source_channel) {
        (None, Some(_)) => true,
        (_, None) => false,
        (Some(have), Some(new)) => new < have,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(state: &str, source: Option<u64>) -> ChannelMapEntry {
        ChannelMapEntry {
            source_channel: source,
            destination_channel: None,
            state: state.to_string(),
        }
    }

    #[test]
    fn channel_number_parsing() {
        assert_eq!(parse_channel_number(Some("channel-56")), Some(56));
        assert_eq!(parse_channel_number(Some("channel-abc")), None);
        assert_eq!(parse_channel_number(Some("7")), Some(7));
        assert_eq!(parse_channel_number(None), None);
        assert_eq!(parse_channel_number(Some("channel-56-x")), None);
    }

    #[test]
    fn state_normalization() {
        assert_eq!(normalize_state(Some("STATE_OPEN")), "OPEN");
        assert_eq!(normalize_state(Some("OPEN")), "OPEN");
        assert_eq!(normalize_state(Some("STATE_TRYOPEN")), "TRYOPEN");
        assert_eq!(normalize_state(None), "UNKNOWN");
        assert_eq!(normalize_state(Some("")), "UNKNOWN");
    }

    #[test]
    fn open_beats_non_open_in_both_orders() {
        let init = entry("INIT", Some(10));
        let open = entry("OPEN", Some(99));
        assert!(should_replace(&init, &open));
        assert!(!should_replace(&open, &init));
    }

    #[test]
    fn smaller_source_channel_wins_in_both_orders() {
        let five = entry("OPEN", Some(5));
        let three = entry("OPEN", Some(3));
        assert!(should_replace(&five, &three));
        assert!(!should_replace(&three, &five));
    }

    #[test]
    fn non_open_states_still_compare_by_number() {
        let init = entry("INIT", Some(5));
        let tryopen = entry("TRYOPEN", Some(3));
        assert!(should_replace(&init, &tryopen));
        assert!(!should_replace(&tryopen, &init));
    }

    #[test]
    fn numberless_entry_loses_to_numbered_entry() {
        let numberless = entry("OPEN", None);
        let numbered = entry("OPEN", Some(42));
        assert!(should_replace(&numberless, &numbered));
        assert!(!should_replace(&numbered, &numberless));
    }

    #[test]
    fn numberless_entry_keeps_slot_against_numberless_candidate() {
        let first = entry("OPEN", None);
        let second = entry("OPEN", None);
        assert!(!should_replace(&first, &second));
    }

    #[test]
    fn channel_leaf_serializes_flat_with_explicit_nulls() {
        let leaf = MapLeaf::Channel(ChannelMapEntry {
            source_channel: Some(12),
            destination_channel: None,
            state: "OPEN".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&leaf).unwrap(),
            serde_json::json!({
                "source_channel": 12,
                "destination_channel": null,
                "state": "OPEN"
            })
        );
    }

    #[test]
    fn error_leaf_serializes_as_message_object() {
        let leaf = MapLeaf::Error {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&leaf).unwrap(),
            serde_json::json!({"message": "connection refused"})
        );
    }
}
