//! Utility functions for the bridge service

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Truncate a label to a maximum number of characters, on a char boundary
///
/// Chat platforms cap channel names (100) and nicknames (32); anything the
/// bridge derives from upstream data goes through this before it is sent.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    label.chars().take(max_chars).collect()
}

/// Compose a display name with an affiliation tag, respecting the 32-char
/// nickname limit by trimming the base name first
pub fn tagged_nickname(base: &str, affiliation: &str) -> String {
    const NICK_LIMIT: usize = 32;
    let suffix = format!(" | {}", affiliation);
    let suffix_len = suffix.chars().count();
    if suffix_len >= NICK_LIMIT {
        return truncate_label(affiliation, NICK_LIMIT);
    }
    let base = truncate_label(base, NICK_LIMIT - suffix_len);
    format!("{}{}", base, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_leaves_short_labels_alone() {
        assert_eq!(truncate_label("Alpha", 100), "Alpha");
    }

    #[test]
    fn truncate_cuts_on_char_boundary() {
        assert_eq!(truncate_label("αβγδ", 2), "αβ");
    }

    #[test]
    fn tagged_nickname_fits_limit() {
        let nick = tagged_nickname("AVeryLongDisplayNameIndeedYes", "Georgia Tech");
        assert!(nick.chars().count() <= 32);
        assert!(nick.ends_with("| Georgia Tech"));
    }

    #[test]
    fn tagged_nickname_short_name_untouched() {
        assert_eq!(tagged_nickname("kez", "UBC"), "kez | UBC");
    }

    #[test]
    fn tagged_nickname_oversized_affiliation_falls_back() {
        let tag = "A".repeat(40);
        let nick = tagged_nickname("kez", &tag);
        assert_eq!(nick.chars().count(), 32);
    }
}
