// src/chat/faculty_query.rs
use regex::Regex;

lazy_static::lazy_static! {
    static ref LEADING_FILLER: Regex =
        Regex::new(r"(?i)^(who is|search for|find|look for|faculty|professor|teacher|instructor)\b\s*")
            .expect("Invalid regex: leading filler");
    static ref TRAILING_HONORIFIC: Regex =
        Regex::new(r"(?i)\s*\b(ma'am|sir|dr\.?|prof\.?|mr\.?|mrs\.?|ms\.?)$")
            .expect("Invalid regex: trailing honorific");
}

/// Shortest cleaned query accepted; anything shorter falls back to the raw utterance.
pub const MIN_QUERY_LEN: usize = 3;

/// Strips one leading filler phrase and one trailing honorific from a faculty lookup.
pub fn normalize_faculty_query(utterance: &str) -> String {
    let original = utterance.trim();
    let without_prefix = LEADING_FILLER.replace(original, "");
    let cleaned = TRAILING_HONORIFIC.replace(&without_prefix, "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() < MIN_QUERY_LEN {
        tracing::debug!("Faculty query '{}' too short after cleaning, using original", cleaned);
        return original.to_string();
    }

    tracing::debug!("Faculty search - original: '{}', cleaned: '{}'", original, cleaned);
    cleaned.to_string()
}
