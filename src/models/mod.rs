// src/models/mod.rs
pub mod auth;
pub mod chat;
pub mod mess;
pub mod vtop;

use serde::{Deserialize, Deserializer};

/// Accepts `12`, `"12"` or `null` for numeric fields the front end sends loosely.
pub(crate) fn optional_u32_lenient<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a positive day number, got {}", n))),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a day number, got \"{}\"", s))),
        Some(other) => Err(D::Error::custom(format!("expected a day number, got {}", other))),
    }
}

/// Renders strings as-is and numbers without quotes; VTOP mixes both for marks.
pub(crate) fn optional_text_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Like `optional_text_lenient`, but the value must be present.
pub(crate) fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    optional_text_lenient(deserializer)?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| D::Error::custom("missing required value"))
}
