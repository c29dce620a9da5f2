//! Bearer token normalization.
//!
//! Tokens arrive from login responses and from durable storage in slightly
//! different shapes. Both paths funnel through here so the cached value never
//! carries a scheme prefix, stray whitespace, or a stringified null.

/// Scheme prefix some backends echo back with the token (compared case-insensitively)
const BEARER_PREFIX: &str = "bearer ";

/// Values left behind by clients that stringified a missing token
const ABSENT_SENTINELS: [&str; 2] = ["null", "undefined"];

/// Number of characters shown when a token appears in logs
const REDACTED_PREFIX_LEN: usize = 8;

/// Normalize a raw token as received from a login response or a caller.
///
/// Trims whitespace and strips a leading `Bearer ` (any case). Returns `None`
/// when nothing usable remains.
pub fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unprefixed = match trimmed.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => {
            &trimmed[BEARER_PREFIX.len()..]
        }
        _ => trimmed,
    };
    stored_token(unprefixed)
}

/// Filter a value read back from durable storage.
///
/// Only trims and rejects sentinels; stored values were normalized on the way in.
pub fn stored_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || ABSENT_SENTINELS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Short, log-safe preview of a token
pub fn redact(token: &str) -> String {
    let preview: String = token.chars().take(REDACTED_PREFIX_LEN).collect();
    if preview.len() < token.len() {
        format!("{}...", preview)
    } else {
        preview
    }
}
