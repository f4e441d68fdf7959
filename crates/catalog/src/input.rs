//! Parsing helpers shared by the validated input structs.

use unitdesk_core::{DomainError, DomainResult};

/// Parse a non-negative integer amount (prices, rates) from its textual form.
///
/// Accepts surrounding whitespace; rejects signs, fractions and anything that
/// does not fit in a `u64`.
pub fn parse_non_negative(field: &str, raw: &str) -> DomainResult<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::validation(format!(
            "{field} must be a non-negative integer (got {trimmed:?})"
        )));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| DomainError::validation(format!("{field} is out of range")))
}

/// Split a comma-separated skills string into trimmed, non-empty tokens.
///
/// Order is preserved: the first token is the performer's primary skill.
pub fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trimmed required text field.
pub(crate) fn required_text(field: &str, value: Option<String>) -> DomainResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DomainError::validation(format!("{field} is required"))),
    }
}

/// Trimmed optional text field; blank collapses to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
