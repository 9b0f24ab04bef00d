//! Shared field normalization for wizard step forms.
//!
//! Every step shapes its free-text inputs through these helpers before
//! merging its topic into the aggregate: delimited text becomes a trimmed
//! list, numeric text becomes a parsed value or `None`.

/// Split comma-delimited text into trimmed, non-empty entries.
/// Order is preserved; empty segments (including the result of trailing
/// commas) are dropped.
pub fn normalize_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a numeric field. Blank or unparsable input becomes `None`.
pub fn normalize_number(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Parse a 1-5 rating field. Blank or unparsable input becomes `None`.
/// Out-of-range values are kept as entered; range enforcement belongs to
/// the form control, not the shaping pass.
pub fn normalize_scale(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Join a stored list back into editable text for pre-filling a form.
pub fn list_to_text(items: &[String]) -> String {
    items.join(", ")
}

/// Render a stored numeric value back into editable text.
pub fn number_to_text<N: ToString>(value: &Option<N>) -> String {
    value.as_ref().map(N::to_string).unwrap_or_default()
}
