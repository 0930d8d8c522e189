//! Conservative merging of code produced across steps.

/// Merge `incoming` into `existing`.
///
/// Appends `incoming` after a blank line unless it is blank or already present
/// verbatim. Near-duplicates (e.g. a re-indented copy) are appended.
pub fn merge_code(existing: &str, incoming: &str) -> String {
    let trimmed = incoming.trim();
    if trimmed.is_empty() || existing.contains(trimmed) {
        return existing.to_string();
    }
    if existing.is_empty() {
        return incoming.to_string();
    }
    format!("{existing}\n\n{incoming}")
}
