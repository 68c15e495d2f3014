//! Tag parsing and serialization.
//!
//! Tags travel over the wire as a single comma-joined string (a legacy
//! transport compromise); internally a note's tags are an ordered list of
//! trimmed, non-empty strings, deduplicated by first occurrence. Matching
//! is exact and case-sensitive.

/// Parse a comma-joined tag string into the normalized tag list.
///
/// Splits on commas, trims each element, drops empties, and removes
/// duplicates while preserving the first occurrence's position.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let tag = part.trim();
        if tag.is_empty() {
            continue;
        }
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Normalize an already-split tag list the same way [`parse_tags`] does.
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    parse_tags(&raw.join(","))
}

/// Serialize a tag list to its comma-joined boundary form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}
