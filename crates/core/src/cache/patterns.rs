//! Glob matching for cache keys. `*` matches any run of characters.

/// Checks if a cache key matches a glob pattern.
///
/// The pattern supports `*` as a wildcard that matches any sequence
/// of characters (including empty strings).
///
/// # Examples
///
/// ```
/// use helpdesk_core::cache::pattern_matches;
///
/// assert!(pattern_matches("user:123", "user:123"));
/// assert!(pattern_matches("ticket:*", "ticket:9f1c"));
/// assert!(pattern_matches("*:9f1c", "ticket:9f1c"));
/// assert!(!pattern_matches("ticket:*", "user:456"));
/// ```
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let (first, rest) = match segments.split_first() {
        Some((first, rest)) if !rest.is_empty() => (*first, rest),
        // No wildcard: exact match.
        _ => return pattern == key,
    };
    let Some((last, middle)) = rest.split_last() else {
        return false;
    };

    let Some(mut remaining) = key.strip_prefix(first) else {
        return false;
    };

    for segment in middle.iter().filter(|s| !s.is_empty()) {
        match remaining.find(segment) {
            Some(pos) => remaining = &remaining[pos + segment.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last)
}
