//! Byte pattern search helpers shared by the codec, the cascade and the fixers.

/// Position of the first `needle` in `haystack` at or after `from`.
pub fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() || haystack.len() - from < needle.len() {
        return None;
    }

    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Position of the last `needle` in `haystack`.
pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// `true` if `needle` occurs within the last `window` bytes of `haystack`.
pub fn ends_within(haystack: &[u8], needle: &[u8], window: usize) -> bool {
    let start = haystack.len().saturating_sub(window);
    find(haystack, needle, start).is_some()
}
