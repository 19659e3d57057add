//! Char-offset helpers
//!
//! All offsets in this workspace count Unicode scalar values, never
//! bytes. These helpers keep the byte/char conversions in one place.

/// Length of a string in chars
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Slice a string by char offsets, clamping both ends to its length
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let start_byte = byte_of_char(s, start);
    let end_byte = byte_of_char(s, end.max(start));
    &s[start_byte..end_byte]
}

fn byte_of_char(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_slice_ascii() {
        assert_eq!(char_slice("hello world", 6, 11), "world");
        assert_eq!(char_slice("hello", 0, 0), "");
    }

    #[test]
    fn test_char_slice_multibyte() {
        assert_eq!(char_slice("héllo wörld", 6, 11), "wörld");
        assert_eq!(char_len("héllo"), 5);
    }

    #[test]
    fn test_char_slice_clamps() {
        assert_eq!(char_slice("abc", 1, 100), "bc");
        assert_eq!(char_slice("abc", 5, 9), "");
        assert_eq!(char_slice("abc", 2, 1), "");
    }
}
