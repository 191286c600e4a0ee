//! Small display helpers for terminal output.

/// Truncate `s` to at most `max` characters, appending `...` when cut.
///
/// Counts characters, not bytes, so multi-byte text never splits.
pub fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_pass_through() {
        assert_eq!(ellipsize("hello", 10), "hello");
        assert_eq!(ellipsize("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn long_strings_are_cut_with_marker() {
        assert_eq!(ellipsize("a long description here", 10), "a long ...");
    }

    #[test]
    fn multibyte_text_splits_on_characters() {
        let s = "ä".repeat(20);
        let cut = ellipsize(&s, 10);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 10);
    }
}
