//! Text helpers shared by the date normalizer and the notification relay

pub mod error;
pub mod retry;

use regex::Regex;
use std::sync::OnceLock;

/// Trim and collapse every whitespace run (newlines, tabs) to one space
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Collapse an exact immediate repetition of the whole phrase
///
/// `"A B A B"` becomes `"A B"`. Expects whitespace already normalized.
pub fn collapse_repeated_phrase(text: &str) -> &str {
    let mut current = text;
    loop {
        let len = current.len();
        if len < 3 || len % 2 == 0 {
            return current;
        }
        let mid = len / 2;
        if !current.is_char_boundary(mid) || current.as_bytes()[mid] != b' ' {
            return current;
        }
        let (head, tail) = (&current[..mid], &current[mid + 1..]);
        if head != tail {
            return current;
        }
        current = head;
    }
}

/// Truncate text to a maximum length
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
