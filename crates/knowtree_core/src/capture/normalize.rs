//! Text keys used for duplicate detection and display titles.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters kept verbatim before a long title is cut.
pub const TITLE_PREFIX_CHARS: usize = 47;
/// Longest title stored without truncation.
pub const TITLE_MAX_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Case- and whitespace-insensitive key for full snippet text.
pub fn content_key(text: &str) -> String {
    WHITESPACE_RE
        .replace_all(&text.to_lowercase(), "")
        .into_owned()
}

/// Key over the first 47 characters, comparable with truncated titles.
pub fn prefix_key(text: &str) -> String {
    let head: String = text.trim().chars().take(TITLE_PREFIX_CHARS).collect();
    content_key(&head)
}

/// Display title for captured text: at most 50 characters, otherwise the
/// first 47 followed by `...`.
pub fn display_title(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= TITLE_MAX_CHARS {
        return text.to_string();
    }
    let mut title: String = text.chars().take(TITLE_PREFIX_CHARS).collect();
    title.push_str(ELLIPSIS);
    title
}

/// Returns the pre-ellipsis part of a title produced by [`display_title`].
pub fn truncated_title_head(title: &str) -> Option<&str> {
    let head = title.strip_suffix(ELLIPSIS)?;
    (head.chars().count() == TITLE_PREFIX_CHARS).then_some(head)
}
