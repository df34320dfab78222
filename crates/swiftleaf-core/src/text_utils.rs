//! Text cleanup and word splitting shared by the chunker, the session gate and
//! the document library.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize text before segmentation: NFC, no backticks, single spaces, trimmed.
///
/// Backticks are stripped because the text is embedded verbatim in a
/// segmentation prompt.
pub fn sanitize_text(text: &str) -> String {
    let composed: String = text.nfc().filter(|ch| *ch != '`').collect();
    RE_WHITESPACE
        .replace_all(composed.trim(), " ")
        .trim()
        .to_string()
}

/// Flat ordered word list of the sanitized text.
pub fn split_words(text: &str) -> Vec<String> {
    sanitize_text(text)
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whitespace-separated token count of the raw text.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Short preview made of the first `max_words` words, with `...` when cut.
pub fn title_from_text(text: &str, max_words: usize) -> String {
    let words = split_words(text);
    if words.is_empty() {
        return "Untitled".to_string();
    }
    let mut title = words
        .iter()
        .take(max_words.max(1))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > max_words.max(1) {
        title.push_str("...");
    }
    title
}
