//! # Text Normalization
//!
//! Maps between raw text and the normalized token stream.
//!
//! * [`clean`] - substitute punctuation placeholders, collapse whitespace, lowercase.
//! * [`tokenize`] - split cleaned text on whitespace.
//! * [`detokenize`] - join tokens and restore punctuation.
//!
//! The round trip preserves token identity, not formatting: source casing
//! and spacing around punctuation are lost.

use crate::punctuation::PunctuationMap;

/// Normalize raw text.
///
/// Every literal occurrence of each punctuation pattern is replaced by its
/// placeholder surrounded by spaces, one full-text pass per entry, in table
/// order. Whitespace runs collapse to single spaces (leading and trailing
/// whitespace is dropped) and the result is lowercased.
pub fn clean(
    text: &str,
    punctuation: &PunctuationMap,
) -> String {
    let mut buf = text.to_string();
    for entry in punctuation.entries() {
        if buf.contains(entry.pattern.as_str()) {
            buf = buf.replace(entry.pattern.as_str(), &format!(" {} ", entry.placeholder));
        }
    }

    buf.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split cleaned text into tokens.
///
/// No returned token contains whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// [`clean`] then [`tokenize`].
pub fn clean_and_tokenize(
    text: &str,
    punctuation: &PunctuationMap,
) -> Vec<String> {
    tokenize(&clean(text, punctuation))
}

/// Render tokens back into readable text.
///
/// Tokens are joined with single spaces; then, for each entry in table order,
/// ``" " + placeholder.to_lowercase()`` is replaced by the literal pattern,
/// which glues punctuation to the preceding word. Finally, the space after an
/// opening parenthesis and after a newline is dropped.
///
/// This differs from a plain join-then-replace: the join is built with a
/// space in front of the first token too, so a placeholder in first
/// position is also restored. That leading space is stripped at the end.
pub fn detokenize<S: AsRef<str>>(
    tokens: &[S],
    punctuation: &PunctuationMap,
) -> String {
    let mut buf = String::with_capacity(tokens.iter().map(|t| t.as_ref().len() + 1).sum());
    for token in tokens {
        buf.push(' ');
        buf.push_str(token.as_ref());
    }

    for entry in punctuation.entries() {
        let needle = format!(" {}", entry.token());
        if buf.contains(&needle) {
            buf = buf.replace(&needle, &entry.pattern);
        }
    }

    let buf = buf.replace("\n ", "\n").replace("( ", "(");

    match buf.strip_prefix(' ') {
        Some(rest) => rest.to_string(),
        None => buf,
    }
}
