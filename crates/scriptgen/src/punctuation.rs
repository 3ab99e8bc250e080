//! # Punctuation Placeholder Table
//!
//! Punctuation is lifted out of words by substituting each punctuation
//! pattern with a space-delimited placeholder word before whitespace
//! splitting. The table is an explicit ordered list; substitution order is
//! the list order, in both directions.

use serde::{Deserialize, Serialize};

use crate::errors::{SGResult, ScriptgenError};

/// The default ``(pattern, placeholder)`` table.
pub const DEFAULT_PUNCTUATION: &[(&str, &str)] = &[
    (".", "||Period||"),
    (",", "||Comma||"),
    ("\"", "||Quotation_Mark||"),
    (";", "||Semicolon||"),
    ("!", "||Exclamation_Mark||"),
    ("?", "||Question_Mark||"),
    ("(", "||Left_Parentheses||"),
    (")", "||Right_Parentheses||"),
    ("-", "||Dash||"),
    ("\n", "||Return||"),
];

/// One ``pattern -> placeholder`` substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunctuationEntry {
    /// The literal punctuation text.
    pub pattern: String,

    /// The placeholder word standing in for `pattern`.
    pub placeholder: String,
}

impl PunctuationEntry {
    /// The placeholder as it appears in cleaned (lowercased) text.
    pub fn token(&self) -> String {
        self.placeholder.to_lowercase()
    }
}

/// An ordered, validated punctuation placeholder table.
///
/// ## Invariants
/// * patterns and placeholders are non-empty,
/// * placeholders contain no whitespace,
/// * patterns contain no spaces and no cased characters, so neither
///   collapsing whitespace nor lowercasing can produce a new match,
/// * patterns are distinct,
/// * no placeholder contains any pattern, before or after lowercasing,
/// * no lowercased placeholder is a substring of another one,
/// * no pattern contains a lowercased placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PunctuationEntry>", into = "Vec<PunctuationEntry>")]
pub struct PunctuationMap {
    entries: Vec<PunctuationEntry>,
}

impl Default for PunctuationMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_PUNCTUATION
                .iter()
                .map(|&(pattern, placeholder)| PunctuationEntry {
                    pattern: pattern.to_string(),
                    placeholder: placeholder.to_string(),
                })
                .collect(),
        }
    }
}

impl TryFrom<Vec<PunctuationEntry>> for PunctuationMap {
    type Error = ScriptgenError;

    fn try_from(entries: Vec<PunctuationEntry>) -> SGResult<Self> {
        Self::new(entries)
    }
}

impl From<PunctuationMap> for Vec<PunctuationEntry> {
    fn from(map: PunctuationMap) -> Self {
        map.entries
    }
}

impl PunctuationMap {
    /// Build a validated table.
    ///
    /// ## Arguments
    /// * `entries` - the substitutions, in application order.
    ///
    /// ## Returns
    /// The table, or [`ScriptgenError::VocabConflict`] if any invariant fails.
    pub fn new(entries: Vec<PunctuationEntry>) -> SGResult<Self> {
        validate_entries(&entries)?;
        Ok(Self { entries })
    }

    /// Build a validated table from ``(pattern, placeholder)`` pairs.
    pub fn from_pairs<I, P, R>(pairs: I) -> SGResult<Self>
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(pattern, placeholder)| PunctuationEntry {
                    pattern: pattern.into(),
                    placeholder: placeholder.into(),
                })
                .collect(),
        )
    }

    /// The entries, in application order.
    pub fn entries(&self) -> &[PunctuationEntry] {
        &self.entries
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the placeholder for a punctuation pattern.
    pub fn placeholder_for(
        &self,
        pattern: &str,
    ) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.pattern == pattern)
            .map(|e| e.placeholder.as_str())
    }

    /// Look up the punctuation pattern for a cleaned placeholder token.
    pub fn pattern_for(
        &self,
        token: &str,
    ) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.token() == token)
            .map(|e| e.pattern.as_str())
    }

    /// Is `token` a cleaned placeholder token?
    pub fn is_placeholder(
        &self,
        token: &str,
    ) -> bool {
        self.pattern_for(token).is_some()
    }
}

fn validate_entries(entries: &[PunctuationEntry]) -> SGResult<()> {
    let conflict = |msg: String| Err(ScriptgenError::VocabConflict(msg));

    for (idx, entry) in entries.iter().enumerate() {
        if entry.pattern.is_empty() {
            return conflict(format!("punctuation entry {idx} has an empty pattern"));
        }
        if entry
            .pattern
            .chars()
            .any(|c| c == ' ' || c.is_lowercase() || c.is_uppercase())
        {
            return conflict(format!(
                "pattern {:?} must contain no spaces or cased characters",
                entry.pattern
            ));
        }
        if entry.placeholder.is_empty() || entry.placeholder.chars().any(char::is_whitespace) {
            return conflict(format!(
                "placeholder {:?} must be non-empty and contain no whitespace",
                entry.placeholder
            ));
        }
    }

    for (i, a) in entries.iter().enumerate() {
        let a_token = a.token();
        for (j, b) in entries.iter().enumerate() {
            if a.placeholder.contains(&b.pattern) || a_token.contains(&b.pattern) {
                return conflict(format!(
                    "placeholder {:?} contains pattern {:?}",
                    a.placeholder, b.pattern
                ));
            }
            if b.pattern.contains(&a_token) {
                return conflict(format!(
                    "pattern {:?} contains placeholder {:?}",
                    b.pattern, a_token
                ));
            }
            if i == j {
                continue;
            }
            if a.pattern == b.pattern {
                return conflict(format!("duplicate punctuation pattern {:?}", a.pattern));
            }
            if b.token().contains(&a_token) {
                return conflict(format!(
                    "placeholder {:?} is a substring of placeholder {:?}",
                    a.placeholder, b.placeholder
                ));
            }
        }
    }

    Ok(())
}
