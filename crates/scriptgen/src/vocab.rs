//! # Vocabulary
//!
//! * [`TokenCounter`] - token frequency table in first-encounter order.
//! * [`filter_rare_tokens`] - drop tokens at or below a frequency threshold.
//! * [`Vocab`] - the ``{ token <-> id }`` bijection, with a reserved padding token.
//!
//! ## Unknown Tokens
//!
//! There is no unknown-token sentinel. Resolving a token or id that is not in
//! the vocabulary is an error ([`ScriptgenError::UnknownToken`],
//! [`ScriptgenError::UnknownId`]); callers must reject such input.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{SGResult, ScriptgenError};
use crate::types::{SGHashMap, TokenType};

/// The default padding token.
pub const DEFAULT_PAD_TOKEN: &str = "<PAD>";

/// Token frequency table.
///
/// Iteration order is the order in which tokens were first seen, which makes
/// frequency ties break deterministically.
#[derive(Debug, Clone, Default)]
pub struct TokenCounter {
    counts: SGHashMap<String, usize>,
    order: Vec<String>,
}

impl TokenCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a counter from a token stream.
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut counter = Self::new();
        counter.update_from_tokens(tokens);
        counter
    }

    /// Add `n` occurrences of `token`.
    pub fn add(
        &mut self,
        token: &str,
        n: usize,
    ) {
        match self.counts.get_mut(token) {
            Some(count) => *count += n,
            None => {
                self.counts.insert(token.to_string(), n);
                self.order.push(token.to_string());
            }
        }
    }

    /// Update counts inplace from a token stream.
    pub fn update_from_tokens<I>(
        &mut self,
        tokens: I,
    ) where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for token in tokens {
            self.add(token.as_ref(), 1);
        }
    }

    /// The count of `token`; zero if never seen.
    pub fn count(
        &self,
        token: &str,
    ) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// The number of distinct tokens.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Has nothing been counted?
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate ``(token, count)`` in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.order
            .iter()
            .map(|token| (token.as_str(), self.count(token)))
    }
}

/// Drop every token whose total frequency is `<= min_frequency`.
///
/// The order of the surviving tokens is preserved.
pub fn filter_rare_tokens<S: AsRef<str>>(
    tokens: &[S],
    min_frequency: usize,
) -> Vec<String> {
    let counter = TokenCounter::from_tokens(tokens);
    filter_with_counter(tokens, &counter, min_frequency)
}

pub(crate) fn filter_with_counter<S: AsRef<str>>(
    tokens: &[S],
    counter: &TokenCounter,
    min_frequency: usize,
) -> Vec<String> {
    tokens
        .iter()
        .map(|token| token.as_ref())
        .filter(|token| counter.count(token) > min_frequency)
        .map(str::to_string)
        .collect()
}

/// Bidirectional ``{ token <-> id }`` vocabulary.
///
/// Ids form the contiguous range ``0..len()``. The padding token always has
/// an id, regardless of its frequency.
#[derive(Debug, Clone)]
pub struct Vocab<T: TokenType> {
    pad_token: String,
    pad_id: T,
    id_to_token: Vec<String>,
    token_to_id: SGHashMap<String, T>,
}

impl<T: TokenType> PartialEq for Vocab<T> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.pad_token == other.pad_token && self.id_to_token == other.id_to_token
    }
}

impl<T: TokenType> Vocab<T> {
    /// Build a vocabulary from a token stream.
    ///
    /// Tokens occurring `<= min_frequency` times are left out. The padding
    /// token is exempt from that rule: its count is bumped by one and it is
    /// always included. Ids are assigned by descending frequency, ties broken
    /// by first encounter; a pad token absent from the corpus is encountered
    /// after every corpus token.
    ///
    /// ## Arguments
    /// * `tokens` - the token stream.
    /// * `min_frequency` - the rare-token threshold.
    /// * `pad_token` - the reserved padding token.
    pub fn from_tokens<S: AsRef<str>>(
        tokens: &[S],
        min_frequency: usize,
        pad_token: &str,
    ) -> SGResult<Self> {
        Self::from_counter(
            &TokenCounter::from_tokens(tokens),
            min_frequency,
            pad_token,
        )
    }

    /// Build a vocabulary from a frequency table.
    ///
    /// See [`Vocab::from_tokens`].
    pub fn from_counter(
        counter: &TokenCounter,
        min_frequency: usize,
        pad_token: &str,
    ) -> SGResult<Self> {
        let mut ranked: Vec<(&str, usize)> = Vec::with_capacity(counter.len() + 1);
        let mut pad_seen = false;
        for (token, count) in counter.iter() {
            if token == pad_token {
                pad_seen = true;
                ranked.push((token, count + 1));
            } else if count > min_frequency {
                ranked.push((token, count));
            }
        }
        if !pad_seen {
            ranked.push((pad_token, 1));
        }

        // Stable: ties keep encounter order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        Self::from_id_to_token(
            ranked.into_iter().map(|(token, _)| token.to_string()).collect(),
            pad_token,
        )
    }

    /// Build a vocabulary from an ``id -> token`` table.
    ///
    /// ## Arguments
    /// * `id_to_token` - tokens, indexed by id.
    /// * `pad_token` - the reserved padding token; must be present.
    pub fn from_id_to_token(
        id_to_token: Vec<String>,
        pad_token: &str,
    ) -> SGResult<Self> {
        if !id_to_token.is_empty() && T::from_usize(id_to_token.len() - 1).is_none() {
            return Err(ScriptgenError::VocabSizeOverflow {
                size: id_to_token.len(),
            });
        }

        let mut token_to_id: SGHashMap<String, T> = SGHashMap::with_capacity(id_to_token.len());
        for (idx, token) in id_to_token.iter().enumerate() {
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                return Err(ScriptgenError::VocabConflict(format!(
                    "token {idx} ({token:?}) is empty or contains whitespace"
                )));
            }
            let id = T::from_usize(idx).ok_or(ScriptgenError::VocabSizeOverflow {
                size: id_to_token.len(),
            })?;
            if token_to_id.insert(token.clone(), id).is_some() {
                return Err(ScriptgenError::VocabConflict(format!(
                    "duplicate token {token:?}"
                )));
            }
        }

        let pad_id = *token_to_id
            .get(pad_token)
            .ok_or_else(|| ScriptgenError::VocabConflict(format!(
                "pad token {pad_token:?} is not in the vocabulary"
            )))?;

        Ok(Self {
            pad_token: pad_token.to_string(),
            pad_id,
            id_to_token,
            token_to_id,
        })
    }

    /// Build a vocabulary from persisted ``id -> token`` and ``token -> id`` tables.
    ///
    /// The tables must be mutually inverse.
    pub fn from_tables(
        id_to_token: Vec<String>,
        token_to_id: &BTreeMap<String, usize>,
        pad_token: &str,
    ) -> SGResult<Self> {
        let vocab = Self::from_id_to_token(id_to_token, pad_token)?;
        if &vocab.token_to_id_map() != token_to_id {
            return Err(ScriptgenError::VocabConflict(
                "token_to_id is not the inverse of id_to_token".to_string(),
            ));
        }
        Ok(vocab)
    }

    /// The number of tokens.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    /// The padding token.
    pub fn pad_token(&self) -> &str {
        &self.pad_token
    }

    /// The padding token's id.
    pub fn pad_id(&self) -> T {
        self.pad_id
    }

    /// Tokens, indexed by id.
    pub fn tokens(&self) -> &[String] {
        &self.id_to_token
    }

    /// Is `token` in the vocabulary?
    pub fn contains(
        &self,
        token: &str,
    ) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Return the id for `token`, if any.
    pub fn lookup_id(
        &self,
        token: &str,
    ) -> Option<T> {
        self.token_to_id.get(token).copied()
    }

    /// Return the token for `id`, if any.
    pub fn lookup_token(
        &self,
        id: T,
    ) -> Option<&str> {
        id.to_usize()
            .and_then(|idx| self.id_to_token.get(idx))
            .map(String::as_str)
    }

    /// Resolve `token` to its id.
    ///
    /// ## Returns
    /// The id, or [`ScriptgenError::UnknownToken`].
    pub fn token_id(
        &self,
        token: &str,
    ) -> SGResult<T> {
        self.lookup_id(token)
            .ok_or_else(|| ScriptgenError::UnknownToken {
                token: token.to_string(),
            })
    }

    /// Resolve `id` to its token.
    ///
    /// ## Returns
    /// The token, or [`ScriptgenError::UnknownId`].
    pub fn token(
        &self,
        id: T,
    ) -> SGResult<&str> {
        self.lookup_token(id).ok_or(ScriptgenError::UnknownId {
            id: id.to_usize().unwrap_or(usize::MAX),
        })
    }

    /// Encode a token stream; fails on the first unknown token.
    pub fn encode<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> SGResult<Vec<T>> {
        tokens.iter().map(|t| self.token_id(t.as_ref())).collect()
    }

    /// Decode an id stream; fails on the first unknown id.
    pub fn decode(
        &self,
        ids: &[T],
    ) -> SGResult<Vec<&str>> {
        ids.iter().map(|&id| self.token(id)).collect()
    }

    /// The ``token -> id`` table, ordered by token.
    pub fn token_to_id_map(&self) -> BTreeMap<String, usize> {
        self.id_to_token
            .iter()
            .enumerate()
            .map(|(idx, token)| (token.clone(), idx))
            .collect()
    }
}

/// Serialized form of a [`Vocab`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VocabRecord {
    pad_token: String,
    token_to_id: BTreeMap<String, usize>,
    id_to_token: Vec<String>,
}

impl<T: TokenType> Serialize for Vocab<T> {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        VocabRecord {
            pad_token: self.pad_token.clone(),
            token_to_id: self.token_to_id_map(),
            id_to_token: self.id_to_token.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de, T: TokenType> Deserialize<'de> for Vocab<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = VocabRecord::deserialize(deserializer)?;
        Vocab::from_tables(record.id_to_token, &record.token_to_id, &record.pad_token)
            .map_err(serde::de::Error::custom)
    }
}
