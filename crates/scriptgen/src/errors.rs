//! # Error Types

/// Errors from scriptgen operations.
#[derive(Debug, thiserror::Error)]
pub enum ScriptgenError {
    /// A token has no id in the vocabulary.
    #[error("unknown token: {token:?}")]
    UnknownToken {
        /// The token that failed to resolve.
        token: String,
    },

    /// An id has no token in the vocabulary.
    #[error("unknown token id: {id}")]
    UnknownId {
        /// The id that failed to resolve.
        id: usize,
    },

    /// The requested context window does not match the predictor's input width.
    #[error("window length ({requested}) does not match predictor input width ({expected})")]
    WindowMismatch {
        /// The requested window length.
        requested: usize,
        /// The width the predictor was built for.
        expected: usize,
    },

    /// The predictor scores a different number of ids than the vocabulary holds.
    #[error("vocab size ({vocab_size}) does not match predictor output width ({predictor_size})")]
    VocabMismatch {
        /// The vocabulary size.
        vocab_size: usize,
        /// The predictor's output width.
        predictor_size: usize,
    },

    /// Vocab size exceeds the capacity of the target token type.
    #[error("vocab size ({size}) exceeds token type capacity")]
    VocabSizeOverflow {
        /// The vocab size that exceeded the capacity.
        size: usize,
    },

    /// Vocabulary data is inconsistent.
    #[error("{0}")]
    VocabConflict(String),

    /// Options are out of range or inconsistent.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The prime text does not normalize to exactly one token.
    #[error("invalid prime: {0}")]
    InvalidPrime(String),

    /// A predictor returned a distribution of the wrong width.
    #[error("predictor returned {len} scores, expected {expected}")]
    BadDistribution {
        /// The number of scores returned.
        len: usize,
        /// The vocabulary size.
        expected: usize,
    },

    /// A persisted artifact is malformed.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for scriptgen operations.
pub type SGResult<T> = core::result::Result<T, ScriptgenError>;
