//! # Corpus Encoding
//!
//! Turns a directory of raw text into the persisted preprocessing artifact:
//!
//! ```text
//! *.txt files -> clean/tokenize -> filter rare tokens -> Vocab -> encoded ids
//! ```
//!
//! The artifact is the only thing downstream stages need: the encoded id
//! stream for training, and the vocabulary plus punctuation table for
//! generation.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    errors::{SGResult, ScriptgenError},
    punctuation::PunctuationMap,
    text::clean_and_tokenize,
    types::TokenType,
    vocab::{DEFAULT_PAD_TOKEN, TokenCounter, Vocab, filter_with_counter},
};

/// Read every ``*.txt`` file in `dir`, joined by a single space.
///
/// Files are read in file-name order, so the result does not depend on
/// directory-listing order.
///
/// ## Returns
/// The concatenated text; an error if `dir` is unreadable or holds no
/// ``*.txt`` files.
pub fn load_corpus_dir<P: AsRef<Path>>(dir: P) -> SGResult<String> {
    let dir = dir.as_ref();

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no .txt files in {}", dir.display()),
        )
        .into());
    }
    paths.sort();

    let texts = paths
        .iter()
        .map(fs::read_to_string)
        .collect::<Result<Vec<_>, _>>()?;
    let text = texts.join(" ");

    log::info!(
        "Read {} corpus files ({} bytes) from {}",
        paths.len(),
        text.len(),
        dir.display()
    );

    Ok(text)
}

/// Yield ``(features, target)`` training pairs from an encoded corpus.
///
/// Each `features` slice holds `window_len` consecutive ids; `target` is the
/// id that follows them. Corpora shorter than ``window_len + 1`` yield nothing.
pub fn training_windows<T: TokenType>(
    ids: &[T],
    window_len: usize,
) -> impl Iterator<Item = (&[T], T)> + '_ {
    ids.windows(window_len + 1)
        .map(move |w| (&w[..window_len], w[window_len]))
}

/// Options for [`CorpusEncoder`].
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEncoderOptions {
    /// Tokens occurring `<= min_frequency` times are dropped.
    pub min_frequency: usize,

    /// The reserved padding token.
    pub pad_token: String,

    /// The punctuation placeholder table.
    pub punctuation: PunctuationMap,
}

impl Default for CorpusEncoderOptions {
    fn default() -> Self {
        Self {
            min_frequency: 0,
            pad_token: DEFAULT_PAD_TOKEN.to_string(),
            punctuation: PunctuationMap::default(),
        }
    }
}

impl CorpusEncoderOptions {
    /// Sets the rare-token threshold.
    ///
    /// ## Arguments
    /// * `min_frequency` - tokens occurring this often or less are dropped.
    ///
    /// ## Returns
    /// The updated `CorpusEncoderOptions` instance.
    pub fn with_min_frequency(
        self,
        min_frequency: usize,
    ) -> Self {
        Self {
            min_frequency,
            ..self
        }
    }

    /// Sets the padding token.
    pub fn with_pad_token<S: Into<String>>(
        self,
        pad_token: S,
    ) -> Self {
        Self {
            pad_token: pad_token.into(),
            ..self
        }
    }

    /// Sets the punctuation table.
    pub fn with_punctuation(
        self,
        punctuation: PunctuationMap,
    ) -> Self {
        Self {
            punctuation,
            ..self
        }
    }

    /// Initializes a [`CorpusEncoder`] from these options.
    pub fn init<T: TokenType>(self) -> CorpusEncoder<T> {
        CorpusEncoder::new(self)
    }
}

/// Encodes raw corpus text into a [`PreprocessArtifact`].
#[derive(Debug, Clone)]
pub struct CorpusEncoder<T: TokenType> {
    options: CorpusEncoderOptions,
    _marker: core::marker::PhantomData<T>,
}

impl<T: TokenType> CorpusEncoder<T> {
    /// Create a new encoder.
    pub fn new(options: CorpusEncoderOptions) -> Self {
        Self {
            options,
            _marker: core::marker::PhantomData,
        }
    }

    /// The encoder options.
    pub fn options(&self) -> &CorpusEncoderOptions {
        &self.options
    }

    /// Clean, filter, and encode `text`.
    ///
    /// Rare tokens are removed from the stream before encoding, so every
    /// encoded id belongs to the vocabulary. The padding token gets an id
    /// regardless of the threshold.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, text)))]
    pub fn encode_text(
        &self,
        text: &str,
    ) -> SGResult<PreprocessArtifact<T>> {
        let opts = &self.options;
        let tokens = clean_and_tokenize(text, &opts.punctuation);
        self.encode_tokens(&tokens)
    }

    /// Filter and encode an already cleaned token stream.
    pub fn encode_tokens<S: AsRef<str>>(
        &self,
        tokens: &[S],
    ) -> SGResult<PreprocessArtifact<T>> {
        let opts = &self.options;

        let counter = TokenCounter::from_tokens(tokens);
        let filtered = filter_with_counter(tokens, &counter, opts.min_frequency);
        let vocab = Vocab::<T>::from_counter(&counter, opts.min_frequency, &opts.pad_token)?;
        let encoded = vocab.encode(&filtered)?;

        log::info!(
            "Encoded {} tokens; dropped {} rare tokens (count <= {}); vocab size {}",
            encoded.len(),
            tokens.len() - filtered.len(),
            opts.min_frequency,
            vocab.len()
        );

        PreprocessArtifact::new(encoded, vocab, opts.punctuation.clone())
    }
}

/// The persisted output of preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessArtifact<T: TokenType> {
    encoded: Vec<T>,
    vocab: Vocab<T>,
    punctuation: PunctuationMap,
}

impl<T: TokenType> PreprocessArtifact<T> {
    /// Bundle an encoded corpus with its vocabulary and punctuation table.
    ///
    /// ## Returns
    /// The artifact, or [`ScriptgenError::Artifact`] if an encoded id is out
    /// of range for `vocab`.
    pub fn new(
        encoded: Vec<T>,
        vocab: Vocab<T>,
        punctuation: PunctuationMap,
    ) -> SGResult<Self> {
        if let Some((pos, id)) = encoded
            .iter()
            .enumerate()
            .find(|(_, id)| vocab.lookup_token(**id).is_none())
        {
            return Err(ScriptgenError::Artifact(format!(
                "encoded id {id} at position {pos} is out of range for vocab size {}",
                vocab.len()
            )));
        }

        Ok(Self {
            encoded,
            vocab,
            punctuation,
        })
    }

    /// The encoded corpus.
    pub fn encoded(&self) -> &[T] {
        &self.encoded
    }

    /// The vocabulary.
    pub fn vocab(&self) -> &Vocab<T> {
        &self.vocab
    }

    /// The punctuation table.
    pub fn punctuation(&self) -> &PunctuationMap {
        &self.punctuation
    }

    /// Split into ``(encoded, vocab, punctuation)``.
    pub fn into_parts(self) -> (Vec<T>, Vocab<T>, PunctuationMap) {
        (self.encoded, self.vocab, self.punctuation)
    }

    /// Save as JSON.
    ///
    /// ## Arguments
    /// * `path` - the file to write.
    pub fn save_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> SGResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &self.to_record()?)?;
        writer.flush()?;

        log::info!("Saved preprocessing artifact to {}", path.display());
        Ok(())
    }

    /// Load and validate a JSON artifact.
    ///
    /// ## Arguments
    /// * `path` - the file to read.
    pub fn load_path<P: AsRef<Path>>(path: P) -> SGResult<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let record: ArtifactRecord = serde_json::from_reader(reader)?;
        let artifact = Self::from_record(record)?;

        log::info!(
            "Loaded preprocessing artifact from {} ({} ids, vocab size {})",
            path.display(),
            artifact.encoded.len(),
            artifact.vocab.len()
        );
        Ok(artifact)
    }

    fn to_record(&self) -> SGResult<ArtifactRecord> {
        let encoded = self
            .encoded
            .iter()
            .map(|id| {
                id.to_u64()
                    .ok_or_else(|| ScriptgenError::Artifact(format!("id {id} does not fit u64")))
            })
            .collect::<SGResult<Vec<_>>>()?;

        Ok(ArtifactRecord {
            encoded,
            pad_token: self.vocab.pad_token().to_string(),
            token_to_id: self.vocab.token_to_id_map(),
            id_to_token: self.vocab.tokens().to_vec(),
            punctuation: self.punctuation.clone(),
        })
    }

    fn from_record(record: ArtifactRecord) -> SGResult<Self> {
        let vocab = Vocab::from_tables(record.id_to_token, &record.token_to_id, &record.pad_token)?;
        let encoded = record
            .encoded
            .iter()
            .map(|&id| {
                T::from_u64(id).ok_or_else(|| {
                    ScriptgenError::Artifact(format!("encoded id {id} does not fit the token type"))
                })
            })
            .collect::<SGResult<Vec<_>>>()?;

        Self::new(encoded, vocab, record.punctuation)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactRecord {
    encoded: Vec<u64>,
    pad_token: String,
    token_to_id: BTreeMap<String, usize>,
    id_to_token: Vec<String>,
    punctuation: PunctuationMap,
}

impl<T: TokenType> Serialize for PreprocessArtifact<T> {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        self.to_record()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de, T: TokenType> Deserialize<'de> for PreprocessArtifact<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_record(ArtifactRecord::deserialize(deserializer)?)
            .map_err(serde::de::Error::custom)
    }
}
