//! # Sequence Predictors
//!
//! [`SequencePredictor`] is the contract the generator consumes: a fixed
//! width window of ids in, one score per vocabulary id out. How the scores
//! are produced (network, device, numeric precision) is the implementor's
//! business.
//!
//! [`BigramPredictor`] is a counting baseline that conditions only on the
//! most recent id of the window.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    corpus::training_windows,
    errors::{SGResult, ScriptgenError},
    types::TokenType,
};

/// The default context window width.
pub const DEFAULT_WINDOW_LEN: usize = 10;

/// The default additive smoothing for [`BigramPredictor`].
pub const DEFAULT_ALPHA: f32 = 0.1;

/// The file extension used for predictor artifacts.
pub const PREDICTOR_EXTENSION: &str = "predictor.json";

/// Next-token predictor over a fixed width window.
///
/// Implementations are shared read-only across concurrent generations;
/// `predict` must not depend on call order.
pub trait SequencePredictor<T: TokenType>: Send + Sync {
    /// The window width the predictor was built for.
    fn window_len(&self) -> usize;

    /// The number of ids scored by [`SequencePredictor::predict`].
    fn vocab_size(&self) -> usize;

    /// Score every vocabulary id as the successor of `window`.
    ///
    /// ## Arguments
    /// * `window` - exactly [`SequencePredictor::window_len`] ids, oldest first.
    ///
    /// ## Returns
    /// [`SequencePredictor::vocab_size`] non-negative scores, indexed by id,
    /// summing to 1.
    fn predict(
        &self,
        window: &[T],
    ) -> SGResult<Vec<f32>>;
}

/// The predictor artifact path for a preprocessing artifact.
///
/// Same base name, extension [`PREDICTOR_EXTENSION`].
pub fn predictor_path<P: AsRef<Path>>(reference: P) -> PathBuf {
    reference.as_ref().with_extension(PREDICTOR_EXTENSION)
}

/// Options for [`BigramPredictor`].
#[derive(Debug, Clone, PartialEq)]
pub struct BigramPredictorOptions {
    /// The window width the predictor accepts.
    pub window_len: usize,

    /// Additive smoothing applied to every successor count.
    pub alpha: f32,
}

impl Default for BigramPredictorOptions {
    fn default() -> Self {
        Self {
            window_len: DEFAULT_WINDOW_LEN,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl BigramPredictorOptions {
    /// Sets the window width.
    pub fn with_window_len(
        self,
        window_len: usize,
    ) -> Self {
        Self { window_len, ..self }
    }

    /// Sets the additive smoothing.
    pub fn with_alpha(
        self,
        alpha: f32,
    ) -> Self {
        Self { alpha, ..self }
    }

    /// Count successors in an encoded corpus.
    ///
    /// ## Arguments
    /// * `ids` - the encoded corpus.
    /// * `vocab_size` - the number of ids in the vocabulary.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, ids)))]
    pub fn fit<T: TokenType>(
        &self,
        ids: &[T],
        vocab_size: usize,
    ) -> SGResult<BigramPredictor> {
        let mut predictor = BigramPredictor {
            window_len: self.window_len,
            alpha: self.alpha,
            rows: vec![Vec::new(); vocab_size],
        };
        predictor.validate().map_err(ScriptgenError::InvalidOptions)?;

        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(ids.len());
        for (prev, next) in training_windows(ids, 1) {
            pairs.push((to_index(prev[0], vocab_size)?, to_index(next, vocab_size)?));
        }
        pairs.sort_unstable();

        for &(prev, next) in &pairs {
            let row = &mut predictor.rows[prev];
            match row.last_mut() {
                Some((id, count)) if *id == next => *count += 1,
                _ => row.push((next, 1)),
            }
        }

        log::info!(
            "Fit bigram predictor: {} transitions over {} ids (window {}, alpha {})",
            pairs.len(),
            vocab_size,
            self.window_len,
            self.alpha
        );

        Ok(predictor)
    }
}

fn to_index<T: TokenType>(
    id: T,
    vocab_size: usize,
) -> SGResult<usize> {
    match id.to_usize() {
        Some(idx) if idx < vocab_size => Ok(idx),
        _ => Err(ScriptgenError::UnknownId {
            id: id.to_usize().unwrap_or(usize::MAX),
        }),
    }
}

/// Add-`alpha` smoothed successor frequencies of the most recent id.
///
/// Rows with no observations (and no smoothing) predict the uniform
/// distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigramPredictor {
    window_len: usize,
    alpha: f32,

    /// Sparse successor counts, indexed by previous id; ``(next, count)``
    /// pairs in ascending `next` order.
    rows: Vec<Vec<(usize, u64)>>,
}

impl BigramPredictor {
    /// The additive smoothing.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// The observed count of `next` following `prev`.
    pub fn count(
        &self,
        prev: usize,
        next: usize,
    ) -> u64 {
        self.rows
            .get(prev)
            .and_then(|row| row.iter().find(|(id, _)| *id == next))
            .map(|&(_, count)| count)
            .unwrap_or(0)
    }

    fn validate(&self) -> Result<(), String> {
        if self.window_len == 0 {
            return Err("predictor window_len must be >= 1".to_string());
        }
        if self.rows.is_empty() {
            return Err("predictor vocab_size must be >= 1".to_string());
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(format!(
                "predictor alpha must be finite and >= 0, got {}",
                self.alpha
            ));
        }
        let vocab_size = self.rows.len();
        for (prev, row) in self.rows.iter().enumerate() {
            if row.windows(2).any(|w| w[0].0 >= w[1].0) {
                return Err(format!("predictor row {prev} is not strictly ascending"));
            }
            if let Some(&(next, _)) = row.iter().find(|(next, _)| *next >= vocab_size) {
                return Err(format!(
                    "predictor row {prev} references id {next} >= {vocab_size}"
                ));
            }
        }
        Ok(())
    }

    /// Save as JSON.
    pub fn save_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> SGResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;

        log::info!("Saved bigram predictor to {}", path.display());
        Ok(())
    }

    /// Load and validate a JSON predictor.
    pub fn load_path<P: AsRef<Path>>(path: P) -> SGResult<Self> {
        let path = path.as_ref();
        let predictor: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        predictor.validate().map_err(ScriptgenError::Artifact)?;

        log::info!(
            "Loaded bigram predictor from {} (vocab size {}, window {})",
            path.display(),
            predictor.rows.len(),
            predictor.window_len
        );
        Ok(predictor)
    }
}

impl<T: TokenType> SequencePredictor<T> for BigramPredictor {
    fn window_len(&self) -> usize {
        self.window_len
    }

    fn vocab_size(&self) -> usize {
        self.rows.len()
    }

    fn predict(
        &self,
        window: &[T],
    ) -> SGResult<Vec<f32>> {
        if window.len() != self.window_len {
            return Err(ScriptgenError::WindowMismatch {
                requested: window.len(),
                expected: self.window_len,
            });
        }
        let vocab_size = self.rows.len();
        let prev = match window.last() {
            Some(&id) => to_index(id, vocab_size)?,
            None => return Ok(vec![1.0 / vocab_size as f32; vocab_size]),
        };

        let row = &self.rows[prev];
        let total = row.iter().map(|&(_, c)| c as f64).sum::<f64>()
            + f64::from(self.alpha) * vocab_size as f64;
        if total <= 0.0 {
            return Ok(vec![1.0 / vocab_size as f32; vocab_size]);
        }

        let mut scores = vec![f64::from(self.alpha); vocab_size];
        for &(next, count) in row {
            scores[next] += count as f64;
        }
        Ok(scores.into_iter().map(|s| (s / total) as f32).collect())
    }
}
