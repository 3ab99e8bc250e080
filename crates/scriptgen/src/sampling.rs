//! # Top-k Sampling
//!
//! The stochastic step of generation: restrict a distribution to its `k`
//! highest scoring ids, renormalize, and draw one id.
//!
//! Scores that are negative or not finite are treated as zero. When the
//! selected slice carries no mass, the draw falls back to a uniform choice
//! among the selected ids.

use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
};

use crate::errors::{SGResult, ScriptgenError};

/// The default number of candidates kept per step.
pub const DEFAULT_TOP_K: usize = 5;

/// The `k` highest scoring ids of a distribution.
///
/// Ids are ordered by descending score; equal scores order by ascending id.
#[derive(Debug, Clone, PartialEq)]
pub struct TopK {
    ids: Vec<usize>,
    scores: Vec<f32>,
}

fn sanitize(score: f32) -> f32 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

impl TopK {
    /// Select the `k` highest scoring ids.
    ///
    /// ## Arguments
    /// * `scores` - one score per id.
    /// * `k` - the selection size; clamped to ``scores.len()``.
    pub fn select(
        scores: &[f32],
        k: usize,
    ) -> Self {
        let k = k.min(scores.len());
        let key = |&a: &usize, &b: &usize| {
            sanitize(scores[b])
                .total_cmp(&sanitize(scores[a]))
                .then(a.cmp(&b))
        };

        let mut ids: Vec<usize> = (0..scores.len()).collect();
        if k > 0 && k < ids.len() {
            ids.select_nth_unstable_by(k - 1, key);
        }
        ids.truncate(k);
        ids.sort_unstable_by(key);

        let scores = ids.iter().map(|&id| sanitize(scores[id])).collect();
        Self { ids, scores }
    }

    /// The selected ids.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// The sanitized scores of the selected ids.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// The number of selected ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Is the selection empty?
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected scores divided by their sum.
    ///
    /// ## Returns
    /// `None` when the selection carries no positive mass.
    pub fn probabilities(&self) -> Option<Vec<f64>> {
        let total: f64 = self.scores.iter().map(|&s| f64::from(s)).sum();
        if total > 0.0 && total.is_finite() {
            Some(self.scores.iter().map(|&s| f64::from(s) / total).collect())
        } else {
            None
        }
    }

    /// Draw one of the selected ids.
    ///
    /// Weighted by [`TopK::probabilities`]; uniform when there is no mass.
    ///
    /// ## Returns
    /// The drawn id, or [`ScriptgenError::InvalidOptions`] for an empty
    /// selection.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> SGResult<usize> {
        if self.ids.is_empty() {
            return Err(ScriptgenError::InvalidOptions(
                "cannot sample from an empty top-k selection".to_string(),
            ));
        }

        let weighted = self
            .probabilities()
            .and_then(|probs| WeightedIndex::<f64>::new(&probs).ok());
        let idx = match weighted {
            Some(dist) => dist.sample(rng),
            None => {
                log::warn!(
                    "Degenerate top-{} distribution; sampling uniformly",
                    self.ids.len()
                );
                rng.random_range(0..self.ids.len())
            }
        };
        Ok(self.ids[idx])
    }
}
