//! # Rayon Utilities
//!
//! [`rayon`] powered batch generation.
//!
//! Steps within one generation are sequential; independent requests only
//! share the generator's read-only state and run in parallel.

use rayon::prelude::*;

use crate::{errors::SGResult, generate::TextGenerator, types::TokenType};

/// One independent generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// The seed word.
    pub prime: String,

    /// The random seed.
    pub seed: u64,
}

impl GenerateRequest {
    /// Create a new request.
    pub fn new<S: Into<String>>(
        prime: S,
        seed: u64,
    ) -> Self {
        Self {
            prime: prime.into(),
            seed,
        }
    }
}

impl<T: TokenType> TextGenerator<T> {
    /// Run many seeded generations in parallel.
    ///
    /// ## Returns
    /// One result per request, in request order; each equals
    /// ``generate_seeded(prime, seed)``.
    pub fn generate_batch(
        &self,
        requests: &[GenerateRequest],
    ) -> Vec<SGResult<String>> {
        requests
            .into_par_iter()
            .map(|req| self.generate_seeded(&req.prime, req.seed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        errors::ScriptgenError,
        generate::GenerateOptions,
        predict::BigramPredictorOptions,
        punctuation::PunctuationMap,
        vocab::Vocab,
    };

    #[test]
    fn test_generate_batch_matches_sequential() {
        let tokens: Vec<String> = "a b c a b a c c b a"
            .split(' ')
            .map(str::to_string)
            .collect();
        let vocab: Vocab<u32> = Vocab::from_tokens(&tokens, 0, "<PAD>").unwrap();
        let ids = vocab.encode(&tokens).unwrap();
        let predictor = BigramPredictorOptions::default()
            .with_window_len(3)
            .fit(&ids, vocab.len())
            .unwrap();

        let generator = TextGenerator::new(
            Arc::new(vocab),
            Arc::new(PunctuationMap::default()),
            Arc::new(predictor),
            GenerateOptions::default()
                .with_window_len(3)
                .with_top_k(3)
                .with_predict_len(12),
        )
        .unwrap();

        let requests: Vec<GenerateRequest> = (0..16)
            .map(|seed| GenerateRequest::new(["a", "b", "c"][seed as usize % 3], seed))
            .chain([GenerateRequest::new("zzz", 0)])
            .collect();

        let results = generator.generate_batch(&requests);
        assert_eq!(results.len(), requests.len());

        for (req, result) in requests.iter().zip(&results).take(16) {
            assert_eq!(
                result.as_ref().unwrap(),
                &generator.generate_seeded(&req.prime, req.seed).unwrap()
            );
        }
        assert!(matches!(
            results.last(),
            Some(Err(ScriptgenError::UnknownToken { .. }))
        ));
    }
}
