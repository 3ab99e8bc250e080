//! # `scriptgen` Word-Level Script Generator
//!
//! A small text-generation pipeline for scripts and dialogue:
//!
//! * [`text`] to clean, tokenize, and detokenize text with a [`punctuation`] table.
//! * [`vocab`] to count tokens, drop rare ones, and build a [`vocab::Vocab`].
//! * [`corpus`] to turn a directory of ``*.txt`` files into a [`corpus::PreprocessArtifact`].
//! * [`predict`] for the [`predict::SequencePredictor`] contract and a counting baseline.
//! * [`generate`] to extend a prime word with top-k [`sampling`] over a sliding window.
//!
//! ## Crate Features
//!
//! #### feature: ``default``
//!
//! * ``ahash``
//! * ``rayon``
//!
//! #### feature: ``ahash``
//!
//! This swaps all HashMap/HashSet implementations for ``ahash``; which is a performance
//! win on many/(most?) modern CPUs.
//!
//! This is done by the ``types::SGHash{*}`` type alias machinery.
//!
//! #### feature: ``rayon``
//!
//! This enables parallel batch generation using the ``rayon`` crate.
//!
//! #### feature: ``tracing``
//!
//! This enables a number of ``tracing`` instrumentation points.
//! This is only useful for timing tracing of the library itself.
//!
//! ## Generating Text
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use scriptgen::corpus::{CorpusEncoderOptions, load_corpus_dir};
//! use scriptgen::generate::{GenerateOptions, TextGenerator};
//! use scriptgen::predict::BigramPredictorOptions;
//!
//! type T = u32;
//!
//! let text = load_corpus_dir("data/scripts")?;
//! let artifact = CorpusEncoderOptions::default()
//!     .with_min_frequency(1)
//!     .init::<T>()
//!     .encode_text(&text)?;
//!
//! let predictor = BigramPredictorOptions::default()
//!     .with_window_len(10)
//!     .fit(artifact.encoded(), artifact.vocab().len())?;
//!
//! let generator = TextGenerator::from_artifact(
//!     &artifact,
//!     Arc::new(predictor),
//!     GenerateOptions::default()
//!         .with_window_len(10)
//!         .with_predict_len(200)
//!         .with_seed(Some(7)),
//! )?;
//!
//! println!("{}", generator.generate("moe_szyslak:")?);
//! # Ok::<(), scriptgen::errors::ScriptgenError>(())
//! ```
#![warn(missing_docs, unused)]

pub mod corpus;
pub mod errors;
pub mod generate;
pub mod predict;
pub mod punctuation;
pub mod sampling;
pub mod text;
pub mod types;
pub mod vocab;

#[cfg(feature = "rayon")]
pub mod rayon;

#[doc(inline)]
pub use errors::{SGResult, ScriptgenError};
#[doc(inline)]
pub use generate::{GenerateOptions, TextGenerator};
#[doc(inline)]
pub use predict::SequencePredictor;
#[doc(inline)]
pub use types::TokenType;
#[doc(inline)]
pub use vocab::Vocab;
