use std::{io::Write, path::PathBuf, sync::Arc};

use scriptgen::{
    GenerateOptions,
    TextGenerator,
    corpus::PreprocessArtifact,
    generate::DEFAULT_PREDICT_LEN,
    predict::{BigramPredictor, DEFAULT_WINDOW_LEN, predictor_path},
    rayon::GenerateRequest,
    sampling::DEFAULT_TOP_K,
};

use crate::{commands::T, input_output::OutputArgs, logging::LogArgs};

/// Args for the generate command.
#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Preprocessing artifact path.
    #[arg(long, default_value = "preprocess.json")]
    artifact: String,

    /// Predictor path; derived from the artifact path when absent.
    #[arg(long)]
    predictor: Option<String>,

    /// The seed word; must be in the vocabulary.
    #[arg(long)]
    prime: String,

    /// Number of tokens to generate after the prime.
    #[arg(long, default_value_t = DEFAULT_PREDICT_LEN)]
    predict_len: usize,

    /// Number of candidates sampled from per step.
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Context window width; must match the predictor.
    #[arg(long, default_value_t = DEFAULT_WINDOW_LEN)]
    window_len: usize,

    /// Random seed; drawn from OS entropy when absent.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of independent scripts, generated in parallel.
    #[arg(long, default_value = "1")]
    samples: u64,

    #[command(flatten)]
    output: OutputArgs,
}

impl GenerateArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(2)?;

        let artifact = PreprocessArtifact::<T>::load_path(&self.artifact)?;
        let path = match &self.predictor {
            Some(path) => PathBuf::from(path),
            None => predictor_path(&self.artifact),
        };
        let predictor = BigramPredictor::load_path(&path)?;

        let generator = TextGenerator::from_artifact(
            &artifact,
            Arc::new(predictor),
            GenerateOptions::default()
                .with_predict_len(self.predict_len)
                .with_top_k(self.top_k)
                .with_window_len(self.window_len)
                .with_seed(self.seed),
        )?;

        let base_seed = self.seed.unwrap_or_else(rand::random);
        let requests: Vec<GenerateRequest> = (0..self.samples)
            .map(|i| GenerateRequest::new(self.prime.clone(), base_seed.wrapping_add(i)))
            .collect();

        let mut writer = self.output.open_writer()?;
        for (idx, script) in generator.generate_batch(&requests).into_iter().enumerate() {
            if idx > 0 {
                writeln!(writer)?;
            }
            writeln!(writer, "{}", script?)?;
        }
        writer.flush()?;

        Ok(())
    }
}
