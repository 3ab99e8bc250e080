use scriptgen::{
    corpus::PreprocessArtifact,
    predict::{BigramPredictorOptions, DEFAULT_ALPHA, DEFAULT_WINDOW_LEN, predictor_path},
};

use crate::{commands::T, logging::LogArgs};

/// Args for the fit-baseline command.
#[derive(clap::Args, Debug)]
pub struct FitBaselineArgs {
    #[clap(flatten)]
    pub logging: LogArgs,

    /// Preprocessing artifact path.
    #[arg(long, default_value = "preprocess.json")]
    artifact: String,

    /// Context window width the predictor accepts.
    #[arg(long, default_value_t = DEFAULT_WINDOW_LEN)]
    window_len: usize,

    /// Additive smoothing.
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f32,
}

impl FitBaselineArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        let artifact = PreprocessArtifact::<T>::load_path(&self.artifact)?;

        let predictor = BigramPredictorOptions::default()
            .with_window_len(self.window_len)
            .with_alpha(self.alpha)
            .fit(artifact.encoded(), artifact.vocab().len())?;

        let path = predictor_path(&self.artifact);
        log::info!("output: {}", path.display());
        predictor.save_path(&path)?;

        Ok(())
    }
}
