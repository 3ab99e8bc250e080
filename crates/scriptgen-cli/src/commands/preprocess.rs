use scriptgen::{
    corpus::{CorpusEncoderOptions, load_corpus_dir},
    vocab::DEFAULT_PAD_TOKEN,
};

use crate::{commands::T, logging::LogArgs};

/// Args for the preprocess command.
#[derive(clap::Args, Debug)]
pub struct PreprocessArgs {
    /// Directory of ``*.txt`` script files.
    corpus_dir: String,

    #[clap(flatten)]
    pub logging: LogArgs,

    /// Drop tokens occurring this many times or fewer.
    #[arg(long, default_value = "0")]
    min_frequency: usize,

    /// The reserved padding token.
    #[arg(long, default_value = DEFAULT_PAD_TOKEN)]
    pad_token: String,

    /// Artifact output path.
    #[arg(long, default_value = "preprocess.json")]
    output: String,
}

impl PreprocessArgs {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.logging.setup_logging(3)?;

        log::info!("Reading corpus: {}", self.corpus_dir);
        let text = load_corpus_dir(&self.corpus_dir)?;

        let artifact = CorpusEncoderOptions::default()
            .with_min_frequency(self.min_frequency)
            .with_pad_token(self.pad_token.clone())
            .init::<T>()
            .encode_text(&text)?;

        log::info!("output: {}", self.output);
        artifact.save_path(&self.output)?;

        Ok(())
    }
}
