use crate::commands::{
    fit_baseline::FitBaselineArgs,
    generate::GenerateArgs,
    preprocess::PreprocessArgs,
};

pub mod fit_baseline;
pub mod generate;
pub mod preprocess;

/// Token id type used by the CLI artifacts.
pub type T = u32;

/// Subcommands for scriptgen.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Encode a directory of ``*.txt`` scripts into a preprocessing artifact.
    Preprocess(PreprocessArgs),

    /// Fit the bigram baseline predictor for a preprocessing artifact.
    FitBaseline(FitBaselineArgs),

    /// Generate a script from a prime word.
    Generate(GenerateArgs),
}

impl Commands {
    /// Run the subcommand.
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Preprocess(cmd) => cmd.run(),
            Commands::FitBaseline(cmd) => cmd.run(),
            Commands::Generate(cmd) => cmd.run(),
        }
    }
}
