use stderrlog::{LogLevelNum, Timestamp};

/// Logging setup arg group, flattened into every subcommand.
#[derive(clap::Args, Debug)]
pub struct LogArgs {
    /// Silence log messages.
    #[clap(short, long)]
    pub quiet: bool,

    /// Turn debugging information on (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Enable timestamped logging.
    #[clap(short, long)]
    pub ts: bool,
}

/// Map a ``0..=5`` verbosity onto a stderr log level.
fn level_num(level: u8) -> LogLevelNum {
    match level {
        0 => LogLevelNum::Off,
        1 => LogLevelNum::Error,
        2 => LogLevelNum::Warn,
        3 => LogLevelNum::Info,
        4 => LogLevelNum::Debug,
        _ => LogLevelNum::Trace,
    }
}

impl LogArgs {
    /// The effective verbosity; `default` unless `-v` was given.
    fn level(
        &self,
        default: u8,
    ) -> u8 {
        if self.verbose > 0 {
            self.verbose
        } else {
            default
        }
    }

    /// Install the stderr logger.
    ///
    /// `default` is the level used when no `-v` flag is given;
    /// ``0`` is off, ``3`` is info, ``5`` and above is trace.
    pub fn setup_logging(
        &self,
        default: u8,
    ) -> Result<(), Box<dyn std::error::Error>> {
        stderrlog::new()
            .quiet(self.quiet)
            .verbosity(level_num(self.level(default)))
            .timestamp(if self.ts {
                Timestamp::Second
            } else {
                Timestamp::Off
            })
            .init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(clap::Parser, Debug)]
    struct Harness {
        #[clap(flatten)]
        logging: LogArgs,
    }

    #[test]
    fn test_log_flags() {
        let args = Harness::try_parse_from(["scriptgen", "-t", "-q"]).unwrap();
        assert!(args.logging.ts);
        assert!(args.logging.quiet);
        assert_eq!(args.logging.level(3), 3);

        let args = Harness::try_parse_from(["scriptgen", "--ts", "-vvvv"]).unwrap();
        assert!(args.logging.ts);
        assert!(!args.logging.quiet);
        assert_eq!(args.logging.level(2), 4);
        assert!(matches!(
            level_num(args.logging.level(2)),
            LogLevelNum::Debug
        ));
        assert!(matches!(level_num(9), LogLevelNum::Trace));
    }
}
