//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

/// Evaluate a chat model on dialogue implicature and follow-up questions
#[derive(Debug, Parser)]
#[command(name = "dialog-eval", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Directory for interim and final result tables (overrides the config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// 1-based task number to resume from; earlier tasks only rebuild context
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub start_iteration: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["dialog-eval"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert_eq!(cli.output_dir, None);
        assert_eq!(cli.start_iteration, 1);
    }

    #[test]
    fn test_all_arguments() {
        let cli = Cli::try_parse_from([
            "dialog-eval",
            "--config",
            "runs/pc.yaml",
            "-o",
            "out",
            "--start-iteration",
            "301",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("runs/pc.yaml"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.start_iteration, 301);
    }

    #[test]
    fn test_start_iteration_must_be_positive() {
        assert!(Cli::try_parse_from(["dialog-eval", "--start-iteration", "0"]).is_err());
        assert!(Cli::try_parse_from(["dialog-eval", "--start-iteration", "-3"]).is_err());
    }
}
