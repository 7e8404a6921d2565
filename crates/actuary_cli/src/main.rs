//! Actuary CLI: cost reports for monolithic and multi-die systems.
//!
//! Provides `actuary report` for per-package recurring cost and apportioned
//! NRE of a system description, and `actuary yield` for yield and
//! cost-per-area curves of every process and interposer technology.

#![warn(missing_docs)]

mod report;
mod system;
mod yields;

use std::path::PathBuf;
use std::process;

use actuary_config::ParameterTable;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Actuary: chiplet and SoC packaging cost model.
#[derive(Parser, Debug)]
#[command(name = "actuary", version, about = "Chiplet cost actuary")]
pub struct Cli {
    /// Suppress all output except errors and results.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a parameter file replacing the bundled defaults.
    #[arg(long, global = true)]
    pub params: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report recurring cost and apportioned NRE of every package in a system.
    Report(ReportArgs),
    /// Print yield and normalized cost-per-area curves.
    Yield(YieldArgs),
}

/// Arguments for the `actuary report` subcommand.
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// System description file (TOML).
    pub system: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `actuary yield` subcommand.
#[derive(Parser, Debug)]
pub struct YieldArgs {
    /// Largest die side in mm; areas run over 1², 2², … up to its square.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=200))]
    pub max_side: u32,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Result output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error status output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom parameter file.
    pub params: Option<PathBuf>,
}

impl GlobalArgs {
    /// Loads the parameter table named on the command line, or the defaults.
    pub fn parameters(&self) -> Result<ParameterTable, actuary_config::ConfigError> {
        match &self.params {
            Some(path) => actuary_config::load_parameters(path),
            None => actuary_config::default_parameters(),
        }
    }
}

fn log_filter(global: &GlobalArgs) -> EnvFilter {
    let level = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        params: cli.params,
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&global))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Report(ref args) => report::run(args, &global),
        Command::Yield(ref args) => yields::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_report_default() {
        let cli = Cli::parse_from(["actuary", "report", "system.toml"]);
        match cli.command {
            Command::Report(ref args) => {
                assert_eq!(args.system, PathBuf::from("system.toml"));
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Report command"),
        }
        assert!(cli.params.is_none());
    }

    #[test]
    fn parse_report_json() {
        let cli = Cli::parse_from(["actuary", "report", "sys.toml", "--format", "json"]);
        match cli.command {
            Command::Report(ref args) => assert_eq!(args.format, ReportFormat::Json),
            _ => panic!("expected Report command"),
        }
    }

    #[test]
    fn parse_yield_default() {
        let cli = Cli::parse_from(["actuary", "yield"]);
        match cli.command {
            Command::Yield(ref args) => {
                assert_eq!(args.max_side, 30);
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Yield command"),
        }
    }

    #[test]
    fn parse_yield_max_side() {
        let cli = Cli::parse_from(["actuary", "yield", "--max-side", "12", "-f", "json"]);
        match cli.command {
            Command::Yield(ref args) => {
                assert_eq!(args.max_side, 12);
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Yield command"),
        }
    }

    #[test]
    fn reject_zero_max_side() {
        assert!(Cli::try_parse_from(["actuary", "yield", "--max-side", "0"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "actuary",
            "--quiet",
            "--params",
            "/tmp/params.toml",
            "yield",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.params, Some(PathBuf::from("/tmp/params.toml")));
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from(["actuary", "report", "s.toml", "-v"]);
        assert!(cli.verbose);
    }

    #[test]
    fn missing_system_is_an_error() {
        assert!(Cli::try_parse_from(["actuary", "report"]).is_err());
    }

    #[test]
    fn default_parameters_when_no_file() {
        let global = GlobalArgs {
            quiet: false,
            verbose: false,
            params: None,
        };
        assert!(global.parameters().unwrap().node("7").is_ok());
    }
}
