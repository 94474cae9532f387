//! Command-line argument surface, declared with `clap`'s derive feature
//! rather than hand-rolled `std::env::args()` parsing.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "leviathan", about = "One-pass tableau satisfiability checker for LTL")]
pub struct Cli {
    /// Batch file of one formula per line; `-` reads from stdin. Ignored
    /// when `--ltl` is given.
    #[arg(default_value = "-")]
    pub filename: PathBuf,

    /// A single formula to check, given directly on the command line.
    #[arg(short = 'l', long = "ltl")]
    pub ltl: Option<String>,

    /// Print a model after the verdict, when satisfiable.
    #[arg(short = 'm', long = "model")]
    pub model: bool,

    /// Emit machine-parsable `SAT`/`UNSAT`[;model] output.
    #[arg(short = 'p', long = "parsable")]
    pub parsable: bool,

    /// Compare against a sibling `.answer` file instead of printing a verdict.
    #[arg(short = 't', long = "test")]
    pub test: bool,

    /// Diagnostic verbosity, 0 (silent) through 5 (trace).
    #[arg(short = 'v', long = "verbosity", default_value_t = 2)]
    pub verbosity: u8,

    /// Hard cap on tableau time-step depth.
    #[arg(long = "maximum-depth", default_value_t = u64::MAX)]
    pub maximum_depth: u64,

    /// Disable the SAT accelerator, forcing pure tableau branching.
    #[arg(long = "no-sat-accelerator")]
    pub no_sat_accelerator: bool,
}

impl Cli {
    pub fn log_filter(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Off,
            1 => log::LevelFilter::Error,
            2 => log::LevelFilter::Warn,
            3 => log::LevelFilter::Info,
            4 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    pub fn use_sat_accelerator(&self) -> bool {
        !self.no_sat_accelerator
    }
}
