use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "nexopt CLI - inspect and validate optimization-study definitions for aircraft conceptual design.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a study definition and validate it end to end: bounds, units,
    /// aliases, and the configuration forest they resolve against.
    Check(CheckArgs),
    /// Print the variable, objective, constraint, and alias tables of a
    /// study definition.
    Describe(DescribeArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the study definition file (TOML).
    #[arg(value_name = "STUDY")]
    pub study: PathBuf,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Path to the study definition file (TOML).
    #[arg(value_name = "STUDY")]
    pub study: PathBuf,
}
