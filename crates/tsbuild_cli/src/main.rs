//! tsbuild CLI: compiles TypeScript projects for a matrix of targets and
//! module formats.
//!
//! Provides `tsbuild compile` to build every requested `(target, format)`
//! pair and `tsbuild paths` to show where each pair reads its compiler
//! configuration and writes its output.

#![warn(missing_docs)]

mod compile;
mod paths;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tsbuild_common::{ModuleFormat, Target};

/// tsbuild: multi-target TypeScript builds.
#[derive(Parser, Debug)]
#[command(name = "tsbuild", version, about = "Multi-target TypeScript build tool")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `tsbuild.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile every requested target/format pair.
    Compile(CompileArgs),
    /// Print the resolved output directory and compiler config per pair.
    Paths(MatrixArgs),
}

/// The `(target, format)` pairs a command applies to.
#[derive(Parser, Debug)]
pub struct MatrixArgs {
    /// Targets to build (repeatable or comma-separated).
    #[arg(short, long = "target", required = true, num_args = 1.., value_delimiter = ',')]
    pub targets: Vec<Target>,

    /// Module formats to build.
    #[arg(
        short = 'm',
        long = "format",
        num_args = 1..,
        value_delimiter = ',',
        default_values_t = ModuleFormat::ALL
    )]
    pub formats: Vec<ModuleFormat>,
}

/// Arguments for the `tsbuild compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Pairs to compile.
    #[command(flatten)]
    pub matrix: MatrixArgs,

    /// Compile even if the build stamp says the output is current.
    #[arg(long)]
    pub force: bool,

    /// Output format for compiler diagnostics.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub report: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// One JSON object per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => atty_is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    pipeline::init_logging(&global);

    let result = match cli.command {
        Command::Compile(ref args) => compile::run(args, &global),
        Command::Paths(ref args) => paths::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Rough terminal detection from the TERM variable.
fn atty_is_terminal() -> bool {
    std::env::var("TERM").is_ok_and(|term| term != "dumb")
}
