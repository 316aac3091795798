//! MF2 CLI entry point.
//!
//! Provides command-line tools for working with MessageFormat 2 messages:
//! - `mf2 check` - Parse and validate message files
//! - `mf2 format` - Format a message with arguments
//! - `mf2 parse` - Dump the syntax tree or data model as JSON

mod commands;
mod output;

use std::io::stderr;
use std::process::exit;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{CheckArgs, FormatArgs, ParseArgs, run_check, run_format, run_parse};
use tracing_subscriber::EnvFilter;

/// MessageFormat 2 tools.
#[derive(Debug, Parser)]
#[command(name = "mf2")]
#[command(about = "MessageFormat 2 message tools", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Color output control
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, global = true)]
    pub color: ColorWhen,

    /// Enable debug logging (filter with MF2_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// When to use colored output.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse and validate message files
    Check(CheckArgs),
    /// Format a message with arguments
    Format(FormatArgs),
    /// Print the syntax tree or data model of a message as JSON
    Parse(ParseArgs),
}

/// Set up color output based on user preference.
fn setup_colors(color_when: ColorWhen) {
    match color_when {
        ColorWhen::Auto => {
            // owo-colors automatically checks TTY, NO_COLOR, FORCE_COLOR
        }
        ColorWhen::Always => {
            owo_colors::set_override(true);
        }
        ColorWhen::Never => {
            owo_colors::set_override(false);
        }
    }
}

/// Log to stderr. `MF2_LOG` takes precedence over `--verbose`.
fn setup_logging(verbose: bool) {
    let default = if verbose { "mf2=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("MF2_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .with_target(false)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    setup_colors(cli.color);
    setup_logging(cli.verbose);

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let result = match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Format(args) => run_format(args),
        Commands::Parse(args) => run_parse(args),
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("{e:?}");
            exit(exitcode::SOFTWARE);
        }
    }
}
