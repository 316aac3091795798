//! CLI command implementations.

mod check;
mod format;
mod parse;

use std::fs::read_to_string;
use std::path::PathBuf;

use miette::{IntoDiagnostic, Result, WrapErr};

pub use check::{CheckArgs, run_check};
pub use format::{FormatArgs, run_format};
pub use parse::{ParseArgs, run_parse};

/// Where a command reads its message from.
#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct MessageSource {
    /// Message source text
    #[arg(short, long)]
    pub message: Option<String>,

    /// File containing one message
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl MessageSource {
    /// Returns a display name and the message text.
    pub fn read(&self) -> Result<(String, String)> {
        match (&self.message, &self.file) {
            (Some(message), _) => Ok(("<message>".to_string(), message.clone())),
            (None, Some(path)) => {
                let content = read_to_string(path)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
                Ok((path.display().to_string(), content))
            }
            (None, None) => Err(miette::miette!("no message given")),
        }
    }
}
