//! Implementation of the `mf2 parse` command.

use miette::{IntoDiagnostic, Report, Result};
use mf2::{ParseOptions, parse_cst};

use super::MessageSource;
use super::format::compile;
use crate::output::MessageDiagnostic;

/// Arguments for the parse command.
#[derive(Debug, clap::Args)]
pub struct ParseArgs {
    #[command(flatten)]
    pub source: MessageSource,

    /// Print the concrete syntax tree, including junk and errors
    #[arg(long)]
    pub cst: bool,

    /// Parse in resource mode (control-character escapes, indented lines)
    #[arg(long)]
    pub resource: bool,
}

/// Run the parse command.
pub fn run_parse(args: ParseArgs) -> Result<i32> {
    let (name, content) = args.source.read()?;

    if args.cst {
        let cst = parse_cst(&content, ParseOptions {
            resource: args.resource,
        });
        println!("{}", serde_json::to_string_pretty(&cst).into_diagnostic()?);
        for error in cst.errors() {
            let diagnostic = MessageDiagnostic::from_syntax_error(&name, &content, error);
            eprintln!("{:?}", Report::new(diagnostic));
        }
        return Ok(if cst.errors().is_empty() {
            exitcode::OK
        } else {
            exitcode::DATAERR
        });
    }

    let message = match compile(&name, &content, args.resource) {
        Ok(message) => message,
        Err(diagnostic) => {
            eprintln!("{:?}", Report::new(diagnostic));
            return Ok(exitcode::DATAERR);
        }
    };
    println!("{}", serde_json::to_string_pretty(&message).into_diagnostic()?);
    Ok(exitcode::OK)
}
