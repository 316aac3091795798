//! Implementation of the `mf2 check` command.

use std::fs::read_to_string;
use std::path::PathBuf;

use miette::{IntoDiagnostic, Report, Result, WrapErr};
use mf2::model::{message_from_cst_with_source_map, validate_with};
use mf2::parser::cst::Message as CstMessage;
use mf2::{ParseOptions, parse_cst};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::output::MessageDiagnostic;
use crate::output::table::{FileReport, format_check_table};

/// Arguments for the check command.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Message files to check, one message per file
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Parse in resource mode (control-character escapes, indented lines)
    #[arg(long)]
    pub resource: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// JSON output for one problem.
#[derive(Debug, Serialize)]
struct ProblemJson {
    kind: &'static str,
    start: Option<usize>,
    end: Option<usize>,
    message: String,
}

/// JSON output for one file.
#[derive(Debug, Serialize)]
struct FileJson {
    file: String,
    ok: bool,
    problems: Vec<ProblemJson>,
}

/// Run the check command.
pub fn run_check(args: CheckArgs) -> Result<i32> {
    let options = ParseOptions {
        resource: args.resource,
    };
    let mut reports = Vec::new();
    let mut json = Vec::new();

    for path in &args.files {
        let name = path.display().to_string();
        let content = read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {name}"))?;

        let cst = parse_cst(&content, options);
        let mut problems = Vec::new();
        let mut diagnostics = Vec::new();
        for error in cst.errors() {
            problems.push(ProblemJson {
                kind: error.kind.as_str(),
                start: Some(error.span.start),
                end: Some(error.span.end),
                message: error.to_string(),
            });
            diagnostics.push(MessageDiagnostic::from_syntax_error(&name, &content, error));
        }
        let syntax_errors = problems.len();

        // Conversion only fails on syntax errors, which were reported above.
        if let Ok((message, source_map)) = message_from_cst_with_source_map(&cst) {
            validate_with(&message, |error| {
                let span = source_map.get(error.node);
                problems.push(ProblemJson {
                    kind: error.kind.as_str(),
                    start: span.map(|span| span.start),
                    end: span.map(|span| span.end),
                    message: error.to_string(),
                });
                diagnostics.push(MessageDiagnostic::from_data_model_error(
                    &name, &content, &error, span,
                ));
            });
        }

        let report = FileReport {
            file: name.clone(),
            shape: shape(&cst),
            syntax_errors,
            data_model_errors: problems.len() - syntax_errors,
        };
        if !args.json {
            for diagnostic in diagnostics {
                eprintln!("{:?}", Report::new(diagnostic));
            }
        }
        json.push(FileJson {
            file: name,
            ok: report.is_ok(),
            problems,
        });
        reports.push(report);
    }

    let failed = reports.iter().filter(|report| !report.is_ok()).count();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
    } else {
        println!("{}", format_check_table(&reports));
        if failed == 0 {
            println!("{}", format!("{} file(s) ok", reports.len()).green());
        } else {
            println!("{}", format!("{failed} of {} file(s) failed", reports.len()).red());
        }
    }

    if failed == 0 {
        Ok(exitcode::OK)
    } else {
        Ok(exitcode::DATAERR)
    }
}

fn shape(message: &CstMessage) -> &'static str {
    match message {
        CstMessage::Simple(_) => "simple",
        CstMessage::Complex(_) => "complex",
        CstMessage::Select(_) => "select",
    }
}
