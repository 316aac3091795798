//! Implementation of the `mf2 format` command.

use std::collections::HashMap;

use clap::ValueEnum;
use miette::{IntoDiagnostic, Report, Result};
use mf2::model::{Message, message_from_cst_with_source_map};
use mf2::{
    BidiIsolation, Direction, MessageError, MessageFormat, MessageFormatOptions, ParseOptions,
    Value, parse_cst,
};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::MessageSource;
use crate::output::MessageDiagnostic;

/// Base direction of the message.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirArg {
    Ltr,
    Rtl,
    Auto,
}

impl From<DirArg> for Direction {
    fn from(dir: DirArg) -> Self {
        match dir {
            DirArg::Ltr => Direction::Ltr,
            DirArg::Rtl => Direction::Rtl,
            DirArg::Auto => Direction::Auto,
        }
    }
}

/// Arguments for the format command.
#[derive(Debug, clap::Args)]
pub struct FormatArgs {
    #[command(flatten)]
    pub source: MessageSource,

    /// Locales to format for, in order of preference
    #[arg(short, long, value_delimiter = ',', env = "MF2_LOCALE", default_value = "en")]
    pub locale: Vec<String>,

    /// Arguments in name=value format (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Output formatted parts as JSON
    #[arg(long)]
    pub parts: bool,

    /// Do not wrap placeholders in bidi isolation marks
    #[arg(long)]
    pub no_isolation: bool,

    /// Base direction of the message (defaults to the locale's)
    #[arg(long, value_enum)]
    pub dir: Option<DirArg>,

    /// Parse in resource mode (control-character escapes, indented lines)
    #[arg(long)]
    pub resource: bool,
}

/// JSON output for one runtime error.
#[derive(Debug, Serialize)]
struct ErrorJson {
    kind: &'static str,
    message: String,
}

/// Parse a key=value parameter string.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid parameter format '{s}': expected name=value"))?;
    Ok((key.to_string(), value.to_string()))
}

/// Integers and decimals become numbers; anything else is a string.
fn parse_value(raw: String) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        Value::from(n)
    } else if let Ok(f) = raw.parse::<f64>().map_err(|_| ()).and_then(finite) {
        Value::from(f)
    } else {
        Value::from(raw)
    }
}

fn finite(f: f64) -> Result<f64, ()> {
    if f.is_finite() { Ok(f) } else { Err(()) }
}

/// Parse, convert and validate `content`, rendering the first problem as a
/// diagnostic.
pub(super) fn compile(
    name: &str,
    content: &str,
    resource: bool,
) -> Result<Message, MessageDiagnostic> {
    let cst = parse_cst(content, ParseOptions { resource });
    match message_from_cst_with_source_map(&cst) {
        Ok((message, source_map)) => {
            if let Err(error) = mf2::validate(&message) {
                let span = source_map.get(error.node);
                return Err(MessageDiagnostic::from_data_model_error(
                    name, content, &error, span,
                ));
            }
            Ok(message)
        }
        Err(error) => Err(MessageDiagnostic::from_syntax_error(name, content, &error)),
    }
}

/// Run the format command.
pub fn run_format(args: FormatArgs) -> Result<i32> {
    let (name, content) = args.source.read()?;
    let message = match compile(&name, &content, args.resource) {
        Ok(message) => message,
        Err(diagnostic) => {
            eprintln!("{:?}", Report::new(diagnostic));
            return Ok(exitcode::DATAERR);
        }
    };

    let options = MessageFormatOptions::builder()
        .bidi_isolation(if args.no_isolation {
            BidiIsolation::None
        } else {
            BidiIsolation::Default
        })
        .maybe_dir(args.dir.map(Direction::from))
        .build();
    let locales: Vec<&str> = args.locale.iter().map(String::as_str).collect();
    let mf = MessageFormat::from_message(&locales, message, options).map_err(|error| {
        miette::miette!(code = error.kind(), "{error}")
    })?;

    let params: HashMap<String, Value> = args
        .params
        .into_iter()
        .map(|(key, value)| (key, parse_value(value)))
        .collect();

    let mut errors: Vec<MessageError> = Vec::new();
    if args.parts {
        let parts = mf.format_to_parts_with(&params, |error| errors.push(error));
        println!("{}", serde_json::to_string_pretty(&parts).into_diagnostic()?);
    } else {
        let text = mf.format_with(&params, |error| errors.push(error));
        println!("{text}");
    }

    if errors.is_empty() {
        return Ok(exitcode::OK);
    }
    if args.parts {
        let json: Vec<ErrorJson> = errors
            .iter()
            .map(|error| ErrorJson {
                kind: error.kind(),
                message: error.to_string(),
            })
            .collect();
        eprintln!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
    } else {
        for error in &errors {
            eprintln!("{} {error}", "warning:".yellow().bold());
        }
    }
    Ok(exitcode::DATAERR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_typed() {
        assert_eq!(parse_value("42".to_string()), Value::Number(42));
        assert_eq!(parse_value("1.5".to_string()), Value::Float(1.5));
        assert_eq!(parse_value("inf".to_string()), Value::from("inf"));
        assert_eq!(parse_value("Ada".to_string()), Value::from("Ada"));
    }

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("a=b=c"),
            Ok(("a".to_string(), "b=c".to_string()))
        );
        assert!(parse_key_val("nothing").is_err());
    }
}
