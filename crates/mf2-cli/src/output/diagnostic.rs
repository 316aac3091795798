//! Miette diagnostics for MF2 syntax and data model errors.

use miette::{Diagnostic, NamedSource, SourceSpan};
use mf2::model::DataModelErrorKind;
use mf2::parser::cst::Span;
use mf2::parser::SyntaxErrorKind;
use mf2::{DataModelError, SyntaxError};
use thiserror::Error;

/// A miette-compatible diagnostic pointing at a span of a message.
///
/// Note: Fields are read by miette derive macros, not directly by code.
#[derive(Debug, Error, Diagnostic)]
#[error("{kind}: {message}")]
#[diagnostic(code(mf2::message))]
pub struct MessageDiagnostic {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    kind: &'static str,

    message: String,

    #[help]
    help: Option<String>,
}

impl MessageDiagnostic {
    /// Create a diagnostic for a syntax error in `content`.
    pub fn from_syntax_error(name: &str, content: &str, error: &SyntaxError) -> Self {
        let (line, column) = error.line_column(content);
        let help = match (&error.expected, error.kind) {
            (Some(expected), _) => Some(format!("expected {expected}")),
            (None, SyntaxErrorKind::BadEscape) => {
                Some("only \\\\, \\{, \\} and \\| can be escaped".to_string())
            }
            (None, SyntaxErrorKind::BadInputExpression) => {
                Some(".input takes a variable, e.g. .input {$count :number}".to_string())
            }
            (None, _) => None,
        };
        Self::new(
            name,
            content,
            error.span,
            error.kind.as_str(),
            format!("syntax error at line {line}, column {column}"),
            help,
        )
    }

    /// Create a diagnostic for a validation error found at `span`.
    pub fn from_data_model_error(
        name: &str,
        content: &str,
        error: &DataModelError,
        span: Option<Span>,
    ) -> Self {
        let help = match error.kind {
            DataModelErrorKind::MissingFallback => Some("add a variant with only * keys"),
            DataModelErrorKind::MissingSelectorAnnotation => {
                Some("declare the selector with a function, e.g. .input {$n :number}")
            }
            DataModelErrorKind::KeyMismatch => Some("give each variant one key per selector"),
            DataModelErrorKind::DuplicateDeclaration | DataModelErrorKind::DuplicateVariant => None,
        };
        Self::new(
            name,
            content,
            span.unwrap_or_default(),
            error.kind.as_str(),
            format!("invalid {}", error.node),
            help.map(str::to_string),
        )
    }

    fn new(
        name: &str,
        content: &str,
        span: Span,
        kind: &'static str,
        message: String,
        help: Option<String>,
    ) -> Self {
        // Clamp to content length to avoid a miette panic on out-of-bounds spans
        let start = span.start.min(content.len());
        let end = span.end.clamp(start, content.len());
        MessageDiagnostic {
            src: NamedSource::new(name, content.to_string()),
            span: (start, end - start).into(),
            kind,
            message,
            help,
        }
    }
}
