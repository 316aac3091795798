//! Syntax error types for MF2 messages.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;
use thiserror::Error;

use super::cst::Span;

/// The category of a syntax error.
///
/// Each kind has a stable kebab-case name, used in error messages and
/// machine-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyntaxErrorKind {
    /// A required token (name, literal, variable) is empty.
    EmptyToken,
    /// A backslash is followed by a character that cannot be escaped here.
    BadEscape,
    /// An `.input` declaration whose expression does not have a variable operand.
    BadInputExpression,
    /// The same attribute name appears twice on one expression.
    DuplicateAttribute,
    /// The same option name appears twice on one function or markup.
    DuplicateOptionName,
    /// Unexpected content after a complete construct.
    ExtraContent,
    /// A required piece of syntax (brace, `=`, whitespace, ...) is missing.
    MissingSyntax,
    /// Any other syntax error.
    ParseError,
}

impl SyntaxErrorKind {
    /// Returns the stable kebab-case name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            SyntaxErrorKind::EmptyToken => "empty-token",
            SyntaxErrorKind::BadEscape => "bad-escape",
            SyntaxErrorKind::BadInputExpression => "bad-input-expression",
            SyntaxErrorKind::DuplicateAttribute => "duplicate-attribute",
            SyntaxErrorKind::DuplicateOptionName => "duplicate-option-name",
            SyntaxErrorKind::ExtraContent => "extra-content",
            SyntaxErrorKind::MissingSyntax => "missing-syntax",
            SyntaxErrorKind::ParseError => "parse-error",
        }
    }

    /// Looks up a kind by its kebab-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "empty-token" => SyntaxErrorKind::EmptyToken,
            "bad-escape" => SyntaxErrorKind::BadEscape,
            "bad-input-expression" => SyntaxErrorKind::BadInputExpression,
            "duplicate-attribute" => SyntaxErrorKind::DuplicateAttribute,
            "duplicate-option-name" => SyntaxErrorKind::DuplicateOptionName,
            "extra-content" => SyntaxErrorKind::ExtraContent,
            "missing-syntax" => SyntaxErrorKind::MissingSyntax,
            "parse-error" => SyntaxErrorKind::ParseError,
            _ => return None,
        };
        Some(kind)
    }
}

impl Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A syntax error with the byte range it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
#[error("{kind} at {}..{}{}", .span.start, .span.end, expected_suffix(.expected.as_deref()))]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
    /// The syntax that was expected, for `missing-syntax` errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

fn expected_suffix(expected: Option<&str>) -> String {
    match expected {
        Some(expected) => format!(", expected {expected}"),
        None => String::new(),
    }
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
            expected: None,
        }
    }

    /// A `missing-syntax` error at `pos`, naming the expected token.
    pub fn missing(pos: usize, expected: impl Into<String>) -> Self {
        Self {
            kind: SyntaxErrorKind::MissingSyntax,
            span: Span::new(pos, pos + 1),
            expected: Some(expected.into()),
        }
    }

    /// Calculate the 1-based line and column of the error start in `source`.
    pub fn line_column(&self, source: &str) -> (usize, usize) {
        calculate_position(source, self.span.start)
    }
}

/// Calculate line and column from a byte offset into `source`.
pub(crate) fn calculate_position(source: &str, offset: usize) -> (usize, usize) {
    let consumed = offset.min(source.len());
    let consumed_str = source.get(..consumed).unwrap_or(source);
    let line = consumed_str.chars().filter(|&c| c == '\n').count() + 1;
    let column = match consumed_str.rfind('\n') {
        Some(pos) => consumed_str[pos + 1..].chars().count() + 1,
        None => consumed_str.chars().count() + 1,
    };
    (line, column)
}
