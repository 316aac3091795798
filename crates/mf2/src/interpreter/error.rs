//! Error types for message resolution and formatting.

use std::error::Error as StdError;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;
use strsim::levenshtein;
use thiserror::Error;

use crate::model::DataModelError;
use crate::parser::SyntaxError;

/// The category of a [`ResolutionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionErrorKind {
    /// A function returned a value without a usable type or source.
    BadFunctionResult,
    /// A function's operand has the wrong type.
    BadOperand,
    /// An option has an invalid value.
    BadOption,
    /// A variable is neither an argument nor declared.
    UnresolvedVariable,
    /// The value does not support the requested operation.
    UnsupportedOperation,
    /// No function is registered under the annotation's name.
    UnknownFunction,
    /// The value has no string or parts form.
    NotFormattable,
}

impl ResolutionErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionErrorKind::BadFunctionResult => "bad-function-result",
            ResolutionErrorKind::BadOperand => "bad-operand",
            ResolutionErrorKind::BadOption => "bad-option",
            ResolutionErrorKind::UnresolvedVariable => "unresolved-variable",
            ResolutionErrorKind::UnsupportedOperation => "unsupported-operation",
            ResolutionErrorKind::UnknownFunction => "unknown-function",
            ResolutionErrorKind::NotFormattable => "not-formattable",
        }
    }
}

impl Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// An expression could not be resolved or formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionError {
    pub kind: ResolutionErrorKind,
    pub message: String,
    /// Source label of the failing expression, e.g. `$count`.
    pub source: String,
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} in {}: {}", self.kind, self.source, self.message)
    }
}

impl StdError for ResolutionError {}

impl ResolutionError {
    pub fn new(
        kind: ResolutionErrorKind,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn unresolved_variable(name: &str) -> Self {
        Self::new(
            ResolutionErrorKind::UnresolvedVariable,
            format!("variable not available: {name}"),
            format!("${name}"),
        )
    }

    /// An `unknown-function` error, suggesting registered names close to `name`.
    pub fn unknown_function<'a>(
        name: &str,
        available: impl Iterator<Item = &'a String>,
        source: impl Into<String>,
    ) -> Self {
        let suggestions = compute_suggestions(name, available);
        let message = if suggestions.is_empty() {
            format!("unknown function :{name}")
        } else {
            format!(
                "unknown function :{name}, did you mean {}?",
                suggestions
                    .iter()
                    .map(|s| format!(":{s}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        Self::new(ResolutionErrorKind::UnknownFunction, message, source)
    }

    pub fn bad_operand(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(ResolutionErrorKind::BadOperand, message, source)
    }

    pub fn bad_option(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(ResolutionErrorKind::BadOption, message, source)
    }
}

/// The category of a [`SelectionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionErrorKind {
    /// A selector's value cannot choose a variant key.
    BadSelector,
    /// No variant matched the selectors.
    NoMatch,
}

impl SelectionErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionErrorKind::BadSelector => "bad-selector",
            SelectionErrorKind::NoMatch => "no-match",
        }
    }
}

impl Display for SelectionErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A `.match` could not choose a variant normally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionError {
    pub kind: SelectionErrorKind,
    /// Source label of the selector, empty for `no-match`.
    pub source: String,
    pub cause: Option<ResolutionError>,
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match (&self.cause, self.source.is_empty()) {
            (Some(cause), _) => write!(f, "{} in {}: {cause}", self.kind, self.source),
            (None, false) => write!(f, "{} in {}", self.kind, self.source),
            (None, true) => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for SelectionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl SelectionError {
    pub fn bad_selector(source: impl Into<String>, cause: Option<ResolutionError>) -> Self {
        Self {
            kind: SelectionErrorKind::BadSelector,
            source: source.into(),
            cause,
        }
    }

    pub fn no_match() -> Self {
        Self {
            kind: SelectionErrorKind::NoMatch,
            source: String::new(),
            cause: None,
        }
    }
}

/// Any error reported while building or formatting a message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MessageError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    DataModel(#[from] DataModelError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// A locale tag given to the formatter could not be parsed.
    #[error("invalid locale '{tag}': {reason}")]
    InvalidLocale { tag: String, reason: String },
}

impl MessageError {
    /// The stable kebab-case kind name of this error.
    pub fn kind(&self) -> &'static str {
        match self {
            MessageError::Syntax(e) => e.kind.as_str(),
            MessageError::DataModel(e) => e.kind.as_str(),
            MessageError::Resolution(e) => e.kind.as_str(),
            MessageError::Selection(e) => e.kind.as_str(),
            MessageError::InvalidLocale { .. } => "invalid-locale",
        }
    }
}

/// Compute "did you mean" suggestions for an unknown name.
///
/// Returns up to 3 names within edit distance 1 (names of 3 characters or
/// fewer) or 2 (longer names), closest first.
pub fn compute_suggestions<'a>(
    name: &str,
    available: impl Iterator<Item = &'a String>,
) -> Vec<String> {
    let max_distance = if name.len() <= 3 { 1 } else { 2 };
    let mut suggestions: Vec<(usize, String)> = available
        .filter_map(|candidate| {
            let dist = levenshtein(name, candidate);
            if dist <= max_distance && dist > 0 {
                Some((dist, candidate.clone()))
            } else {
                None
            }
        })
        .collect();

    suggestions.sort_by_key(|(dist, _)| *dist);
    suggestions.into_iter().take(3).map(|(_, s)| s).collect()
}
