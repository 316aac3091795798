//! MF2 message parsing.
//!
//! Two entry points share the same grammar: [`parse_cst`] builds a lossless,
//! recovering concrete syntax tree for tooling, while [`parse_message`] parses
//! straight into the data model and stops at the first error. For any
//! well-formed source both produce the same data model.

pub mod cst;
mod cst_parser;
pub mod error;
pub mod scan;
mod strict;
mod stringify;

pub use cst_parser::parse_cst;
pub use error::{SyntaxError, SyntaxErrorKind};
pub use strict::parse_message;
pub use stringify::{stringify_cst, stringify_cst_with};
pub(crate) use stringify::{write_literal, write_text};

/// Options shared by both parsers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Accept the control-character escapes used in resource files, and drop
    /// indentation after newlines in pattern text.
    pub resource: bool,
}
