//! Semantic errors found by validating a data model.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataModelErrorKind {
    /// A name is declared twice, or declared after it was already used.
    DuplicateDeclaration,
    /// Two variants have the same keys.
    DuplicateVariant,
    /// A variant's key count differs from the selector count.
    KeyMismatch,
    /// No variant has only catch-all keys.
    MissingFallback,
    /// A selector variable has no function annotation.
    MissingSelectorAnnotation,
}

impl DataModelErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataModelErrorKind::DuplicateDeclaration => "duplicate-declaration",
            DataModelErrorKind::DuplicateVariant => "duplicate-variant",
            DataModelErrorKind::KeyMismatch => "key-mismatch",
            DataModelErrorKind::MissingFallback => "missing-fallback",
            DataModelErrorKind::MissingSelectorAnnotation => "missing-selector-annotation",
        }
    }
}

impl Display for DataModelErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Identifies a node of a message by position.
///
/// Paths are plain values so that errors stay independent of the tree they
/// were found in; a [`SourceMap`](super::SourceMap) resolves them back to
/// source spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", content = "index", rename_all = "lowercase")]
pub enum NodePath {
    /// The `i`th declaration.
    Declaration(usize),
    /// The `i`th selector of a `.match`.
    Selector(usize),
    /// The `i`th variant.
    Variant(usize),
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            NodePath::Declaration(i) => write!(f, "declaration {i}"),
            NodePath::Selector(i) => write!(f, "selector {i}"),
            NodePath::Variant(i) => write!(f, "variant {i}"),
        }
    }
}

/// A semantic problem in an otherwise well-formed message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
#[error("{kind} at {node}")]
pub struct DataModelError {
    pub kind: DataModelErrorKind,
    pub node: NodePath,
}

impl DataModelError {
    pub fn new(kind: DataModelErrorKind, node: NodePath) -> Self {
        Self { kind, node }
    }
}
