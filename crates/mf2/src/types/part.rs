use std::collections::BTreeMap;

use serde::Serialize;

use super::{Direction, Value};
use crate::model::MarkupKind;

/// One piece of a formatted message, as produced by
/// [`MessageFormat::format_to_parts`](crate::MessageFormat::format_to_parts).
///
/// Serializes with a `type` tag and camelCase field names, so the JSON form
/// is directly usable by front-end renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MessagePart {
    /// Literal pattern text.
    Text { value: String },

    /// A Unicode isolate control wrapped around a placeholder.
    BidiIsolation { value: String },

    /// An open, standalone or close markup placeholder.
    Markup {
        kind: MarkupKind,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        options: BTreeMap<String, Value>,
    },

    /// A placeholder that failed to resolve or format.
    Fallback { source: String },

    /// A formatted number, split into its components.
    Number {
        source: String,
        locale: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        dir: Option<Direction>,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        parts: Vec<NumberPart>,
    },

    /// A formatted string.
    String {
        source: String,
        locale: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        dir: Option<Direction>,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        value: String,
    },

    /// A value of a type no function knows how to format.
    Unknown {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        value: Value,
    },
}

impl MessagePart {
    pub fn text(value: impl Into<String>) -> Self {
        MessagePart::Text {
            value: value.into(),
        }
    }

    pub fn fallback(source: impl Into<String>) -> Self {
        MessagePart::Fallback {
            source: source.into(),
        }
    }

    /// The `type` tag this part serializes with.
    pub fn type_name(&self) -> &'static str {
        match self {
            MessagePart::Text { .. } => "text",
            MessagePart::BidiIsolation { .. } => "bidiIsolation",
            MessagePart::Markup { .. } => "markup",
            MessagePart::Fallback { .. } => "fallback",
            MessagePart::Number { .. } => "number",
            MessagePart::String { .. } => "string",
            MessagePart::Unknown { .. } => "unknown",
        }
    }

    /// Sets the `id` of parts that carry one; other parts are unchanged.
    pub fn set_id(&mut self, new_id: &str) {
        match self {
            MessagePart::Markup { id, .. }
            | MessagePart::Number { id, .. }
            | MessagePart::String { id, .. }
            | MessagePart::Unknown { id, .. } => *id = Some(new_id.to_string()),
            MessagePart::Text { .. }
            | MessagePart::BidiIsolation { .. }
            | MessagePart::Fallback { .. } => {}
        }
    }

    /// The text this part contributes to a plain-string rendering.
    pub fn to_text(&self) -> String {
        match self {
            MessagePart::Text { value }
            | MessagePart::BidiIsolation { value }
            | MessagePart::String { value, .. } => value.clone(),
            MessagePart::Markup { .. } => String::new(),
            MessagePart::Fallback { source } => format!("{{{source}}}"),
            MessagePart::Number { parts, .. } => parts.iter().map(|p| p.value.as_str()).collect(),
            MessagePart::Unknown { value, .. } => value.to_string(),
        }
    }
}

/// The kind of a [`NumberPart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberPartKind {
    MinusSign,
    PlusSign,
    Integer,
    Group,
    Decimal,
    Fraction,
    Nan,
    Infinity,
}

/// A component of a formatted number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NumberPart {
    #[serde(rename = "type")]
    pub kind: NumberPartKind,
    pub value: String,
}

impl NumberPart {
    pub fn new(kind: NumberPartKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
