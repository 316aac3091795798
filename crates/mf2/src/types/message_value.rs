use std::any::Any;
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::rc::Rc;
use std::str::FromStr;

use icu_locale_core::Locale;
use serde::Serialize;

use super::{MessagePart, Value};
use crate::interpreter::{ResolutionError, ResolutionErrorKind};

/// Text direction of a message or a formatted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
    /// Determined from the content itself.
    Auto,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
            Direction::Auto => "auto",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ltr" => Ok(Direction::Ltr),
            "rtl" => Ok(Direction::Rtl),
            "auto" => Ok(Direction::Auto),
            _ => Err(format!("unknown direction '{s}'")),
        }
    }
}

/// The result of resolving an expression.
///
/// Functions return message values; the formatter renders them with
/// [`to_text`](MessageValue::to_text) or
/// [`to_parts`](MessageValue::to_parts), and a `.match` selector chooses a
/// variant with [`select_key`](MessageValue::select_key). A value that cannot
/// do one of these keeps the default, and the caller reports an error and
/// falls back.
pub trait MessageValue: Debug {
    /// Short type name, e.g. `number` or `string`.
    fn type_name(&self) -> &str;

    /// Label of the expression this value came from, e.g. `$count` or `|1|`.
    fn source(&self) -> &str;

    fn dir(&self) -> Direction {
        Direction::Auto
    }

    fn locale(&self) -> Option<&Locale> {
        None
    }

    /// Picks the best of `keys` for this value, or `None` if none matches.
    fn select_key(&self, _keys: &BTreeSet<String>) -> Result<Option<String>, ResolutionError> {
        Err(ResolutionError::new(
            ResolutionErrorKind::UnsupportedOperation,
            format!("cannot select on a {} value", self.type_name()),
            self.source(),
        ))
    }

    fn to_text(&self) -> Option<String> {
        None
    }

    fn to_parts(&self) -> Option<Vec<MessagePart>> {
        None
    }

    /// The plain value underlying this one, for functions that accept
    /// another function's result as their operand.
    fn value_of(&self) -> Option<Value> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Stands in for an expression that failed to resolve.
///
/// Renders as its source wrapped in braces, e.g. `{$name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackValue {
    source: String,
}

impl FallbackValue {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl MessageValue for FallbackValue {
    fn type_name(&self) -> &str {
        "fallback"
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn to_text(&self) -> Option<String> {
        Some(format!("{{{}}}", self.source))
    }

    fn to_parts(&self) -> Option<Vec<MessagePart>> {
        Some(vec![MessagePart::fallback(self.source.clone())])
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An argument of a shape no function formats implicitly.
///
/// Booleans render as `true`/`false`; maps are not formattable.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownValue {
    source: String,
    value: Value,
}

impl UnknownValue {
    pub fn new(source: impl Into<String>, value: Value) -> Self {
        Self {
            source: source.into(),
            value,
        }
    }
}

impl MessageValue for UnknownValue {
    fn type_name(&self) -> &str {
        "unknown"
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn to_text(&self) -> Option<String> {
        match &self.value {
            Value::Map(_) => None,
            value => Some(value.to_string()),
        }
    }

    fn to_parts(&self) -> Option<Vec<MessagePart>> {
        match &self.value {
            Value::Map(_) => None,
            value => Some(vec![MessagePart::Unknown {
                source: self.source.clone(),
                id: None,
                value: value.clone(),
            }]),
        }
    }

    fn value_of(&self) -> Option<Value> {
        Some(self.value.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An operand or option value passed to a function.
///
/// Caller arguments arrive as plain values; variables bound by `.local` (or
/// `.input` with an annotation) arrive as the value their expression
/// resolved to.
#[derive(Debug, Clone)]
pub enum FunctionInput {
    Value(Value),
    Message(Rc<dyn MessageValue>),
}

impl FunctionInput {
    /// The plain value, unwrapping a message value with
    /// [`MessageValue::value_of`].
    pub fn value_of(&self) -> Option<Value> {
        match self {
            FunctionInput::Value(value) => Some(value.clone()),
            FunctionInput::Message(mv) => mv.value_of(),
        }
    }

    pub fn as_message(&self) -> Option<&dyn MessageValue> {
        match self {
            FunctionInput::Value(_) => None,
            FunctionInput::Message(mv) => Some(mv.as_ref()),
        }
    }

    /// Renders the input as a string, if it has a string form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FunctionInput::Value(Value::Map(_)) => None,
            FunctionInput::Value(value) => Some(value.to_string()),
            FunctionInput::Message(mv) => mv.to_text(),
        }
    }
}

impl From<Value> for FunctionInput {
    fn from(value: Value) -> Self {
        FunctionInput::Value(value)
    }
}
