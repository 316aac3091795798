//! The `:string` function.

use std::any::Any;
use std::collections::BTreeSet;

use icu_locale_core::Locale;
use unicode_normalization::UnicodeNormalization;

use crate::interpreter::{FunctionContext, FunctionOptions, FunctionResult, ResolutionError};
use crate::types::{Direction, FunctionInput, MessagePart, MessageValue, Value};

/// Formats its operand as a string and selects on exact (NFC) equality.
///
/// A missing operand formats as the empty string. Maps have no string form
/// and are rejected as a bad operand.
pub fn string(
    ctx: &mut FunctionContext,
    _options: &FunctionOptions,
    operand: Option<&FunctionInput>,
) -> FunctionResult {
    let value = match operand {
        None => String::new(),
        Some(input) => input.to_text().ok_or_else(|| {
            ResolutionError::bad_operand("input has no string form", ctx.source())
        })?,
    };
    Ok(Box::new(StringValue::new(ctx, value)))
}

/// The result of `:string`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringValue {
    source: String,
    locale: Locale,
    dir: Option<Direction>,
    value: String,
    /// NFC form of `value`, compared against variant keys.
    key: String,
}

impl StringValue {
    fn new(ctx: &FunctionContext, value: String) -> Self {
        Self {
            source: ctx.source().to_string(),
            locale: ctx.locale(),
            dir: ctx.dir(),
            key: value.nfc().collect(),
            value,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl MessageValue for StringValue {
    fn type_name(&self) -> &str {
        "string"
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn dir(&self) -> Direction {
        self.dir.unwrap_or(Direction::Auto)
    }

    fn locale(&self) -> Option<&Locale> {
        Some(&self.locale)
    }

    fn select_key(&self, keys: &BTreeSet<String>) -> Result<Option<String>, ResolutionError> {
        Ok(keys.contains(&self.key).then(|| self.key.clone()))
    }

    fn to_text(&self) -> Option<String> {
        Some(self.value.clone())
    }

    fn to_parts(&self) -> Option<Vec<MessagePart>> {
        Some(vec![MessagePart::String {
            source: self.source.clone(),
            locale: self.locale.to_string(),
            dir: self.dir,
            id: None,
            value: self.value.clone(),
        }])
    }

    fn value_of(&self) -> Option<Value> {
        Some(Value::String(self.value.clone()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::LocaleMatcher;

    fn ctx() -> FunctionContext {
        FunctionContext::new("$s", vec![Locale::UNKNOWN], LocaleMatcher::BestFit)
    }

    #[test]
    fn selects_normalized_key() {
        let input = FunctionInput::Value(Value::from("e\u{301}"));
        let value = string(&mut ctx(), &FunctionOptions::new(), Some(&input)).unwrap();
        let keys = BTreeSet::from(["\u{e9}".to_string(), "x".to_string()]);
        assert_eq!(value.select_key(&keys), Ok(Some("\u{e9}".to_string())));
        assert_eq!(value.to_text().as_deref(), Some("e\u{301}"));
    }

    #[test]
    fn missing_operand_is_empty() {
        let value = string(&mut ctx(), &FunctionOptions::new(), None).unwrap();
        assert_eq!(value.to_text().as_deref(), Some(""));
    }

    #[test]
    fn map_operand_is_rejected() {
        let input = FunctionInput::Value(Value::Map(Default::default()));
        let Err(error) = string(&mut ctx(), &FunctionOptions::new(), Some(&input)) else {
            panic!("expected bad-operand");
        };
        assert_eq!(error.kind.as_str(), "bad-operand");
    }
}
