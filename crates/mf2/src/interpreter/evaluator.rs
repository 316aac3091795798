//! Expression and markup resolution.
//!
//! Every expression resolves to some [`MessageValue`]: on failure the error
//! goes to the context's sink and a [`FallbackValue`] takes its place, so a
//! broken placeholder never stops the rest of the message from formatting.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use icu_locale_core::Locale;

use crate::interpreter::context::Context;
use crate::interpreter::registry::{FunctionContext, FunctionOptions};
use crate::interpreter::{ResolutionError, ResolutionErrorKind};
use crate::model::{
    Expression, ExpressionBody, FunctionRef, Literal, Markup, MarkupKind, Operand, Options,
    VariableRef,
};
use crate::types::{
    Direction, FallbackValue, FunctionInput, MessagePart, MessageValue, UnknownValue, Value,
};

/// Source label of an operand, e.g. `$count` or `|text|`.
pub(crate) fn operand_source(operand: &Operand) -> String {
    match operand {
        Operand::Literal(lit) => format!("|{}|", lit.value),
        Operand::Variable(var) => format!("${}", var.name),
    }
}

fn fallback(source: impl Into<String>) -> Rc<dyn MessageValue> {
    Rc::new(FallbackValue::new(source))
}

impl Context<'_> {
    /// Resolve an expression to a value.
    pub(crate) fn resolve_expression(&mut self, expression: &Expression) -> Rc<dyn MessageValue> {
        match &expression.body {
            ExpressionBody::Operand(Operand::Literal(lit)) => self.resolve_literal(lit),
            ExpressionBody::Operand(Operand::Variable(var)) => self.resolve_variable(var),
            ExpressionBody::Annotated { operand, function } => {
                self.resolve_function(operand.as_ref(), function)
            }
        }
    }

    /// An unannotated literal formats as a string.
    fn resolve_literal(&mut self, literal: &Literal) -> Rc<dyn MessageValue> {
        let source = format!("|{}|", literal.value);
        self.call_implicit("string", source, Value::String(literal.value.clone()))
    }

    /// Resolve a variable reference without an annotation.
    ///
    /// Declared values are returned as they are. Numeric arguments are
    /// formatted with `:number` and strings with `:string`; anything else
    /// becomes an `unknown` value.
    pub(crate) fn resolve_variable(&mut self, var: &VariableRef) -> Rc<dyn MessageValue> {
        let source = format!("${}", var.name);
        match self.lookup(&var.name) {
            None => {
                self.unresolved(&var.name);
                fallback(source)
            }
            Some(FunctionInput::Message(value)) if value.type_name() == "fallback" => {
                fallback(source)
            }
            Some(FunctionInput::Message(value)) => value,
            Some(FunctionInput::Value(value)) if value.is_numeric() => {
                self.call_implicit("number", source, value)
            }
            Some(FunctionInput::Value(value @ Value::String(_))) => {
                self.call_implicit("string", source, value)
            }
            Some(FunctionInput::Value(value)) => Rc::new(UnknownValue::new(source, value)),
        }
    }

    fn call_implicit(&mut self, name: &str, source: String, value: Value) -> Rc<dyn MessageValue> {
        let functions = self.functions;
        let Some(function) = functions.get(name) else {
            return Rc::new(UnknownValue::new(source, value));
        };
        let mut ctx = FunctionContext::new(source, self.locales.to_vec(), self.locale_matcher);
        let input = FunctionInput::Value(value);
        let result = function.call(&mut ctx, &FunctionOptions::new(), Some(&input));
        self.finish_call(ctx, result)
    }

    /// Resolve an annotated expression by calling its function.
    fn resolve_function(
        &mut self,
        operand: Option<&Operand>,
        function: &FunctionRef,
    ) -> Rc<dyn MessageValue> {
        let source = match operand {
            Some(operand) => operand_source(operand),
            None => format!(":{}", function.name),
        };
        let input = match operand {
            None => None,
            Some(Operand::Literal(lit)) => {
                Some(FunctionInput::Value(Value::String(lit.value.clone())))
            }
            Some(Operand::Variable(var)) => match self.lookup(&var.name) {
                None => {
                    self.unresolved(&var.name);
                    return fallback(source);
                }
                Some(FunctionInput::Message(value)) if value.type_name() == "fallback" => {
                    return fallback(source);
                }
                Some(input) => Some(input),
            },
        };

        let functions = self.functions;
        let Some(callee) = functions.get(&function.name) else {
            self.report(ResolutionError::unknown_function(
                &function.name,
                functions.names(),
                source.clone(),
            ));
            return fallback(source);
        };

        let mut ctx = FunctionContext::new(source, self.locales.to_vec(), self.locale_matcher);
        self.apply_reserved_options(&mut ctx, &function.options);
        let options = self.resolve_options(&function.options);
        let result = callee.call(&mut ctx, &options, input.as_ref());
        self.finish_call(ctx, result)
    }

    /// Report the call's errors and check its result.
    fn finish_call(
        &mut self,
        mut ctx: FunctionContext,
        result: Result<Box<dyn MessageValue>, ResolutionError>,
    ) -> Rc<dyn MessageValue> {
        for error in ctx.take_errors() {
            self.report(error);
        }
        match result {
            Ok(value) if value.type_name().is_empty() || value.source().is_empty() => {
                self.report(ResolutionError::new(
                    ResolutionErrorKind::BadFunctionResult,
                    "function returned a value without a type or source",
                    ctx.source(),
                ));
                fallback(ctx.source())
            }
            Ok(value) => match ctx.id() {
                Some(id) => Rc::new(IdentifiedValue {
                    inner: value,
                    id: id.to_string(),
                }),
                None => Rc::from(value),
            },
            Err(error) => {
                self.report(error);
                fallback(ctx.source())
            }
        }
    }

    /// Apply the `u:dir`, `u:id` and `u:locale` options to `ctx`, and record
    /// which options were given as literals.
    fn apply_reserved_options(&mut self, ctx: &mut FunctionContext, options: &Options) {
        for (name, value) in options {
            if matches!(value, Operand::Literal(_)) {
                ctx.add_literal_option(name);
            }
        }
        if let Some(value) = options.get("u:dir") {
            match self.option_text(value).as_deref() {
                None => {}
                Some("inherit") => ctx.set_dir(None),
                Some(dir) => match dir.parse::<Direction>() {
                    Ok(dir) => ctx.set_dir(Some(dir)),
                    Err(_) => self.report(ResolutionError::bad_option(
                        format!("unsupported value for u:dir: {dir}"),
                        ctx.source(),
                    )),
                },
            }
        }
        if let Some(id) = options.get("u:id").and_then(|value| self.option_text(value)) {
            ctx.set_id(id);
        }
        if let Some(tags) = options.get("u:locale").and_then(|value| self.option_text(value)) {
            match parse_locale_list(&tags) {
                Ok(locales) => ctx.set_locales(locales),
                Err(tag) => self.report(ResolutionError::bad_option(
                    format!("invalid locale in u:locale: {tag}"),
                    ctx.source(),
                )),
            }
        }
    }

    fn option_text(&mut self, value: &Operand) -> Option<String> {
        match self.resolve_value(value)? {
            FunctionInput::Value(value) => Some(value.to_string()),
            FunctionInput::Message(value) => value.to_text(),
        }
    }

    /// Resolve an operand for use as a function input.
    ///
    /// An unresolved variable is reported and yields `None`.
    fn resolve_value(&mut self, value: &Operand) -> Option<FunctionInput> {
        match value {
            Operand::Literal(lit) => Some(FunctionInput::Value(Value::String(lit.value.clone()))),
            Operand::Variable(var) => {
                let found = self.lookup(&var.name);
                if found.is_none() {
                    self.unresolved(&var.name);
                }
                found
            }
        }
    }

    /// Resolve function options, leaving out `u:` options and options
    /// whose variable is unresolved.
    fn resolve_options(&mut self, options: &Options) -> FunctionOptions {
        let mut resolved = FunctionOptions::new();
        for (name, value) in options {
            if name.starts_with("u:") {
                continue;
            }
            if let Some(value) = self.resolve_value(value) {
                resolved.insert(name.clone(), value);
            }
        }
        resolved
    }

    /// Resolve markup into its part.
    ///
    /// `u:id` becomes the part's id; `u:dir` is not allowed on markup and is
    /// reported as a bad option.
    pub(crate) fn resolve_markup(&mut self, markup: &Markup) -> MessagePart {
        let sigil = if markup.kind == MarkupKind::Close { '/' } else { '#' };
        let source = format!("{sigil}{}", markup.name);
        let mut id = None;
        let mut options = BTreeMap::new();
        for (name, value) in &markup.options {
            if name == "u:dir" {
                self.report(ResolutionError::bad_option(
                    "the option u:dir is not valid for markup",
                    source.clone(),
                ));
                continue;
            }
            let Some(input) = self.resolve_value(value) else {
                continue;
            };
            let Some(value) = input.value_of().or_else(|| input.to_text().map(Value::String)) else {
                continue;
            };
            if name == "u:id" {
                id = Some(value.to_string());
            } else {
                options.insert(name.clone(), value);
            }
        }
        MessagePart::Markup {
            kind: markup.kind,
            name: markup.name.clone(),
            id,
            options,
        }
    }
}

/// Parse a comma-separated list of locale tags, accepting `_` for `-`.
///
/// Returns the first invalid tag on failure.
pub(crate) fn parse_locale_list(tags: &str) -> Result<Vec<Locale>, String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.replace('_', "-").parse::<Locale>().map_err(|_| tag.to_string()))
        .collect()
}

/// A function result whose parts carry the expression's `u:id`.
#[derive(Debug)]
struct IdentifiedValue {
    inner: Box<dyn MessageValue>,
    id: String,
}

impl MessageValue for IdentifiedValue {
    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn source(&self) -> &str {
        self.inner.source()
    }

    fn dir(&self) -> Direction {
        self.inner.dir()
    }

    fn locale(&self) -> Option<&Locale> {
        self.inner.locale()
    }

    fn select_key(&self, keys: &BTreeSet<String>) -> Result<Option<String>, ResolutionError> {
        self.inner.select_key(keys)
    }

    fn to_text(&self) -> Option<String> {
        self.inner.to_text()
    }

    fn to_parts(&self) -> Option<Vec<MessagePart>> {
        let mut parts = self.inner.to_parts()?;
        for part in &mut parts {
            part.set_id(&self.id);
        }
        Some(parts)
    }

    fn value_of(&self) -> Option<Value> {
        self.inner.value_of()
    }

    fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_list_accepts_underscores() {
        let locales = parse_locale_list("de_CH, fr").unwrap();
        assert_eq!(locales.len(), 2);
        assert_eq!(locales[0].to_string(), "de-CH");
    }

    #[test]
    fn locale_list_reports_bad_tag() {
        assert_eq!(parse_locale_list("en, not a tag"), Err("not a tag".to_string()));
    }

    #[test]
    fn operand_sources() {
        assert_eq!(operand_source(&Operand::literal("a b")), "|a b|");
        assert_eq!(operand_source(&Operand::variable("n")), "$n");
    }
}
