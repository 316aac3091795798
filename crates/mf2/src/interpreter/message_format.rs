//! The user-facing message formatter.

use std::collections::HashMap;

use bon::Builder;
use icu_locale_core::Locale;
use tracing::{debug, warn};

use crate::functions::default_functions;
use crate::interpreter::context::Context;
use crate::interpreter::direction::locale_direction;
use crate::interpreter::evaluator::parse_locale_list;
use crate::interpreter::registry::FunctionRegistry;
use crate::interpreter::select::select_pattern;
use crate::interpreter::{MessageError, ResolutionError, ResolutionErrorKind};
use crate::model::{Message, PatternElement, validate};
use crate::parser::{ParseOptions, parse_message};
use crate::types::{Direction, MessagePart, MessageValue, Value};

const LRI: &str = "\u{2066}";
const RLI: &str = "\u{2067}";
const FSI: &str = "\u{2068}";
const PDI: &str = "\u{2069}";

/// Source label used when a value has none.
const UNKNOWN_SOURCE: &str = "\u{FFFD}";

/// Whether formatted placeholders are wrapped in Unicode isolates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BidiIsolation {
    /// Isolate a placeholder unless both it and the message are
    /// left-to-right.
    #[default]
    Default,
    /// Never isolate.
    None,
}

/// How locales are matched against available data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LocaleMatcher {
    #[default]
    BestFit,
    Lookup,
}

/// Options for building a [`MessageFormat`].
///
/// # Example
///
/// ```
/// use mf2::{BidiIsolation, Direction, MessageFormatOptions};
///
/// let options = MessageFormatOptions::builder()
///     .bidi_isolation(BidiIsolation::None)
///     .dir(Direction::Rtl)
///     .build();
/// assert_eq!(options.dir, Some(Direction::Rtl));
/// ```
#[derive(Debug, Clone, Builder)]
pub struct MessageFormatOptions {
    #[builder(default)]
    pub bidi_isolation: BidiIsolation,

    /// Base direction of the message. Defaults to the direction of the
    /// first locale.
    pub dir: Option<Direction>,

    #[builder(default)]
    pub locale_matcher: LocaleMatcher,

    /// Custom functions, merged over the default `:string`, `:number` and
    /// `:integer`.
    #[builder(default)]
    pub functions: FunctionRegistry,
}

impl Default for MessageFormatOptions {
    fn default() -> Self {
        MessageFormatOptions::builder().build()
    }
}

/// A compiled message, ready to be formatted any number of times.
///
/// Construction parses and validates the message, failing on the first
/// problem. Formatting never fails: runtime errors are reported to a
/// callback (by default, logged with `tracing::warn!`) and the failing
/// placeholder renders as a fallback like `{$name}`.
///
/// # Example
///
/// ```
/// use mf2::{MessageFormat, args};
///
/// let mf = MessageFormat::new(&["en"], "Hello {$name}!").unwrap();
/// assert_eq!(mf.format(&args! { "name" => "World" }), "Hello \u{2068}World\u{2069}!");
/// ```
#[derive(Debug, Clone)]
pub struct MessageFormat {
    locales: Vec<Locale>,
    dir: Direction,
    bidi_isolation: BidiIsolation,
    locale_matcher: LocaleMatcher,
    functions: FunctionRegistry,
    message: Message,
}

impl MessageFormat {
    /// Compile `source` for `locales` with default options.
    pub fn new(locales: &[&str], source: &str) -> Result<Self, MessageError> {
        Self::with_options(locales, source, MessageFormatOptions::default())
    }

    /// Compile `source` for `locales`.
    pub fn with_options(
        locales: &[&str],
        source: &str,
        options: MessageFormatOptions,
    ) -> Result<Self, MessageError> {
        let message = parse_message(source, ParseOptions::default()).inspect_err(|error| {
            debug!(%error, "message failed to parse");
        })?;
        Self::from_message(locales, message, options)
    }

    /// Build a formatter for an existing data model message.
    ///
    /// The message is validated first.
    pub fn from_message(
        locales: &[&str],
        message: Message,
        options: MessageFormatOptions,
    ) -> Result<Self, MessageError> {
        let mut parsed = Vec::with_capacity(locales.len());
        for tag in locales {
            let mut list = parse_locale_list(tag).map_err(|bad| MessageError::InvalidLocale {
                tag: bad,
                reason: "not a valid BCP 47 language tag".to_string(),
            })?;
            parsed.append(&mut list);
        }
        if parsed.is_empty() {
            parsed.push(Locale::UNKNOWN);
        }

        validate(&message).inspect_err(|error| {
            debug!(%error, "message failed validation");
        })?;

        let mut functions = default_functions();
        functions.extend(&options.functions);
        let dir = options
            .dir
            .unwrap_or_else(|| parsed.first().map_or(Direction::Auto, locale_direction));
        Ok(Self {
            locales: parsed,
            dir,
            bidi_isolation: options.bidi_isolation,
            locale_matcher: options.locale_matcher,
            functions,
            message,
        })
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    /// Base direction of the message.
    pub fn dir(&self) -> Direction {
        self.dir
    }

    // =========================================================================
    // Formatting
    // =========================================================================

    /// Format the message to a string, logging errors with `tracing::warn!`.
    pub fn format(&self, args: &HashMap<String, Value>) -> String {
        self.format_with(args, log_error)
    }

    /// Format the message to a string, passing each error to `on_error`.
    ///
    /// Markup is resolved for its errors but contributes no text.
    pub fn format_with(
        &self,
        args: &HashMap<String, Value>,
        mut on_error: impl FnMut(MessageError),
    ) -> String {
        let mut ctx = self.context(args, &mut on_error);
        let mut out = String::new();
        for element in self.select(&mut ctx) {
            match element {
                PatternElement::Text(text) => out.push_str(text),
                PatternElement::Markup(markup) => {
                    ctx.resolve_markup(markup);
                }
                PatternElement::Expression(expression) => {
                    let value = ctx.resolve_expression(expression);
                    match value.to_text() {
                        Some(text) => match self.isolate(value.dir()) {
                            Some(open) => {
                                out.push_str(open);
                                out.push_str(&text);
                                out.push_str(PDI);
                            }
                            None => out.push_str(&text),
                        },
                        None => {
                            let source = not_formattable(&mut ctx, value.as_ref());
                            let text = format!("{{{source}}}");
                            if self.bidi_isolation == BidiIsolation::None {
                                out.push_str(&text);
                            } else {
                                out.push_str(FSI);
                                out.push_str(&text);
                                out.push_str(PDI);
                            }
                        }
                    }
                }
            }
        }
        out
    }

    /// Format the message to parts, logging errors with `tracing::warn!`.
    pub fn format_to_parts(&self, args: &HashMap<String, Value>) -> Vec<MessagePart> {
        self.format_to_parts_with(args, log_error)
    }

    /// Format the message to parts, passing each error to `on_error`.
    pub fn format_to_parts_with(
        &self,
        args: &HashMap<String, Value>,
        mut on_error: impl FnMut(MessageError),
    ) -> Vec<MessagePart> {
        let mut ctx = self.context(args, &mut on_error);
        let mut parts = Vec::new();
        for element in self.select(&mut ctx) {
            match element {
                PatternElement::Text(text) => parts.push(MessagePart::text(text.clone())),
                PatternElement::Markup(markup) => parts.push(ctx.resolve_markup(markup)),
                PatternElement::Expression(expression) => {
                    let value = ctx.resolve_expression(expression);
                    match value.to_parts() {
                        Some(value_parts) => match self.isolate(value.dir()) {
                            Some(open) => {
                                parts.push(isolation(open));
                                parts.extend(value_parts);
                                parts.push(isolation(PDI));
                            }
                            None => parts.extend(value_parts),
                        },
                        None => {
                            let source = not_formattable(&mut ctx, value.as_ref());
                            if self.bidi_isolation == BidiIsolation::None {
                                parts.push(MessagePart::fallback(source));
                            } else {
                                parts.push(isolation(FSI));
                                parts.push(MessagePart::fallback(source));
                                parts.push(isolation(PDI));
                            }
                        }
                    }
                }
            }
        }
        parts
    }

    fn context<'a>(
        &'a self,
        args: &'a HashMap<String, Value>,
        on_error: &'a mut dyn FnMut(MessageError),
    ) -> Context<'a> {
        Context::new(
            args,
            self.message.declarations(),
            &self.locales,
            self.locale_matcher,
            &self.functions,
            on_error,
        )
    }

    fn select(&self, ctx: &mut Context<'_>) -> &[PatternElement] {
        match &self.message {
            Message::Pattern(msg) => &msg.pattern,
            Message::Select(msg) => select_pattern(ctx, msg),
        }
    }

    /// The isolate that opens a value of direction `dir`, or `None` when the
    /// value is not isolated.
    fn isolate(&self, dir: Direction) -> Option<&'static str> {
        if self.bidi_isolation == BidiIsolation::None
            || (self.dir == Direction::Ltr && dir == Direction::Ltr)
        {
            return None;
        }
        Some(match dir {
            Direction::Ltr => LRI,
            Direction::Rtl => RLI,
            Direction::Auto => FSI,
        })
    }
}

fn isolation(value: &str) -> MessagePart {
    MessagePart::BidiIsolation {
        value: value.to_string(),
    }
}

/// Report a value with no string form, returning the source for its fallback.
fn not_formattable(ctx: &mut Context<'_>, value: &dyn MessageValue) -> String {
    let source = if value.source().is_empty() {
        UNKNOWN_SOURCE.to_string()
    } else {
        value.source().to_string()
    };
    ctx.report(ResolutionError::new(
        ResolutionErrorKind::NotFormattable,
        format!("a {} value is not formattable", value.type_name()),
        source.clone(),
    ));
    source
}

fn log_error(error: MessageError) {
    warn!(kind = error.kind(), "{error}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_direction_follows_first_locale() {
        let mf = MessageFormat::new(&["ar", "en"], "x").unwrap();
        assert_eq!(mf.dir(), Direction::Rtl);
        let mf = MessageFormat::new(&[], "x").unwrap();
        assert_eq!(mf.dir(), Direction::Auto);
    }

    #[test]
    fn isolation_rules() {
        let mf = MessageFormat::new(&["en"], "x").unwrap();
        assert_eq!(mf.isolate(Direction::Ltr), None);
        assert_eq!(mf.isolate(Direction::Auto), Some(FSI));
        assert_eq!(mf.isolate(Direction::Rtl), Some(RLI));

        let options = MessageFormatOptions::builder().dir(Direction::Rtl).build();
        let mf = MessageFormat::with_options(&["en"], "x", options).unwrap();
        assert_eq!(mf.isolate(Direction::Ltr), Some(LRI));
    }

    #[test]
    fn invalid_locale_is_rejected() {
        let Err(error) = MessageFormat::new(&["en", "not a tag"], "x") else {
            panic!("expected an invalid locale error");
        };
        assert_eq!(error.kind(), "invalid-locale");
    }
}
