//! Strict parser from MF2 source directly to the data model.
//!
//! Uses the same lexical rules as the CST parser but builds no concrete tree
//! and stops at the first error. Error positions are byte offsets of the
//! point where parsing could not continue.

use tracing::debug;
use unicode_normalization::UnicodeNormalization;
use winnow::combinator::{cut_err, fail, opt};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::{one_of, take_till, take_while};

use super::ParseOptions;
use super::error::{SyntaxError, SyntaxErrorKind};
use super::scan::{self, Escape};
use crate::model::{
    Attributes, Declaration, Expression, FunctionRef, Literal, Markup, MarkupKind, Message,
    Operand, Options, Pattern, PatternElement, PatternMessage, SelectMessage, VariableRef,
    Variant, VariantKey,
};

/// Parses `source` straight into the data model.
///
/// Accepts exactly the sources for which [`parse_cst`](super::parse_cst)
/// records no errors and conversion succeeds, and produces the same message.
pub fn parse_message(source: &str, options: ParseOptions) -> Result<Message, SyntaxError> {
    let parser = StrictParser {
        resource: options.resource,
    };
    let mut remaining = source;
    match parser.message(&mut remaining) {
        Ok(message) => Ok(message),
        Err(err) => {
            let kind = match &err {
                ErrMode::Backtrack(error) | ErrMode::Cut(error) => error_kind(error),
                ErrMode::Incomplete(_) => SyntaxErrorKind::ParseError,
            };
            let offset = source.len() - remaining.len();
            let end = offset + remaining.chars().next().map_or(0, char::len_utf8);
            debug!(%kind, offset, "strict parse failed");
            Err(SyntaxError::new(kind, offset, end))
        }
    }
}

fn error_kind(error: &ContextError) -> SyntaxErrorKind {
    error
        .context()
        .find_map(|context| {
            if let StrContext::Label(label) = context {
                SyntaxErrorKind::from_name(label)
            } else {
                None
            }
        })
        .unwrap_or(SyntaxErrorKind::ParseError)
}

fn label(kind: SyntaxErrorKind) -> StrContext {
    StrContext::Label(kind.as_str())
}

/// Fails at the current position with an unrecoverable error of `kind`.
fn fail_with<O>(input: &mut &str, kind: SyntaxErrorKind) -> ModalResult<O> {
    cut_err(fail).context(label(kind)).parse_next(input)
}

/// Skips whitespace and bidi marks, returning whether any whitespace was seen.
fn ws(input: &mut &str) -> ModalResult<bool> {
    let skipped =
        take_while(0.., |c: char| scan::is_whitespace(c) || scan::is_bidi(c)).parse_next(input)?;
    Ok(skipped.chars().any(scan::is_whitespace))
}

fn name(input: &mut &str) -> ModalResult<String> {
    opt(one_of(scan::is_bidi)).void().parse_next(input)?;
    let raw = (one_of(scan::is_name_start), take_while(0.., scan::is_name_char))
        .take()
        .parse_next(input)?;
    opt(one_of(scan::is_bidi)).void().parse_next(input)?;
    Ok(raw.nfc().collect())
}

fn required_name(input: &mut &str) -> ModalResult<String> {
    cut_err(name)
        .context(label(SyntaxErrorKind::EmptyToken))
        .parse_next(input)
}

/// `name` or `namespace:name`.
fn identifier(input: &mut &str) -> ModalResult<String> {
    let first = required_name(input)?;
    if opt(':').parse_next(input)?.is_none() {
        return Ok(first);
    }
    let second = required_name(input)?;
    Ok(format!("{first}:{second}"))
}

fn variable(input: &mut &str) -> ModalResult<VariableRef> {
    '$'.parse_next(input)?;
    Ok(VariableRef::new(required_name(input)?))
}

fn end_of_message(input: &mut &str) -> ModalResult<()> {
    if input.is_empty() {
        Ok(())
    } else {
        fail_with(input, SyntaxErrorKind::ExtraContent)
    }
}

struct StrictParser {
    resource: bool,
}

impl StrictParser {
    fn message(&self, input: &mut &str) -> ModalResult<Message> {
        let start = *input;
        ws(input)?;
        if input.starts_with('.') {
            let declarations = self.declarations(input)?;
            if input.starts_with(".match") {
                return self.select(input, declarations);
            }
            let pattern = self.quoted_pattern(input)?;
            ws(input)?;
            end_of_message(input)?;
            return Ok(Message::Pattern(PatternMessage {
                declarations,
                pattern,
            }));
        }
        if input.starts_with("{{") {
            let pattern = self.quoted_pattern(input)?;
            ws(input)?;
            end_of_message(input)?;
            return Ok(Message::Pattern(PatternMessage {
                declarations: Vec::new(),
                pattern,
            }));
        }
        *input = start;
        let pattern = self.pattern(input)?;
        end_of_message(input)?;
        Ok(Message::Pattern(PatternMessage {
            declarations: Vec::new(),
            pattern,
        }))
    }

    // ---- declarations ----

    fn declarations(&self, input: &mut &str) -> ModalResult<Vec<Declaration>> {
        let mut declarations = Vec::new();
        loop {
            let before = *input;
            if opt('.').parse_next(input)?.is_none() {
                return Ok(declarations);
            }
            let declaration = match opt(name).parse_next(input)?.as_deref() {
                Some("input") => self.input_declaration(input)?,
                Some("local") => self.local_declaration(input)?,
                Some("match") => {
                    *input = before;
                    return Ok(declarations);
                }
                _ => {
                    *input = before;
                    return fail_with(input, SyntaxErrorKind::MissingSyntax);
                }
            };
            declarations.push(declaration);
            ws(input)?;
        }
    }

    fn input_declaration(&self, input: &mut &str) -> ModalResult<Declaration> {
        ws(input)?;
        let start = *input;
        if let PatternElement::Expression(value) = self.declaration_value(input)? {
            if let Some(Operand::Variable(var)) = value.arg() {
                return Ok(Declaration::Input {
                    name: var.name.clone(),
                    value,
                });
            }
        }
        *input = start;
        fail_with(input, SyntaxErrorKind::BadInputExpression)
    }

    fn local_declaration(&self, input: &mut &str) -> ModalResult<Declaration> {
        if !ws(input)? || !input.starts_with('$') {
            return fail_with(input, SyntaxErrorKind::MissingSyntax);
        }
        let name = variable(input)?.name;
        ws(input)?;
        cut_err('=')
            .context(label(SyntaxErrorKind::MissingSyntax))
            .parse_next(input)?;
        ws(input)?;
        let start = *input;
        match self.declaration_value(input)? {
            PatternElement::Expression(value) => Ok(Declaration::Local { name, value }),
            PatternElement::Markup(_) | PatternElement::Text(_) => {
                *input = start;
                fail_with(input, SyntaxErrorKind::ParseError)
            }
        }
    }

    fn declaration_value(&self, input: &mut &str) -> ModalResult<PatternElement> {
        if !input.starts_with('{') || input.starts_with("{{") {
            return fail_with(input, SyntaxErrorKind::MissingSyntax);
        }
        self.placeholder(input)
    }

    // ---- selection ----

    fn select(&self, input: &mut &str, declarations: Vec<Declaration>) -> ModalResult<Message> {
        ".match".parse_next(input)?;
        let mut selectors = Vec::new();
        loop {
            let before = *input;
            let had_ws = ws(input)?;
            if !input.starts_with('$') {
                *input = before;
                break;
            }
            if !had_ws {
                return fail_with(input, SyntaxErrorKind::MissingSyntax);
            }
            selectors.push(variable(input)?);
        }
        if selectors.is_empty() {
            ws(input)?;
            return fail_with(input, SyntaxErrorKind::EmptyToken);
        }
        if !ws(input)? {
            return fail_with(input, SyntaxErrorKind::MissingSyntax);
        }

        let mut variants = Vec::new();
        while !input.is_empty() {
            let keys = self.keys(input)?;
            let value = self.quoted_pattern(input)?;
            variants.push(Variant { keys, value });
            ws(input)?;
        }
        Ok(Message::Select(SelectMessage {
            declarations,
            selectors,
            variants,
        }))
    }

    fn keys(&self, input: &mut &str) -> ModalResult<Vec<VariantKey>> {
        let mut keys = Vec::new();
        loop {
            let before = *input;
            let had_ws = ws(input)?;
            let key = if opt('*').parse_next(input)?.is_some() {
                VariantKey::CatchAll
            } else if input.starts_with(|c: char| c == '|' || scan::is_name_char(c)) {
                VariantKey::Literal(self.required_literal(input)?)
            } else {
                break;
            };
            if !keys.is_empty() && !had_ws {
                *input = before;
                return fail_with(input, SyntaxErrorKind::MissingSyntax);
            }
            keys.push(key);
        }
        if keys.is_empty() {
            return fail_with(input, SyntaxErrorKind::EmptyToken);
        }
        Ok(keys)
    }

    // ---- patterns ----

    fn quoted_pattern(&self, input: &mut &str) -> ModalResult<Pattern> {
        cut_err("{{")
            .context(label(SyntaxErrorKind::MissingSyntax))
            .parse_next(input)?;
        let pattern = self.pattern(input)?;
        cut_err("}}")
            .context(label(SyntaxErrorKind::MissingSyntax))
            .parse_next(input)?;
        Ok(pattern)
    }

    fn pattern(&self, input: &mut &str) -> ModalResult<Pattern> {
        let mut pattern = Vec::new();
        loop {
            if input.starts_with('{') {
                pattern.push(self.placeholder(input)?);
            } else {
                let text = self.text(input)?;
                if text.is_empty() {
                    return Ok(pattern);
                }
                pattern.push(PatternElement::Text(text));
            }
        }
    }

    fn text(&self, input: &mut &str) -> ModalResult<String> {
        let resource = self.resource;
        let mut value = String::new();
        loop {
            let chunk = take_till(0.., |c: char| {
                matches!(c, '{' | '}' | '\\') || (resource && c == '\n')
            })
            .parse_next(input)?;
            value.push_str(chunk);
            if input.starts_with('\\') {
                value.push(self.escape(input)?);
            } else if resource && input.starts_with('\n') {
                '\n'.parse_next(input)?;
                value.push('\n');
                take_while(0.., [' ', '\t']).void().parse_next(input)?;
            } else {
                return Ok(value);
            }
        }
    }

    fn escape(&self, input: &mut &str) -> ModalResult<char> {
        match scan::decode_escape(*input, 0, self.resource) {
            Escape::Char { value, end } => {
                let _ = input.next_slice(end);
                Ok(value)
            }
            Escape::Invalid { .. } => fail_with(input, SyntaxErrorKind::BadEscape),
        }
    }

    // ---- placeholders ----

    fn placeholder(&self, input: &mut &str) -> ModalResult<PatternElement> {
        '{'.parse_next(input)?;
        ws(input)?;

        let arg_start = *input;
        let arg = if input.starts_with('$') {
            Some(Operand::Variable(variable(input)?))
        } else {
            opt(|i: &mut &str| self.literal(i))
                .parse_next(input)?
                .map(Operand::Literal)
        };
        if arg.is_some() {
            let before = *input;
            if !ws(input)? && !input.starts_with('}') {
                *input = before;
                return fail_with(input, SyntaxErrorKind::MissingSyntax);
            }
        }

        let mut function = None;
        let mut markup = None;
        match input.chars().next() {
            Some(':') => {
                ':'.parse_next(input)?;
                let name = identifier(input)?;
                let options = self.options(input)?;
                function = Some(FunctionRef { name, options });
            }
            Some(sigil @ ('#' | '/')) => {
                if arg.is_some() {
                    *input = arg_start;
                    return fail_with(input, SyntaxErrorKind::ExtraContent);
                }
                one_of(['#', '/']).parse_next(input)?;
                let name = identifier(input)?;
                let options = self.options(input)?;
                let kind = if sigil == '/' {
                    MarkupKind::Close
                } else {
                    MarkupKind::Open
                };
                markup = Some((kind, name, options));
            }
            Some('@' | '}') | None => {
                if arg.is_none() {
                    return fail_with(input, SyntaxErrorKind::EmptyToken);
                }
            }
            Some(_) => {
                if arg.is_none() {
                    return fail_with(input, SyntaxErrorKind::ParseError);
                }
            }
        }

        let attributes = self.attributes(input, function.is_some() || markup.is_some())?;
        ws(input)?;
        if let Some((kind, ..)) = &mut markup {
            if *kind == MarkupKind::Open && opt('/').parse_next(input)?.is_some() {
                *kind = MarkupKind::Standalone;
                let before = *input;
                ws(input)?;
                if input.len() != before.len() {
                    *input = before;
                    return fail_with(input, SyntaxErrorKind::ExtraContent);
                }
            }
        }
        if input.is_empty() {
            return fail_with(input, SyntaxErrorKind::MissingSyntax);
        }
        if opt('}').parse_next(input)?.is_none() {
            return fail_with(input, SyntaxErrorKind::ExtraContent);
        }

        if let Some((kind, name, options)) = markup {
            return Ok(PatternElement::Markup(Markup {
                kind,
                name,
                options,
                attributes,
            }));
        }
        let expression = match (arg, function) {
            (arg, Some(function)) => Expression::annotated(arg, function),
            (Some(arg), None) => Expression::operand(arg),
            (None, None) => return fail_with(input, SyntaxErrorKind::EmptyToken),
        };
        Ok(PatternElement::Expression(
            expression.with_attributes(attributes),
        ))
    }

    fn options(&self, input: &mut &str) -> ModalResult<Options> {
        let mut options = Options::new();
        loop {
            let before = *input;
            let had_ws = ws(input)?;
            if !input.starts_with(|c: char| scan::is_name_start(c) || scan::is_bidi(c)) {
                *input = before;
                return Ok(options);
            }
            if !had_ws {
                return fail_with(input, SyntaxErrorKind::MissingSyntax);
            }
            let option_start = *input;
            let name = identifier(input)?;
            ws(input)?;
            cut_err('=')
                .context(label(SyntaxErrorKind::MissingSyntax))
                .parse_next(input)?;
            ws(input)?;
            let value = if input.starts_with('$') {
                Operand::Variable(variable(input)?)
            } else {
                Operand::Literal(self.required_literal(input)?)
            };
            if options.contains_key(&name) {
                *input = option_start;
                return fail_with(input, SyntaxErrorKind::DuplicateOptionName);
            }
            options.insert(name, value);
        }
    }

    fn attributes(&self, input: &mut &str, mut require_ws: bool) -> ModalResult<Attributes> {
        let mut attributes = Attributes::new();
        loop {
            let before = *input;
            let had_ws = ws(input)?;
            if !input.starts_with('@') {
                *input = before;
                return Ok(attributes);
            }
            if require_ws && !had_ws {
                return fail_with(input, SyntaxErrorKind::MissingSyntax);
            }
            let attribute_start = *input;
            '@'.parse_next(input)?;
            let name = identifier(input)?;
            let before_value = *input;
            ws(input)?;
            let value = if opt('=').parse_next(input)?.is_some() {
                ws(input)?;
                Some(self.required_literal(input)?)
            } else {
                *input = before_value;
                None
            };
            if attributes.contains_key(&name) {
                *input = attribute_start;
                return fail_with(input, SyntaxErrorKind::DuplicateAttribute);
            }
            attributes.insert(name, value);
            require_ws = true;
        }
    }

    // ---- literals ----

    fn literal(&self, input: &mut &str) -> ModalResult<Literal> {
        if input.starts_with('|') {
            return self.quoted_literal(input);
        }
        let value = take_while(1.., scan::is_name_char).parse_next(input)?;
        Ok(Literal::new(value))
    }

    fn required_literal(&self, input: &mut &str) -> ModalResult<Literal> {
        cut_err(|i: &mut &str| self.literal(i))
            .context(label(SyntaxErrorKind::EmptyToken))
            .parse_next(input)
    }

    fn quoted_literal(&self, input: &mut &str) -> ModalResult<Literal> {
        '|'.parse_next(input)?;
        let mut value = String::new();
        loop {
            value.push_str(take_till(0.., ['|', '\\']).parse_next(input)?);
            if input.starts_with('\\') {
                value.push(self.escape(input)?);
            } else if opt('|').parse_next(input)?.is_some() {
                return Ok(Literal::new(value));
            } else {
                return fail_with(input, SyntaxErrorKind::MissingSyntax);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_at(source: &str) -> (SyntaxErrorKind, usize) {
        let error = parse_message(source, ParseOptions::default()).unwrap_err();
        (error.kind, error.span.start)
    }

    #[test]
    fn duplicate_option_points_at_second_option() {
        assert_eq!(
            error_at("{:f a=1 a=2}"),
            (SyntaxErrorKind::DuplicateOptionName, 8)
        );
    }

    #[test]
    fn unclosed_placeholder_is_missing_syntax() {
        assert_eq!(error_at("hi {$x"), (SyntaxErrorKind::MissingSyntax, 6));
    }

    #[test]
    fn bad_escape_in_text() {
        assert_eq!(error_at("a \\q"), (SyntaxErrorKind::BadEscape, 2));
    }

    #[test]
    fn input_requires_variable_operand() {
        assert_eq!(
            error_at(".input {1 :number} {{}}"),
            (SyntaxErrorKind::BadInputExpression, 7)
        );
    }
}
