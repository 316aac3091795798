//! Recovering recursive-descent parser producing the concrete syntax tree.
//!
//! The parser never fails: malformed input is kept as [`Junk`] nodes and the
//! problems are collected on the returned [`Message`]. Each production takes
//! the byte offset it starts at and returns a node whose span ends where the
//! next production should continue, so positions only ever move forward.

use std::mem;

use tracing::debug;

use super::ParseOptions;
use super::cst::{
    Annotation, Attribute, CatchAllKey, ComplexMessage, Declaration, DeclarationValue,
    Expression, FunctionRef, Identifier, InputDeclaration, Junk, Key, Literal, LocalDeclaration,
    LocalTarget, Markup, Message, NamedOption, Operand, Pattern, PatternElement, SelectMessage,
    SimpleMessage, Span, Syntax, Text, VariableRef, Variant,
};
use super::error::{SyntaxError, SyntaxErrorKind};
use super::scan::{self, Escape};

/// Parses `source` into a concrete syntax tree.
///
/// Always returns a tree. Syntax errors are available through
/// [`Message::errors`].
pub fn parse_cst(source: &str, options: ParseOptions) -> Message {
    let mut parser = CstParser {
        source,
        resource: options.resource,
        errors: Vec::new(),
    };
    let message = parser.message();
    if !message.errors().is_empty() {
        debug!(
            errors = message.errors().len(),
            first = %message.errors()[0],
            "message parsed with syntax errors"
        );
    }
    message
}

struct CstParser<'s> {
    source: &'s str,
    resource: bool,
    errors: Vec<SyntaxError>,
}

/// Which annotation `function_or_markup` is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnnotationKind {
    Function,
    Markup,
}

impl<'s> CstParser<'s> {
    fn at(&self, pos: usize) -> Option<char> {
        scan::char_at(self.source, pos)
    }

    fn is(&self, pos: usize, c: char) -> bool {
        self.at(pos) == Some(c)
    }

    fn starts_with(&self, pos: usize, token: &str) -> bool {
        self.source.get(pos..).is_some_and(|rest| rest.starts_with(token))
    }

    fn ws(&self, pos: usize) -> scan::Whitespace {
        scan::whitespaces(self.source, pos)
    }

    fn len(&self) -> usize {
        self.source.len()
    }

    fn slice(&self, start: usize, end: usize) -> &'s str {
        self.source.get(start..end).unwrap_or_default()
    }

    fn error(&mut self, kind: SyntaxErrorKind, start: usize, end: usize) {
        self.errors.push(SyntaxError::new(kind, start, end));
    }

    /// Records an error spanning the character at `pos`, or nothing at the
    /// end of input.
    fn error_at(&mut self, kind: SyntaxErrorKind, pos: usize) {
        let end = pos + self.at(pos).map_or(0, char::len_utf8);
        self.error(kind, pos, end);
    }

    fn missing(&mut self, pos: usize, expected: &str) {
        self.errors.push(SyntaxError::missing(pos, expected));
    }

    // ---- messages ----

    fn message(&mut self) -> Message {
        let pos = self.ws(0).end;
        if self.is(pos, '.') {
            let (declarations, end) = self.declarations(pos);
            if self.starts_with(end, ".match") {
                self.select_message(end, declarations)
            } else {
                self.complex_message(end, declarations)
            }
        } else if self.starts_with(pos, "{{") {
            self.complex_message(pos, Vec::new())
        } else {
            let pattern = self.pattern(0, false);
            if pattern.span.end < self.len() {
                self.error(SyntaxErrorKind::ExtraContent, pattern.span.end, self.len());
            }
            Message::Simple(SimpleMessage {
                pattern,
                errors: mem::take(&mut self.errors),
            })
        }
    }

    fn complex_message(&mut self, start: usize, declarations: Vec<Declaration>) -> Message {
        let pattern = self.pattern(start, true);
        let end = self.ws(pattern.span.end).end;
        if end < self.len() {
            self.error(SyntaxErrorKind::ExtraContent, end, self.len());
        }
        Message::Complex(ComplexMessage {
            declarations,
            pattern,
            errors: mem::take(&mut self.errors),
        })
    }

    fn select_message(&mut self, start: usize, declarations: Vec<Declaration>) -> Message {
        let match_keyword = Syntax::new(start, ".match");
        let mut pos = match_keyword.span.end;
        let mut ws = self.ws(pos);
        if !ws.has_ws {
            self.missing(pos, "' '");
        }
        pos = ws.end;

        let mut selectors = Vec::new();
        while self.is(pos, '$') {
            let selector = self.variable(pos);
            pos = selector.span.end;
            selectors.push(selector);
            ws = self.ws(pos);
            if !ws.has_ws {
                self.missing(pos, "' '");
            }
            pos = ws.end;
        }
        if selectors.is_empty() {
            self.error_at(SyntaxErrorKind::EmptyToken, pos);
        }

        let mut variants = Vec::new();
        while pos < self.len() {
            let variant = self.variant(pos);
            if variant.span.end == pos {
                self.error(SyntaxErrorKind::ExtraContent, pos, self.len());
                break;
            }
            pos = self.ws(variant.span.end).end;
            variants.push(variant);
        }

        Message::Select(SelectMessage {
            declarations,
            match_keyword,
            selectors,
            variants,
            errors: mem::take(&mut self.errors),
        })
    }

    fn variant(&mut self, start: usize) -> Variant {
        let mut pos = start;
        let mut keys = Vec::new();
        loop {
            let ws = self.ws(pos);
            let key_start = ws.end;
            let key = match self.at(key_start) {
                Some('*') => Key::CatchAll(CatchAllKey {
                    span: Span::new(key_start, key_start + 1),
                }),
                Some(c) if c == '|' || scan::is_name_char(c) => {
                    Key::Literal(self.literal_required(key_start))
                }
                _ => {
                    pos = key_start;
                    break;
                }
            };
            if !keys.is_empty() && !ws.has_ws {
                self.missing(pos, "' '");
            }
            pos = match &key {
                Key::Literal(lit) => lit.span.end,
                Key::CatchAll(key) => key.span.end,
            };
            keys.push(key);
        }
        if keys.is_empty() {
            if pos < self.len() {
                self.error_at(SyntaxErrorKind::EmptyToken, pos);
            }
            return Variant {
                span: Span::new(start, start),
                keys,
                value: Pattern {
                    span: Span::new(start, start),
                    quoted: true,
                    braces: Vec::new(),
                    body: Vec::new(),
                },
            };
        }
        let value = self.pattern(pos, true);
        Variant {
            span: Span::new(start, value.span.end),
            keys,
            value,
        }
    }

    // ---- declarations ----

    fn declarations(&mut self, start: usize) -> (Vec<Declaration>, usize) {
        let mut pos = start;
        let mut declarations = Vec::new();
        while self.is(pos, '.') {
            let keyword = scan::parse_name(self.source, pos + 1).map(|name| name.value);
            let declaration = match keyword.as_deref() {
                None | Some("match") => break,
                Some("input") => Declaration::Input(self.input_declaration(pos)),
                Some("local") => Declaration::Local(self.local_declaration(pos)),
                Some(_) => Declaration::Junk(self.declaration_junk(pos)),
            };
            pos = self.ws(declaration.span().end).end;
            declarations.push(declaration);
        }
        (declarations, pos)
    }

    fn input_declaration(&mut self, start: usize) -> InputDeclaration {
        let keyword = Syntax::new(start, ".input");
        let pos = self.ws(keyword.span.end).end;
        let value = self.declaration_value(pos);
        if let DeclarationValue::Expression(expr) = &value {
            let variable_arg = matches!(expr.arg, Some(Operand::Variable(_)));
            if !variable_arg || expr.markup().is_some() {
                self.error(
                    SyntaxErrorKind::BadInputExpression,
                    expr.span.start,
                    expr.span.end,
                );
            }
        }
        InputDeclaration {
            span: Span::new(start, value.span().end),
            keyword,
            value,
        }
    }

    fn local_declaration(&mut self, start: usize) -> LocalDeclaration {
        let keyword = Syntax::new(start, ".local");
        let ws = self.ws(keyword.span.end);
        let mut pos = ws.end;
        if !ws.has_ws {
            self.missing(pos, "' '");
        }

        let target = if self.is(pos, '$') {
            let var = self.variable(pos);
            pos = var.span.end;
            LocalTarget::Variable(var)
        } else {
            let junk_start = pos;
            let rest = self.slice(pos, self.len());
            pos += rest
                .find(['\t', '\n', '\r', ' ', '=', '{', '}'])
                .unwrap_or(rest.len());
            self.missing(junk_start, "$");
            LocalTarget::Junk(Junk {
                span: Span::new(junk_start, pos),
                source: self.slice(junk_start, pos).to_string(),
            })
        };

        pos = self.ws(pos).end;
        let equals = if self.is(pos, '=') {
            let equals = Syntax::new(pos, "=");
            pos += 1;
            Some(equals)
        } else {
            self.missing(pos, "=");
            None
        };
        pos = self.ws(pos).end;

        let value = self.declaration_value(pos);
        LocalDeclaration {
            span: Span::new(start, value.span().end),
            keyword,
            target,
            equals,
            value,
        }
    }

    fn declaration_value(&mut self, start: usize) -> DeclarationValue {
        if self.is(start, '{') && !self.starts_with(start, "{{") {
            DeclarationValue::Expression(self.expression(start))
        } else {
            DeclarationValue::Junk(self.declaration_junk(start))
        }
    }

    /// Swallows everything up to the next `.keyword` or `{{`.
    fn declaration_junk(&mut self, start: usize) -> Junk {
        let rest = self.slice(start, self.len());
        let mut end = self.len();
        let mut chars = rest.char_indices().skip(1).peekable();
        while let Some((i, c)) = chars.next() {
            let next = chars.peek().map(|&(_, next)| next);
            let resync = (c == '.' && next.is_some_and(|n| n.is_ascii_lowercase()))
                || (c == '{' && next == Some('{'));
            if resync {
                end = start + rest[..i].trim_end().len();
                break;
            }
        }
        self.missing(start, "{");
        Junk {
            span: Span::new(start, end),
            source: self.slice(start, end).to_string(),
        }
    }

    // ---- patterns ----

    fn pattern(&mut self, start: usize, quoted: bool) -> Pattern {
        let mut pos = start;
        let mut braces = Vec::new();
        if quoted {
            if self.starts_with(pos, "{{") {
                braces.push(Syntax::new(pos, "{{"));
                pos += 2;
            } else {
                self.missing(start, "{{");
                return Pattern {
                    span: Span::new(start, start),
                    quoted,
                    braces,
                    body: Vec::new(),
                };
            }
        }

        let mut body = Vec::new();
        while let Some(c) = self.at(pos) {
            match c {
                '{' => {
                    let expr = self.expression(pos);
                    pos = expr.span.end;
                    body.push(PatternElement::Expression(expr));
                }
                '}' => break,
                _ => {
                    let text = self.text(pos);
                    pos = text.span.end;
                    body.push(PatternElement::Text(text));
                }
            }
        }

        if quoted {
            if self.starts_with(pos, "}}") {
                braces.push(Syntax::new(pos, "}}"));
                pos += 2;
            } else {
                self.missing(pos, "}}");
            }
        }
        Pattern {
            span: Span::new(start, pos),
            quoted,
            braces,
            body,
        }
    }

    fn text(&mut self, start: usize) -> Text {
        let mut value = String::new();
        let mut copied = start;
        let mut pos = start;
        while let Some(c) = self.at(pos) {
            match c {
                '{' | '}' => break,
                '\\' => match scan::decode_escape(self.source, pos, self.resource) {
                    Escape::Char { value: decoded, end } => {
                        value.push_str(self.slice(copied, pos));
                        value.push(decoded);
                        pos = end;
                        copied = end;
                    }
                    Escape::Invalid { end } => {
                        self.error(SyntaxErrorKind::BadEscape, pos, end);
                        pos += 1;
                    }
                },
                '\n' if self.resource => {
                    let indent_end = scan::skip_indent(self.source, pos + 1);
                    value.push_str(self.slice(copied, pos + 1));
                    pos = indent_end;
                    copied = indent_end;
                }
                _ => pos += c.len_utf8(),
            }
        }
        value.push_str(self.slice(copied, pos));
        Text {
            span: Span::new(start, pos),
            value,
        }
    }

    // ---- expressions ----

    fn expression(&mut self, start: usize) -> Expression {
        let open = Syntax::new(start, "{");
        let mut pos = self.ws(start + 1).end;

        let arg = if self.is(pos, '$') {
            Some(Operand::Variable(self.variable(pos)))
        } else {
            self.literal_optional(pos).map(Operand::Literal)
        };
        if let Some(arg) = &arg {
            pos = arg.span().end;
            let ws = self.ws(pos);
            if !ws.has_ws && !self.is(ws.end, '}') {
                self.missing(pos, "' '");
            }
            pos = ws.end;
        }

        let mut annotation = None;
        let mut junk_error = None;
        match self.at(pos) {
            Some(':') => {
                let (function, end) = self.function_or_markup(pos, AnnotationKind::Function);
                pos = end;
                annotation = Some(function);
            }
            Some('#' | '/') => {
                if let Some(arg) = &arg {
                    let span = arg.span();
                    self.error(SyntaxErrorKind::ExtraContent, span.start, span.end);
                }
                let (markup, end) = self.function_or_markup(pos, AnnotationKind::Markup);
                pos = end;
                annotation = Some(markup);
            }
            Some('@' | '}') | None => {
                if arg.is_none() {
                    self.error_at(SyntaxErrorKind::EmptyToken, pos);
                }
            }
            Some(c) => {
                if arg.is_none() {
                    let end = pos + c.len_utf8();
                    annotation = Some(Annotation::Junk(Junk {
                        span: Span::new(pos, end),
                        source: c.to_string(),
                    }));
                    junk_error = Some(self.errors.len());
                    self.error(SyntaxErrorKind::ParseError, pos, end);
                }
            }
        }

        let mut attributes = Vec::new();
        let mut require_ws = annotation.is_some();
        let mut ws = self.ws(pos);
        while self.is(ws.end, '@') {
            if require_ws && !ws.has_ws {
                self.missing(pos, "' '");
            }
            let attribute = self.attribute(ws.end);
            pos = attribute.span.end;
            attributes.push(attribute);
            require_ws = true;
            ws = self.ws(pos);
        }

        let slash = self.is(ws.end, '/');
        if let Some(Annotation::Markup(markup)) = &mut annotation {
            if slash && markup.close.is_none() && markup.open.value == "#" {
                markup.close = Some(Syntax::new(ws.end, "/"));
                pos = ws.end + 1;
                ws = self.ws(pos);
                if ws.end > pos {
                    self.error(SyntaxErrorKind::ExtraContent, pos, ws.end);
                }
            }
        }
        pos = ws.end;

        let mut braces = vec![open];
        if pos >= self.len() {
            self.missing(pos, "}");
        } else {
            if !self.is(pos, '}') {
                let skipped_start = pos;
                let rest = self.slice(pos, self.len());
                pos += rest.find('}').unwrap_or(rest.len());
                match (&mut annotation, junk_error) {
                    (Some(Annotation::Junk(junk)), Some(index)) => {
                        junk.span.end = pos;
                        junk.source = self.slice(junk.span.start, pos).to_string();
                        self.errors[index].span.end = pos;
                    }
                    _ => self.error(SyntaxErrorKind::ExtraContent, skipped_start, pos),
                }
            }
            if self.is(pos, '}') {
                braces.push(Syntax::new(pos, "}"));
                pos += 1;
            } else {
                self.missing(pos, "}");
            }
        }

        Expression {
            span: Span::new(start, pos),
            braces,
            arg,
            annotation,
            attributes,
        }
    }

    /// Parses `:name options...` or `#name options... [/]` or `/name options...`.
    fn function_or_markup(&mut self, start: usize, kind: AnnotationKind) -> (Annotation, usize) {
        let sigil = match self.at(start) {
            Some('#') => "#",
            Some('/') => "/",
            _ => ":",
        };
        let open = Syntax::new(start, sigil);
        let (name, mut pos) = self.identifier(start + 1);
        let mut options = Vec::new();
        let mut close = None;

        while pos < self.len() {
            let ws = self.ws(pos);
            match self.at(ws.end) {
                Some('@' | '}') | None => break,
                Some('/') if kind == AnnotationKind::Markup && sigil == "#" => {
                    close = Some(Syntax::new(ws.end, "/"));
                    pos = ws.end + 1;
                    let after = self.ws(pos);
                    if after.end > pos {
                        self.error(SyntaxErrorKind::ExtraContent, pos, after.end);
                    }
                    break;
                }
                Some(_) => {}
            }
            let Some(option) = self.option(ws.end) else {
                break;
            };
            if !ws.has_ws {
                self.missing(pos, "' '");
            }
            pos = option.span.end;
            options.push(option);
        }

        let span = Span::new(start, pos);
        let annotation = match kind {
            AnnotationKind::Function => Annotation::Function(FunctionRef {
                span,
                sigil: open,
                name,
                options,
            }),
            AnnotationKind::Markup => Annotation::Markup(Markup {
                span,
                open,
                name,
                options,
                close,
            }),
        };
        (annotation, pos)
    }

    /// Parses `name = value`, or returns `None` if no name starts at `start`.
    fn option(&mut self, start: usize) -> Option<NamedOption> {
        scan::parse_name(self.source, start)?;
        let (name, end) = self.identifier(start);
        let mut pos = self.ws(end).end;
        let equals = if self.is(pos, '=') {
            let equals = Syntax::new(pos, "=");
            pos += 1;
            Some(equals)
        } else {
            self.missing(pos, "=");
            None
        };
        pos = self.ws(pos).end;
        let value = if self.is(pos, '$') {
            Operand::Variable(self.variable(pos))
        } else {
            Operand::Literal(self.literal_required(pos))
        };
        Some(NamedOption {
            span: Span::new(start, value.span().end),
            name,
            equals,
            value,
        })
    }

    fn attribute(&mut self, start: usize) -> Attribute {
        let open = Syntax::new(start, "@");
        let (name, mut pos) = self.identifier(start + 1);
        let ws = self.ws(pos);
        let mut equals = None;
        let mut value = None;
        if self.is(ws.end, '=') {
            equals = Some(Syntax::new(ws.end, "="));
            let literal = self.literal_required(self.ws(ws.end + 1).end);
            pos = literal.span.end;
            value = Some(literal);
        }
        Attribute {
            span: Span::new(start, pos),
            open,
            name,
            equals,
            value,
        }
    }

    /// Parses `name` or `namespace:name` into its segments.
    fn identifier(&mut self, start: usize) -> (Vec<Identifier>, usize) {
        let Some(first) = scan::parse_name(self.source, start) else {
            self.error_at(SyntaxErrorKind::EmptyToken, start);
            let empty = Identifier {
                span: Span::new(start, start),
                value: String::new(),
            };
            return (vec![empty], start);
        };
        let mut parts = vec![Identifier {
            span: Span::new(start, first.end),
            value: first.value,
        }];
        let mut pos = first.end;
        if self.is(pos, ':') {
            parts.push(Identifier {
                span: Span::new(pos, pos + 1),
                value: ":".to_string(),
            });
            pos += 1;
            match scan::parse_name(self.source, pos) {
                Some(second) => {
                    parts.push(Identifier {
                        span: Span::new(pos, second.end),
                        value: second.value,
                    });
                    pos = second.end;
                }
                None => self.error_at(SyntaxErrorKind::EmptyToken, pos),
            }
        }
        (parts, pos)
    }

    fn variable(&mut self, start: usize) -> VariableRef {
        let open = Syntax::new(start, "$");
        let pos = start + 1;
        match scan::parse_name(self.source, pos) {
            Some(name) => VariableRef {
                span: Span::new(start, name.end),
                open,
                name: name.value,
            },
            None => {
                self.error_at(SyntaxErrorKind::EmptyToken, pos);
                VariableRef {
                    span: Span::new(start, pos),
                    open,
                    name: String::new(),
                }
            }
        }
    }

    // ---- literals ----

    fn literal_optional(&mut self, start: usize) -> Option<Literal> {
        if self.is(start, '|') {
            return Some(self.quoted_literal(start));
        }
        let value = scan::unquoted_literal(self.source, start);
        (!value.is_empty()).then(|| Literal {
            span: Span::new(start, start + value.len()),
            quoted: false,
            open: None,
            close: None,
            value: value.to_string(),
        })
    }

    fn literal_required(&mut self, start: usize) -> Literal {
        if let Some(literal) = self.literal_optional(start) {
            return literal;
        }
        self.error_at(SyntaxErrorKind::EmptyToken, start);
        Literal {
            span: Span::new(start, start),
            quoted: false,
            open: None,
            close: None,
            value: String::new(),
        }
    }

    fn quoted_literal(&mut self, start: usize) -> Literal {
        let open = Syntax::new(start, "|");
        let mut value = String::new();
        let mut copied = start + 1;
        let mut pos = start + 1;
        while let Some(c) = self.at(pos) {
            match c {
                '|' => {
                    value.push_str(self.slice(copied, pos));
                    return Literal {
                        span: Span::new(start, pos + 1),
                        quoted: true,
                        open: Some(open),
                        close: Some(Syntax::new(pos, "|")),
                        value,
                    };
                }
                '\\' => match scan::decode_escape(self.source, pos, self.resource) {
                    Escape::Char { value: decoded, end } => {
                        value.push_str(self.slice(copied, pos));
                        value.push(decoded);
                        pos = end;
                        copied = end;
                    }
                    Escape::Invalid { end } => {
                        self.error(SyntaxErrorKind::BadEscape, pos, end);
                        pos += 1;
                    }
                },
                _ => pos += c.len_utf8(),
            }
        }
        value.push_str(self.slice(copied, pos));
        self.missing(pos, "|");
        Literal {
            span: Span::new(start, pos),
            quoted: true,
            open: Some(open),
            close: None,
            value,
        }
    }
}
