//! Canonical MF2 syntax for data model messages.

use super::{
    Attributes, Declaration, Expression, Markup, MarkupKind, Message, Operand, Options, Pattern,
    PatternElement, VariantKey,
};
use crate::parser::{ParseOptions, scan, write_literal, write_text};

/// Renders `message` in canonical MF2 syntax.
///
/// The result parses back to a message equal to `message`. Options and
/// attributes are written in name order, and literals are quoted only when
/// they must be.
pub fn stringify_message(message: &Message) -> String {
    stringify_message_with(message, ParseOptions::default())
}

/// Renders `message` in canonical MF2 syntax for parsing with `options`.
///
/// In resource mode, tabs and line breaks in text are escaped.
pub fn stringify_message_with(message: &Message, options: ParseOptions) -> String {
    let resource = options.resource;
    let mut out = String::new();
    for declaration in message.declarations() {
        match declaration {
            Declaration::Input { .. } => out.push_str(".input "),
            Declaration::Local { name, .. } => {
                out.push_str(".local $");
                out.push_str(name);
                out.push_str(" = ");
            }
        }
        write_expression(&mut out, declaration.value());
        out.push('\n');
    }
    match message {
        Message::Pattern(msg) => {
            let quoted = !msg.declarations.is_empty() || starts_like_declaration(&msg.pattern);
            write_pattern(&mut out, &msg.pattern, quoted, resource);
        }
        Message::Select(msg) => {
            out.push_str(".match");
            for selector in &msg.selectors {
                out.push_str(" $");
                out.push_str(&selector.name);
            }
            for variant in &msg.variants {
                out.push('\n');
                for key in &variant.keys {
                    match key {
                        VariantKey::Literal(lit) => write_literal(&mut out, &lit.value, false),
                        VariantKey::CatchAll => out.push('*'),
                    }
                    out.push(' ');
                }
                write_pattern(&mut out, &variant.value, true, resource);
            }
        }
    }
    out
}

fn starts_like_declaration(pattern: &Pattern) -> bool {
    match pattern.first() {
        Some(PatternElement::Text(text)) => text
            .trim_start_matches(|c| scan::is_whitespace(c) || scan::is_bidi(c))
            .starts_with('.'),
        _ => false,
    }
}

fn write_pattern(out: &mut String, pattern: &Pattern, quoted: bool, resource: bool) {
    if quoted {
        out.push_str("{{");
    }
    for element in pattern {
        match element {
            PatternElement::Text(text) => write_text(out, text, resource),
            PatternElement::Expression(expr) => write_expression(out, expr),
            PatternElement::Markup(markup) => write_markup(out, markup),
        }
    }
    if quoted {
        out.push_str("}}");
    }
}

fn write_expression(out: &mut String, expr: &Expression) {
    out.push('{');
    if let Some(arg) = expr.arg() {
        write_operand(out, arg);
    }
    if let Some(function) = expr.function() {
        if expr.arg().is_some() {
            out.push(' ');
        }
        out.push(':');
        out.push_str(&function.name);
        write_options(out, &function.options);
    }
    write_attributes(out, &expr.attributes);
    out.push('}');
}

fn write_markup(out: &mut String, markup: &Markup) {
    out.push('{');
    out.push(if markup.kind == MarkupKind::Close { '/' } else { '#' });
    out.push_str(&markup.name);
    write_options(out, &markup.options);
    write_attributes(out, &markup.attributes);
    if markup.kind == MarkupKind::Standalone {
        out.push_str(" /");
    }
    out.push('}');
}

fn write_options(out: &mut String, options: &Options) {
    for (name, value) in options {
        out.push(' ');
        out.push_str(name);
        out.push('=');
        write_operand(out, value);
    }
}

fn write_attributes(out: &mut String, attributes: &Attributes) {
    for (name, value) in attributes {
        out.push_str(" @");
        out.push_str(name);
        if let Some(value) = value {
            out.push('=');
            write_literal(out, &value.value, false);
        }
    }
}

fn write_operand(out: &mut String, operand: &Operand) {
    match operand {
        Operand::Literal(lit) => write_literal(out, &lit.value, false),
        Operand::Variable(var) => {
            out.push('$');
            out.push_str(&var.name);
        }
    }
}
