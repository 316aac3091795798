//! Serializes a concrete syntax tree back into MF2 source.

use super::cst::{
    Annotation, Attribute, Declaration, DeclarationValue, Expression, Identifier, Key, Literal,
    LocalTarget, Message, NamedOption, Operand, Pattern, PatternElement,
};
use super::{ParseOptions, scan};

/// Renders `message` as MF2 source.
///
/// Junk nodes are emitted verbatim, so a tree with errors stringifies to
/// something close to its original source. For a tree without errors the
/// output parses back to an equivalent tree.
pub fn stringify_cst(message: &Message) -> String {
    stringify_cst_with(message, ParseOptions::default())
}

/// Renders `message` as MF2 source to be parsed with `options`.
///
/// In resource mode, tabs and line breaks in text are written as escapes so
/// that the indentation after a line break survives a reparse.
pub fn stringify_cst_with(message: &Message, options: ParseOptions) -> String {
    let resource = options.resource;
    let mut out = String::new();
    for declaration in message.declarations() {
        write_declaration(&mut out, declaration);
        out.push('\n');
    }
    match message {
        Message::Simple(msg) => {
            let quoted = needs_quotes(&msg.pattern);
            write_pattern(&mut out, &msg.pattern, quoted, resource);
        }
        Message::Complex(msg) => write_pattern(&mut out, &msg.pattern, true, resource),
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
                        Key::Literal(literal) => write_literal(&mut out, &literal.value, literal.quoted),
                        Key::CatchAll(_) => out.push('*'),
                    }
                    out.push(' ');
                }
                write_pattern(&mut out, &variant.value, true, resource);
            }
        }
    }
    out
}

/// A bare pattern whose first text would read as a declaration keyword must
/// be quoted.
fn needs_quotes(pattern: &Pattern) -> bool {
    match pattern.body.first() {
        Some(PatternElement::Text(text)) => text
            .value
            .trim_start_matches(|c| scan::is_whitespace(c) || scan::is_bidi(c))
            .starts_with('.'),
        _ => false,
    }
}

fn write_declaration(out: &mut String, declaration: &Declaration) {
    match declaration {
        Declaration::Input(decl) => {
            out.push_str(".input ");
            write_declaration_value(out, &decl.value);
        }
        Declaration::Local(decl) => {
            out.push_str(".local ");
            match &decl.target {
                LocalTarget::Variable(var) => {
                    out.push('$');
                    out.push_str(&var.name);
                }
                LocalTarget::Junk(junk) => out.push_str(&junk.source),
            }
            out.push_str(" = ");
            write_declaration_value(out, &decl.value);
        }
        Declaration::Junk(junk) => out.push_str(&junk.source),
    }
}

fn write_declaration_value(out: &mut String, value: &DeclarationValue) {
    match value {
        DeclarationValue::Expression(expr) => write_expression(out, expr),
        DeclarationValue::Junk(junk) => out.push_str(&junk.source),
    }
}

fn write_pattern(out: &mut String, pattern: &Pattern, quoted: bool, resource: bool) {
    if quoted {
        out.push_str("{{");
    }
    for element in &pattern.body {
        match element {
            PatternElement::Text(text) => write_text(out, &text.value, resource),
            PatternElement::Expression(expr) => write_expression(out, expr),
        }
    }
    if quoted {
        out.push_str("}}");
    }
}

pub(crate) fn write_text(out: &mut String, text: &str, resource: bool) {
    for c in text.chars() {
        match c {
            '\\' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '\n' if resource => out.push_str("\\n"),
            '\t' if resource => out.push_str("\\t"),
            '\r' if resource => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
}

/// Writes a literal, quoting it when it is not a valid unquoted literal.
pub(crate) fn write_literal(out: &mut String, value: &str, quoted: bool) {
    if !quoted && scan::is_valid_unquoted_literal(value) {
        out.push_str(value);
        return;
    }
    out.push('|');
    for c in value.chars() {
        if matches!(c, '\\' | '|') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('|');
}

fn write_expression(out: &mut String, expr: &Expression) {
    out.push('{');
    let mut first = true;
    if let Some(arg) = &expr.arg {
        write_operand(out, arg);
        first = false;
    }
    if let Some(annotation) = &expr.annotation {
        if !first {
            out.push(' ');
        }
        first = false;
        match annotation {
            Annotation::Function(func) => {
                out.push(':');
                write_identifier(out, &func.name);
                write_options(out, &func.options);
            }
            Annotation::Markup(markup) => {
                out.push_str(markup.open.value);
                write_identifier(out, &markup.name);
                write_options(out, &markup.options);
            }
            Annotation::Junk(junk) => out.push_str(&junk.source),
        }
    }
    for attribute in &expr.attributes {
        if !first {
            out.push(' ');
        }
        first = false;
        write_attribute(out, attribute);
    }
    if expr.markup().is_some_and(|markup| markup.close.is_some()) {
        out.push_str(" /");
    }
    out.push('}');
}

fn write_identifier(out: &mut String, name: &[Identifier]) {
    for part in name {
        out.push_str(&part.value);
    }
}

fn write_options(out: &mut String, options: &[NamedOption]) {
    for option in options {
        out.push(' ');
        write_identifier(out, &option.name);
        out.push('=');
        write_operand(out, &option.value);
    }
}

fn write_attribute(out: &mut String, attribute: &Attribute) {
    out.push('@');
    write_identifier(out, &attribute.name);
    if let Some(value) = &attribute.value {
        out.push('=');
        write_cst_literal(out, value);
    }
}

fn write_operand(out: &mut String, operand: &Operand) {
    match operand {
        Operand::Literal(literal) => write_cst_literal(out, literal),
        Operand::Variable(var) => {
            out.push('$');
            out.push_str(&var.name);
        }
    }
}

fn write_cst_literal(out: &mut String, literal: &Literal) {
    write_literal(out, &literal.value, literal.quoted);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_literals_that_need_it() {
        let mut out = String::new();
        write_literal(&mut out, "a b|c", false);
        assert_eq!(out, "|a b\\|c|");
    }

    #[test]
    fn escapes_braces_in_text() {
        let mut out = String::new();
        write_text(&mut out, "{x}\\", false);
        assert_eq!(out, "\\{x\\}\\\\");
    }

    #[test]
    fn escapes_line_breaks_only_in_resource_mode() {
        let mut out = String::new();
        write_text(&mut out, "a\n  b\t", true);
        assert_eq!(out, "a\\n  b\\t");

        let mut out = String::new();
        write_text(&mut out, "a\n  b", false);
        assert_eq!(out, "a\n  b");
    }
}
