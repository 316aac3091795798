//! Strict conversion from the concrete syntax tree to the data model.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::{
    Attributes, Declaration, Expression, FunctionRef, Literal, Markup, MarkupKind, Message,
    NodePath, Operand, Options, Pattern, PatternElement, PatternMessage, SelectMessage,
    VariableRef, Variant, VariantKey,
};
use crate::parser::cst::{self, Span};
use crate::parser::{SyntaxError, SyntaxErrorKind};

/// Maps data model nodes back to the source span they were converted from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    spans: BTreeMap<NodePath, Span>,
}

impl SourceMap {
    pub fn get(&self, path: NodePath) -> Option<Span> {
        self.spans.get(&path).copied()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn insert(&mut self, path: NodePath, span: Span) {
        self.spans.insert(path, span);
    }
}

/// Converts a concrete syntax tree into the data model.
///
/// Fails with the first problem found: a syntax error recorded by the parser,
/// leftover junk, a malformed name, or a duplicated option or attribute.
pub fn message_from_cst(cst: &cst::Message) -> Result<Message, SyntaxError> {
    Converter { source_map: None }.message(cst)
}

/// Like [`message_from_cst`], also returning the spans of declarations,
/// selectors and variants.
pub fn message_from_cst_with_source_map(
    cst: &cst::Message,
) -> Result<(Message, SourceMap), SyntaxError> {
    let mut source_map = SourceMap::default();
    let message = Converter {
        source_map: Some(&mut source_map),
    }
    .message(cst)?;
    Ok((message, source_map))
}

struct Converter<'a> {
    source_map: Option<&'a mut SourceMap>,
}

fn error(kind: SyntaxErrorKind, span: Span) -> SyntaxError {
    SyntaxError::new(kind, span.start, span.end)
}

impl Converter<'_> {
    fn record(&mut self, path: NodePath, span: Span) {
        if let Some(map) = self.source_map.as_deref_mut() {
            map.insert(path, span);
        }
    }

    fn message(&mut self, cst: &cst::Message) -> Result<Message, SyntaxError> {
        if let Some(first) = cst.errors().first() {
            return Err(first.clone());
        }

        let mut declarations = Vec::new();
        for (i, declaration) in cst.declarations().iter().enumerate() {
            self.record(NodePath::Declaration(i), declaration.span());
            declarations.push(self.declaration(declaration)?);
        }

        match cst {
            cst::Message::Simple(msg) => Ok(Message::Pattern(PatternMessage {
                declarations,
                pattern: self.pattern(&msg.pattern)?,
            })),
            cst::Message::Complex(msg) => Ok(Message::Pattern(PatternMessage {
                declarations,
                pattern: self.pattern(&msg.pattern)?,
            })),
            cst::Message::Select(msg) => {
                let mut selectors = Vec::new();
                for (i, selector) in msg.selectors.iter().enumerate() {
                    self.record(NodePath::Selector(i), selector.span);
                    selectors.push(variable(selector));
                }
                let mut variants = Vec::new();
                for (i, variant) in msg.variants.iter().enumerate() {
                    self.record(NodePath::Variant(i), variant.span);
                    variants.push(Variant {
                        keys: variant.keys.iter().map(key).collect(),
                        value: self.pattern(&variant.value)?,
                    });
                }
                Ok(Message::Select(SelectMessage {
                    declarations,
                    selectors,
                    variants,
                }))
            }
        }
    }

    fn declaration(&mut self, declaration: &cst::Declaration) -> Result<Declaration, SyntaxError> {
        match declaration {
            cst::Declaration::Input(decl) => {
                let value = declaration_expression(&decl.value)?;
                let Some(Operand::Variable(var)) = value.arg() else {
                    return Err(error(SyntaxErrorKind::BadInputExpression, decl.value.span()));
                };
                Ok(Declaration::Input {
                    name: var.name.clone(),
                    value,
                })
            }
            cst::Declaration::Local(decl) => {
                let name = match &decl.target {
                    cst::LocalTarget::Variable(var) => var.name.clone(),
                    cst::LocalTarget::Junk(junk) => {
                        return Err(error(SyntaxErrorKind::ParseError, junk.span));
                    }
                };
                Ok(Declaration::Local {
                    name,
                    value: declaration_expression(&decl.value)?,
                })
            }
            cst::Declaration::Junk(junk) => Err(error(SyntaxErrorKind::ParseError, junk.span)),
        }
    }

    fn pattern(&mut self, pattern: &cst::Pattern) -> Result<Pattern, SyntaxError> {
        pattern
            .body
            .iter()
            .map(|element| match element {
                cst::PatternElement::Text(text) => Ok(PatternElement::Text(text.value.clone())),
                cst::PatternElement::Expression(expr) => placeholder(expr),
            })
            .collect()
    }
}

/// Converts a declaration's value, which must be a non-markup expression.
fn declaration_expression(value: &cst::DeclarationValue) -> Result<Expression, SyntaxError> {
    match value {
        cst::DeclarationValue::Expression(expr) => match placeholder(expr)? {
            PatternElement::Expression(expression) => Ok(expression),
            PatternElement::Markup(_) | PatternElement::Text(_) => {
                Err(error(SyntaxErrorKind::ParseError, expr.span))
            }
        },
        cst::DeclarationValue::Junk(junk) => Err(error(SyntaxErrorKind::ParseError, junk.span)),
    }
}

fn placeholder(expr: &cst::Expression) -> Result<PatternElement, SyntaxError> {
    let attributes = attributes(&expr.attributes)?;
    let arg = expr.arg.as_ref().map(operand);
    match &expr.annotation {
        None => match arg {
            Some(arg) => Ok(PatternElement::Expression(
                Expression::operand(arg).with_attributes(attributes),
            )),
            None => Err(error(SyntaxErrorKind::EmptyToken, expr.span)),
        },
        Some(cst::Annotation::Function(func)) => {
            let function = FunctionRef {
                name: identifier(&func.name, func.span)?,
                options: options(&func.options)?,
            };
            Ok(PatternElement::Expression(
                Expression::annotated(arg, function).with_attributes(attributes),
            ))
        }
        Some(cst::Annotation::Markup(markup)) => {
            if let Some(arg) = &expr.arg {
                return Err(error(SyntaxErrorKind::ExtraContent, arg.span()));
            }
            let kind = match (markup.open.value, markup.close.is_some()) {
                ("/", _) => MarkupKind::Close,
                (_, true) => MarkupKind::Standalone,
                (_, false) => MarkupKind::Open,
            };
            Ok(PatternElement::Markup(Markup {
                kind,
                name: identifier(&markup.name, markup.span)?,
                options: options(&markup.options)?,
                attributes,
            }))
        }
        Some(cst::Annotation::Junk(junk)) => Err(error(SyntaxErrorKind::ParseError, junk.span)),
    }
}

/// Joins a `name` or `namespace:name` identifier; any other shape is an error.
fn identifier(parts: &[cst::Identifier], span: Span) -> Result<String, SyntaxError> {
    match parts {
        [name] if !name.value.is_empty() => Ok(name.value.clone()),
        [namespace, separator, name]
            if separator.value == ":" && !namespace.value.is_empty() && !name.value.is_empty() =>
        {
            Ok(format!("{}:{}", namespace.value, name.value))
        }
        _ => Err(error(SyntaxErrorKind::ParseError, span)),
    }
}

fn options(options: &[cst::NamedOption]) -> Result<Options, SyntaxError> {
    let mut result = Options::new();
    for option in options {
        let name = identifier(&option.name, option.span)?;
        match result.entry(name) {
            Entry::Occupied(_) => {
                return Err(error(SyntaxErrorKind::DuplicateOptionName, option.span));
            }
            Entry::Vacant(entry) => {
                entry.insert(operand(&option.value));
            }
        }
    }
    Ok(result)
}

fn attributes(attributes: &[cst::Attribute]) -> Result<Attributes, SyntaxError> {
    let mut result = Attributes::new();
    for attribute in attributes {
        let name = identifier(&attribute.name, attribute.span)?;
        match result.entry(name) {
            Entry::Occupied(_) => {
                return Err(error(SyntaxErrorKind::DuplicateAttribute, attribute.span));
            }
            Entry::Vacant(entry) => {
                entry.insert(attribute.value.as_ref().map(literal));
            }
        }
    }
    Ok(result)
}

fn operand(operand: &cst::Operand) -> Operand {
    match operand {
        cst::Operand::Literal(lit) => Operand::Literal(literal(lit)),
        cst::Operand::Variable(var) => Operand::Variable(variable(var)),
    }
}

fn literal(literal: &cst::Literal) -> Literal {
    Literal::new(literal.value.clone())
}

fn variable(var: &cst::VariableRef) -> VariableRef {
    VariableRef::new(var.name.clone())
}

fn key(key: &cst::Key) -> VariantKey {
    match key {
        cst::Key::Literal(lit) => VariantKey::Literal(literal(lit)),
        cst::Key::CatchAll(_) => VariantKey::CatchAll,
    }
}
