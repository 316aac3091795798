//! Generic traversal of a data model message.
//!
//! [`visit`] walks a message in source order and calls the matching
//! [`Visitor`] method for each node. Compound nodes get an `exit_*` call after
//! their children, so bookkeeping can be scoped to a subtree. Node kinds
//! without an overridden method fall back to [`Visitor::node`] and
//! [`Visitor::exit_node`].

use super::{
    Attributes, Declaration, Expression, FunctionRef, Literal, Markup, Message, Operand, Options,
    Pattern, PatternElement, VariableRef, Variant, VariantKey,
};

/// Where a value appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueContext {
    /// Inside a declaration's expression.
    Declaration,
    /// A `.match` selector.
    Selector,
    /// Inside a pattern placeholder.
    Placeholder,
}

/// Which slot of its parent a value fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValuePosition {
    Arg,
    Option,
    Attribute,
}

/// A borrowed literal or variable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandRef<'m> {
    Literal(&'m Literal),
    Variable(&'m VariableRef),
}

impl<'m> From<&'m Operand> for OperandRef<'m> {
    fn from(operand: &'m Operand) -> Self {
        match operand {
            Operand::Literal(lit) => OperandRef::Literal(lit),
            Operand::Variable(var) => OperandRef::Variable(var),
        }
    }
}

/// Any node with a per-kind visitor method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'m> {
    Declaration(&'m Declaration),
    Expression(&'m Expression),
    FunctionRef(&'m FunctionRef),
    Markup(&'m Markup),
    Value(OperandRef<'m>),
    Variant(&'m Variant),
    Key(&'m VariantKey),
}

/// Per-kind callbacks for [`visit`].
///
/// Every method has a default. `options`, `attributes` and `pattern` do
/// nothing by default; the other kinds forward to `node`/`exit_node`.
#[expect(unused_variables)]
pub trait Visitor<'m> {
    fn node(&mut self, node: Node<'m>) {}

    fn exit_node(&mut self, node: Node<'m>) {}

    fn declaration(&mut self, declaration: &'m Declaration) {
        self.node(Node::Declaration(declaration));
    }

    fn exit_declaration(&mut self, declaration: &'m Declaration) {
        self.exit_node(Node::Declaration(declaration));
    }

    fn expression(&mut self, expression: &'m Expression, context: ValueContext) {
        self.node(Node::Expression(expression));
    }

    fn exit_expression(&mut self, expression: &'m Expression, context: ValueContext) {
        self.exit_node(Node::Expression(expression));
    }

    /// Called for a function annotation, with the operand it applies to.
    fn function_ref(
        &mut self,
        function: &'m FunctionRef,
        context: ValueContext,
        operand: Option<&'m Operand>,
    ) {
        self.node(Node::FunctionRef(function));
    }

    fn exit_function_ref(&mut self, function: &'m FunctionRef, context: ValueContext) {
        self.exit_node(Node::FunctionRef(function));
    }

    fn markup(&mut self, markup: &'m Markup, context: ValueContext) {
        self.node(Node::Markup(markup));
    }

    fn exit_markup(&mut self, markup: &'m Markup, context: ValueContext) {
        self.exit_node(Node::Markup(markup));
    }

    fn options(&mut self, options: &'m Options, context: ValueContext) {}

    fn exit_options(&mut self, options: &'m Options, context: ValueContext) {}

    fn attributes(&mut self, attributes: &'m Attributes, context: ValueContext) {}

    fn exit_attributes(&mut self, attributes: &'m Attributes, context: ValueContext) {}

    fn value(&mut self, value: OperandRef<'m>, context: ValueContext, position: ValuePosition) {
        self.node(Node::Value(value));
    }

    fn variant(&mut self, variant: &'m Variant) {
        self.node(Node::Variant(variant));
    }

    fn exit_variant(&mut self, variant: &'m Variant) {
        self.exit_node(Node::Variant(variant));
    }

    fn key(&mut self, key: &'m VariantKey, index: usize) {
        self.node(Node::Key(key));
    }

    fn pattern(&mut self, pattern: &'m Pattern) {}

    fn exit_pattern(&mut self, pattern: &'m Pattern) {}
}

/// Walks `message` in source order.
///
/// Declarations come first, each followed by its expression. A select
/// message then visits its selectors as values, and each variant with its
/// keys and pattern.
pub fn visit<'m, V: Visitor<'m> + ?Sized>(message: &'m Message, visitor: &mut V) {
    for declaration in message.declarations() {
        visitor.declaration(declaration);
        expression(visitor, declaration.value(), ValueContext::Declaration);
        visitor.exit_declaration(declaration);
    }

    match message {
        Message::Pattern(msg) => pattern(visitor, &msg.pattern),
        Message::Select(msg) => {
            for selector in &msg.selectors {
                visitor.value(
                    OperandRef::Variable(selector),
                    ValueContext::Selector,
                    ValuePosition::Arg,
                );
            }
            for variant in &msg.variants {
                visitor.variant(variant);
                for (index, key) in variant.keys.iter().enumerate() {
                    visitor.key(key, index);
                }
                pattern(visitor, &variant.value);
                visitor.exit_variant(variant);
            }
        }
    }
}

fn pattern<'m, V: Visitor<'m> + ?Sized>(visitor: &mut V, pattern: &'m Pattern) {
    visitor.pattern(pattern);
    for element in pattern {
        match element {
            PatternElement::Text(_) => {}
            PatternElement::Expression(expr) => {
                expression(visitor, expr, ValueContext::Placeholder);
            }
            PatternElement::Markup(markup) => {
                visitor.markup(markup, ValueContext::Placeholder);
                options(visitor, &markup.options, ValueContext::Placeholder);
                attributes(visitor, &markup.attributes, ValueContext::Placeholder);
                visitor.exit_markup(markup, ValueContext::Placeholder);
            }
        }
    }
    visitor.exit_pattern(pattern);
}

fn expression<'m, V: Visitor<'m> + ?Sized>(
    visitor: &mut V,
    expression: &'m Expression,
    context: ValueContext,
) {
    visitor.expression(expression, context);
    if let Some(arg) = expression.arg() {
        visitor.value(arg.into(), context, ValuePosition::Arg);
    }
    if let Some(function) = expression.function() {
        visitor.function_ref(function, context, expression.arg());
        options(visitor, &function.options, context);
        visitor.exit_function_ref(function, context);
    }
    attributes(visitor, &expression.attributes, context);
    visitor.exit_expression(expression, context);
}

fn options<'m, V: Visitor<'m> + ?Sized>(
    visitor: &mut V,
    options: &'m Options,
    context: ValueContext,
) {
    visitor.options(options, context);
    for value in options.values() {
        visitor.value(value.into(), context, ValuePosition::Option);
    }
    visitor.exit_options(options, context);
}

fn attributes<'m, V: Visitor<'m> + ?Sized>(
    visitor: &mut V,
    attributes: &'m Attributes,
    context: ValueContext,
) {
    visitor.attributes(attributes, context);
    for value in attributes.values().flatten() {
        visitor.value(
            OperandRef::Literal(value),
            context,
            ValuePosition::Attribute,
        );
    }
    visitor.exit_attributes(attributes, context);
}
