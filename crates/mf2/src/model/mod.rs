//! The MF2 data model.
//!
//! This is the abstract, immutable message tree used at runtime. It is
//! produced either by converting a concrete syntax tree
//! ([`message_from_cst`]) or directly by
//! [`parse_message`](crate::parser::parse_message), and it can be checked for
//! semantic problems with [`validate`].

mod convert;
mod error;
mod stringify;
mod validate;
pub mod visit;

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

pub use convert::{SourceMap, message_from_cst, message_from_cst_with_source_map};
pub use error::{DataModelError, DataModelErrorKind, NodePath};
pub use stringify::{stringify_message, stringify_message_with};
pub use validate::{Validation, validate, validate_with};
pub use visit::{Node, OperandRef, ValueContext, ValuePosition, Visitor, visit};

/// A complete message: declarations plus either one pattern or a selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    #[serde(rename = "message")]
    Pattern(PatternMessage),
    Select(SelectMessage),
}

impl Message {
    pub fn declarations(&self) -> &[Declaration] {
        match self {
            Message::Pattern(msg) => &msg.declarations,
            Message::Select(msg) => &msg.declarations,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PatternMessage {
    pub declarations: Vec<Declaration>,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SelectMessage {
    pub declarations: Vec<Declaration>,
    pub selectors: Vec<VariableRef>,
    pub variants: Vec<Variant>,
}

/// A named binding available to the rest of the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Declaration {
    /// `.input {$name ...}`: the declared name is the operand's own name.
    Input { name: String, value: Expression },
    /// `.local $name = {...}`
    Local { name: String, value: Expression },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Input { name, .. } | Declaration::Local { name, .. } => name,
        }
    }

    pub fn value(&self) -> &Expression {
        match self {
            Declaration::Input { value, .. } | Declaration::Local { value, .. } => value,
        }
    }
}

/// Text and placeholders, in order.
pub type Pattern = Vec<PatternElement>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PatternElement {
    Text(String),
    Expression(Expression),
    Markup(Markup),
}

/// A placeholder with an operand, a function, or both.
///
/// An expression with neither cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression {
    pub body: ExpressionBody,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpressionBody {
    /// `{$x}` or `{|literal|}`
    Operand(Operand),
    /// `{:fn}` or `{$x :fn}`
    Annotated {
        operand: Option<Operand>,
        function: FunctionRef,
    },
}

impl Expression {
    /// An unannotated operand expression.
    pub fn operand(operand: Operand) -> Self {
        Self {
            body: ExpressionBody::Operand(operand),
            attributes: Attributes::new(),
        }
    }

    /// An expression calling `function`, optionally on `operand`.
    pub fn annotated(operand: Option<Operand>, function: FunctionRef) -> Self {
        Self {
            body: ExpressionBody::Annotated { operand, function },
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn arg(&self) -> Option<&Operand> {
        match &self.body {
            ExpressionBody::Operand(operand) => Some(operand),
            ExpressionBody::Annotated { operand, .. } => operand.as_ref(),
        }
    }

    pub fn function(&self) -> Option<&FunctionRef> {
        match &self.body {
            ExpressionBody::Operand(_) => None,
            ExpressionBody::Annotated { function, .. } => Some(function),
        }
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(tag = "type", rename = "expression", rename_all = "camelCase")]
        struct Repr<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            arg: Option<&'a Operand>,
            #[serde(skip_serializing_if = "Option::is_none")]
            function_ref: Option<&'a FunctionRef>,
            #[serde(skip_serializing_if = "Option::is_none")]
            attributes: Option<&'a Attributes>,
        }
        Repr {
            arg: self.arg(),
            function_ref: self.function(),
            attributes: (!self.attributes.is_empty()).then_some(&self.attributes),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operand {
    Literal(Literal),
    Variable(VariableRef),
}

impl Operand {
    pub fn literal(value: impl Into<String>) -> Self {
        Operand::Literal(Literal::new(value))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Operand::Variable(VariableRef::new(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Literal {
    pub value: String,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VariableRef {
    pub name: String,
}

impl VariableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Function or markup options, keyed by name.
pub type Options = BTreeMap<String, Operand>;

/// Expression or markup attributes. A `None` value is a bare `@name`.
pub type Attributes = BTreeMap<String, Option<Literal>>;

/// `:name option=value ...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename = "function")]
pub struct FunctionRef {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: Options,
}

impl FunctionRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Options::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: Operand) -> Self {
        self.options.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupKind {
    /// `{#name}`
    Open,
    /// `{#name /}`
    Standalone,
    /// `{/name}`
    Close,
}

impl MarkupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkupKind::Open => "open",
            MarkupKind::Standalone => "standalone",
            MarkupKind::Close => "close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename = "markup")]
pub struct Markup {
    pub kind: MarkupKind,
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: Options,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

/// One branch of a select message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Variant {
    pub keys: Vec<VariantKey>,
    pub value: Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum VariantKey {
    #[serde(rename = "literal")]
    Literal(Literal),
    #[serde(rename = "*")]
    CatchAll,
}

impl VariantKey {
    pub fn literal(value: impl Into<String>) -> Self {
        VariantKey::Literal(Literal::new(value))
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, VariantKey::CatchAll)
    }
}
