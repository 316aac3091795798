//! Concrete syntax tree for MF2 messages.
//!
//! Every node records the byte range it was parsed from, and punctuation is
//! kept as [`Syntax`] tokens, so the tree mirrors the source closely enough to
//! be re-serialized and to point diagnostics at exact offsets. These types are
//! public to enable external tooling (linters, formatters, editors).

use serde::Serialize;

use super::error::SyntaxError;

/// A half-open byte range `start..end` into the message source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed message together with the syntax errors found while parsing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// A bare pattern with no declarations.
    Simple(SimpleMessage),
    /// Declarations followed by a quoted pattern.
    Complex(ComplexMessage),
    /// Declarations followed by a `.match` statement.
    Select(SelectMessage),
}

impl Message {
    pub fn declarations(&self) -> &[Declaration] {
        match self {
            Message::Simple(_) => &[],
            Message::Complex(msg) => &msg.declarations,
            Message::Select(msg) => &msg.declarations,
        }
    }

    /// Syntax errors collected while parsing, in source order of detection.
    pub fn errors(&self) -> &[SyntaxError] {
        match self {
            Message::Simple(msg) => &msg.errors,
            Message::Complex(msg) => &msg.errors,
            Message::Select(msg) => &msg.errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleMessage {
    pub pattern: Pattern,
    pub errors: Vec<SyntaxError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexMessage {
    pub declarations: Vec<Declaration>,
    pub pattern: Pattern,
    pub errors: Vec<SyntaxError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectMessage {
    pub declarations: Vec<Declaration>,
    /// The `.match` keyword.
    pub match_keyword: Syntax,
    pub selectors: Vec<VariableRef>,
    pub variants: Vec<Variant>,
    pub errors: Vec<SyntaxError>,
}

/// A literal piece of punctuation or a keyword, with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Syntax {
    pub span: Span,
    pub value: &'static str,
}

impl Syntax {
    pub fn new(start: usize, value: &'static str) -> Self {
        Self {
            span: Span::new(start, start + value.len()),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Declaration {
    Input(InputDeclaration),
    Local(LocalDeclaration),
    Junk(Junk),
}

impl Declaration {
    pub fn span(&self) -> Span {
        match self {
            Declaration::Input(decl) => decl.span,
            Declaration::Local(decl) => decl.span,
            Declaration::Junk(junk) => junk.span,
        }
    }
}

/// `.input {$var ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputDeclaration {
    pub span: Span,
    pub keyword: Syntax,
    pub value: DeclarationValue,
}

/// `.local $name = {...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalDeclaration {
    pub span: Span,
    pub keyword: Syntax,
    pub target: LocalTarget,
    pub equals: Option<Syntax>,
    pub value: DeclarationValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocalTarget {
    Variable(VariableRef),
    Junk(Junk),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeclarationValue {
    Expression(Expression),
    Junk(Junk),
}

impl DeclarationValue {
    pub fn span(&self) -> Span {
        match self {
            DeclarationValue::Expression(expr) => expr.span,
            DeclarationValue::Junk(junk) => junk.span,
        }
    }
}

/// A pattern: text and placeholders, optionally quoted with `{{ }}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub span: Span,
    pub quoted: bool,
    /// The `{{` and `}}` tokens of a quoted pattern, where present.
    pub braces: Vec<Syntax>,
    pub body: Vec<PatternElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PatternElement {
    Text(Text),
    Expression(Expression),
}

/// Literal text with escapes already decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub span: Span,
    pub value: String,
}

/// A `{...}` placeholder.
///
/// At most one of `function` and `markup` is set. A markup placeholder keeps
/// any operand that preceded the sigil so that the tree stays faithful to the
/// source, even though such an operand is an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub span: Span,
    /// The opening brace and, when present, the closing brace.
    pub braces: Vec<Syntax>,
    pub arg: Option<Operand>,
    pub annotation: Option<Annotation>,
    pub attributes: Vec<Attribute>,
}

impl Expression {
    pub fn markup(&self) -> Option<&Markup> {
        match &self.annotation {
            Some(Annotation::Markup(markup)) => Some(markup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Annotation {
    Function(FunctionRef),
    Markup(Markup),
    /// Unparseable content where an annotation was expected.
    Junk(Junk),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operand {
    Literal(Literal),
    Variable(VariableRef),
}

impl Operand {
    pub fn span(&self) -> Span {
        match self {
            Operand::Literal(lit) => lit.span,
            Operand::Variable(var) => var.span,
        }
    }
}

/// A quoted `|...|` or unquoted literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub span: Span,
    pub quoted: bool,
    pub open: Option<Syntax>,
    pub close: Option<Syntax>,
    pub value: String,
}

/// `$name`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableRef {
    pub span: Span,
    pub open: Syntax,
    pub name: String,
}

/// One segment of a name: either a name part or the `:` separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub span: Span,
    pub value: String,
}

/// `:name opt=val ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionRef {
    pub span: Span,
    pub sigil: Syntax,
    /// `[name]` or `[namespace, ":", name]`; other shapes are errors.
    pub name: Vec<Identifier>,
    pub options: Vec<NamedOption>,
}

/// `#name ...`, `#name ... /` or `/name ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Markup {
    pub span: Span,
    pub open: Syntax,
    pub name: Vec<Identifier>,
    pub options: Vec<NamedOption>,
    /// The trailing `/` of a standalone element.
    pub close: Option<Syntax>,
}

/// `name = value` inside a function or markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedOption {
    pub span: Span,
    pub name: Vec<Identifier>,
    pub equals: Option<Syntax>,
    pub value: Operand,
}

/// `@name` or `@name=literal`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub span: Span,
    pub open: Syntax,
    pub name: Vec<Identifier>,
    pub equals: Option<Syntax>,
    pub value: Option<Literal>,
}

/// One `keys {{pattern}}` branch of a select message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub span: Span,
    pub keys: Vec<Key>,
    pub value: Pattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Key {
    Literal(Literal),
    /// The `*` key.
    CatchAll(CatchAllKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatchAllKey {
    pub span: Span,
}

/// Source text that could not be parsed, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Junk {
    pub span: Span,
    pub source: String,
}
