//! Integration tests for the recovering CST parser.

use mf2::model::message_from_cst;
use mf2::parser::cst::{Annotation, Declaration, Key, Message, Operand, PatternElement, Span};
use mf2::parser::{SyntaxErrorKind, stringify_cst, stringify_cst_with};
use mf2::{ParseOptions, parse_cst};

fn parse(source: &str) -> Message {
    parse_cst(source, ParseOptions::default())
}

fn kinds(message: &Message) -> Vec<SyntaxErrorKind> {
    message.errors().iter().map(|error| error.kind).collect()
}

fn simple_body(message: &Message) -> &[PatternElement] {
    match message {
        Message::Simple(simple) => &simple.pattern.body,
        other => panic!("expected a simple message, got {other:?}"),
    }
}

// =============================================================================
// Message Shapes
// =============================================================================

#[test]
fn plain_text_is_simple() {
    let msg = parse("Hello, world!");
    assert!(msg.errors().is_empty());
    let [PatternElement::Text(text)] = simple_body(&msg) else {
        panic!("expected one text element");
    };
    assert_eq!(text.value, "Hello, world!");
    assert_eq!(text.span, Span::new(0, 13));
}

#[test]
fn quoted_pattern_is_complex() {
    let msg = parse("{{.dot}}");
    assert!(msg.errors().is_empty());
    let Message::Complex(complex) = &msg else {
        panic!("expected a complex message");
    };
    assert!(complex.declarations.is_empty());
    assert!(complex.pattern.quoted);
}

#[test]
fn declarations_then_match() {
    let msg = parse(".input {$n :number}\n.local $m = {$n}\n.match $n\none {{1}}\n* {{n}}");
    assert!(msg.errors().is_empty(), "{:?}", msg.errors());
    assert!(matches!(msg.declarations()[0], Declaration::Input(_)));
    assert!(matches!(msg.declarations()[1], Declaration::Local(_)));
    let Message::Select(select) = &msg else {
        panic!("expected a select message");
    };
    assert_eq!(select.selectors.len(), 1);
    assert_eq!(select.selectors[0].name, "n");
    assert_eq!(select.variants.len(), 2);
    assert!(matches!(select.variants[1].keys[0], Key::CatchAll(_)));
}

// =============================================================================
// Markup
// =============================================================================

#[test]
fn balanced_markup_parses_cleanly() {
    let msg = parse("{#b}x{/b}");
    assert!(msg.errors().is_empty());
    let body = simple_body(&msg);
    assert_eq!(body.len(), 3);
    let PatternElement::Expression(open) = &body[0] else {
        panic!("expected markup expression");
    };
    let markup = open.markup().expect("open markup");
    assert_eq!(markup.open.value, "#");
    assert!(markup.close.is_none());
    let PatternElement::Expression(close) = &body[2] else {
        panic!("expected markup expression");
    };
    assert_eq!(close.markup().expect("close markup").open.value, "/");
}

#[test]
fn standalone_markup_records_slash() {
    let msg = parse("{#img src=|a.png| /}");
    assert!(msg.errors().is_empty());
    let PatternElement::Expression(expr) = &simple_body(&msg)[0] else {
        panic!("expected expression");
    };
    let markup = expr.markup().expect("markup");
    assert!(markup.close.is_some());
    assert_eq!(markup.options.len(), 1);
}

#[test]
fn operand_before_markup_is_extra_content() {
    let msg = parse("{$x #b}");
    assert_eq!(kinds(&msg), vec![SyntaxErrorKind::ExtraContent]);
    assert_eq!(msg.errors()[0].span, Span::new(1, 3));

    let PatternElement::Expression(expr) = &simple_body(&msg)[0] else {
        panic!("expected expression");
    };
    assert!(matches!(&expr.arg, Some(Operand::Variable(var)) if var.name == "x"));
    assert!(matches!(expr.annotation, Some(Annotation::Markup(_))));
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn unclosed_placeholder_keeps_prefix_text() {
    let msg = parse("hi {$x");
    assert!(!msg.errors().is_empty());
    assert!(kinds(&msg).iter().all(|&kind| kind == SyntaxErrorKind::MissingSyntax));
    assert_eq!(msg.errors().last().map(|error| error.expected.as_deref()), Some(Some("}")));
    let body = simple_body(&msg);
    assert!(matches!(&body[0], PatternElement::Text(text) if text.value == "hi "));
    assert!(matches!(body[1], PatternElement::Expression(_)));
}

#[test]
fn bad_escape_is_reported_and_text_kept() {
    let msg = parse("a \\q b");
    assert_eq!(kinds(&msg), vec![SyntaxErrorKind::BadEscape]);
    assert_eq!(simple_body(&msg).len(), 1);
}

#[test]
fn errors_stop_conversion() {
    let msg = parse("{:f a=1 a=2}");
    let Err(error) = message_from_cst(&msg) else {
        panic!("expected conversion to fail");
    };
    assert_eq!(error.kind, SyntaxErrorKind::DuplicateOptionName);
}

// =============================================================================
// Resource Mode
// =============================================================================

#[test]
fn resource_mode_drops_indentation() {
    let msg = parse_cst("a\n    b", ParseOptions { resource: true });
    let [PatternElement::Text(text)] = simple_body(&msg) else {
        panic!("expected one text element");
    };
    assert_eq!(text.value, "a\nb");
}

#[test]
fn default_mode_keeps_indentation() {
    let msg = parse("a\n    b");
    let [PatternElement::Text(text)] = simple_body(&msg) else {
        panic!("expected one text element");
    };
    assert_eq!(text.value, "a\n    b");
}

#[test]
fn resource_mode_round_trips_escaped_indentation() {
    let resource = ParseOptions { resource: true };
    let msg = parse_cst("a\\n    b\\tc\n  d", resource);
    let [PatternElement::Text(text)] = simple_body(&msg) else {
        panic!("expected one text element");
    };
    assert_eq!(text.value, "a\n    b\tc\nd");

    let source = stringify_cst_with(&msg, resource);
    let again = parse_cst(&source, resource);
    assert!(again.errors().is_empty(), "{source:?}");
    assert_eq!(message_from_cst(&again).unwrap(), message_from_cst(&msg).unwrap());
}

// =============================================================================
// Stringification
// =============================================================================

#[test]
fn stringified_cst_converts_to_same_model() {
    let sources = [
        "Hello {$name}!",
        "{{.not a declaration}}",
        ".local $x = {|a b| :string}\n{{{$x}}}",
        ".input {$n :number}\n.match $n\n1 {{one}}\n* {{other}}",
        "{#b @track}bold{/b}",
    ];
    for source in sources {
        let cst = parse(source);
        let expected = message_from_cst(&cst).expect(source);
        let again = parse(&stringify_cst(&cst));
        assert!(again.errors().is_empty(), "{source}: {:?}", again.errors());
        assert_eq!(message_from_cst(&again).expect(source), expected, "{source}");
    }
}
