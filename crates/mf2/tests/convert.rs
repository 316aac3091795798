//! Integration tests for CST to data model conversion.

use mf2::model::{NodePath, message_from_cst, message_from_cst_with_source_map};
use mf2::parser::SyntaxErrorKind;
use mf2::parser::cst::Span;
use mf2::{ParseOptions, parse_cst, parse_message};

fn convert_error(source: &str) -> SyntaxErrorKind {
    let cst = parse_cst(source, ParseOptions::default());
    match message_from_cst(&cst) {
        Ok(message) => panic!("{source:?} converted to {message:?}"),
        Err(error) => error.kind,
    }
}

// =============================================================================
// Agreement With the Strict Parser
// =============================================================================

#[test]
fn conversion_matches_strict_parse() {
    let sources = [
        "",
        "Hello {$name}!",
        "{{{|quoted| :string @attr}}}",
        ".local $x = {1 :number minimumFractionDigits=2}\n{{{$x}}}",
        ".input {$a :string}\n.input {$b :number}\n.match $a $b\nx 1 {{both}}\nx * {{a}}\n* * {{none}}",
        "{#link href=$url}click{/link}{#br /}",
    ];
    for source in sources {
        let cst = parse_cst(source, ParseOptions::default());
        let converted = message_from_cst(&cst).expect(source);
        let parsed = parse_message(source, ParseOptions::default()).expect(source);
        assert_eq!(converted, parsed, "{source}");
    }
}

// =============================================================================
// Conversion Errors
// =============================================================================

#[test]
fn duplicate_option_name_fails() {
    assert_eq!(convert_error("{:f a=1 a=2}"), SyntaxErrorKind::DuplicateOptionName);
}

#[test]
fn duplicate_attribute_fails() {
    assert_eq!(convert_error("{$x @a @a=1}"), SyntaxErrorKind::DuplicateAttribute);
}

#[test]
fn recorded_syntax_error_fails_first() {
    assert_eq!(convert_error("hello {$x #b}"), SyntaxErrorKind::ExtraContent);
}

#[test]
fn junk_declaration_fails() {
    let cst = parse_cst(".foo bar\n{{x}}", ParseOptions::default());
    assert!(message_from_cst(&cst).is_err());
}

// =============================================================================
// Source Map
// =============================================================================

#[test]
fn source_map_records_selectors_and_variants() {
    let source = ".input {$n :number}\n.match $n\none {{x}}";
    let cst = parse_cst(source, ParseOptions::default());
    let (_, map) = message_from_cst_with_source_map(&cst).unwrap();
    assert_eq!(map.get(NodePath::Selector(0)), Some(Span::new(27, 29)));
    assert_eq!(map.get(NodePath::Variant(0)), Some(Span::new(30, 39)));
    assert_eq!(map.get(NodePath::Declaration(0)).map(|span| span.start), Some(0));
    assert_eq!(map.get(NodePath::Variant(1)), None);
    assert_eq!(map.len(), 3);
}

#[test]
fn source_map_empty_for_simple_message() {
    let cst = parse_cst("plain {$x}", ParseOptions::default());
    let (_, map) = message_from_cst_with_source_map(&cst).unwrap();
    assert!(map.is_empty());
}
