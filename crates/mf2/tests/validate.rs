//! Integration tests for data model validation.

use std::collections::BTreeSet;

use mf2::model::{
    DataModelError, DataModelErrorKind, Message, NodePath, Validation, validate, validate_with,
};
use mf2::{MessageFormat, ParseOptions, parse_message};

fn parse(source: &str) -> Message {
    parse_message(source, ParseOptions::default()).unwrap()
}

fn first_error(source: &str) -> DataModelError {
    validate(&parse(source)).unwrap_err()
}

fn all_errors(source: &str) -> Vec<DataModelError> {
    let mut errors = Vec::new();
    validate_with(&parse(source), |error| errors.push(error));
    errors
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

// =============================================================================
// Selection Rules
// =============================================================================

#[test]
fn missing_fallback() {
    let error = first_error(".input {$n :number}\n.match $n\none {{x}}");
    assert_eq!(
        error,
        DataModelError::new(DataModelErrorKind::MissingFallback, NodePath::Selector(0))
    );
    insta::assert_snapshot!(error.to_string(), @"missing-fallback at selector 0");
}

#[test]
fn missing_fallback_blocks_construction() {
    let Err(error) = MessageFormat::new(&["en"], ".input {$n :number}\n.match $n\none {{x}}")
    else {
        panic!("expected construction to fail");
    };
    assert_eq!(error.kind(), "missing-fallback");
}

#[test]
fn key_mismatch() {
    let source = ".input {$a :string}\n.input {$b :string}\n.match $a $b\nx {{1}}\n* * {{2}}";
    assert_eq!(
        first_error(source),
        DataModelError::new(DataModelErrorKind::KeyMismatch, NodePath::Variant(0))
    );
}

#[test]
fn duplicate_variant_after_normalization() {
    let source = ".input {$a :string}\n.match $a\n\u{e9} {{1}}\ne\u{301} {{2}}\n* {{3}}";
    assert_eq!(
        first_error(source),
        DataModelError::new(DataModelErrorKind::DuplicateVariant, NodePath::Variant(1))
    );
}

#[test]
fn selector_needs_annotation() {
    assert_eq!(
        first_error(".match $x\n* {{a}}"),
        DataModelError::new(
            DataModelErrorKind::MissingSelectorAnnotation,
            NodePath::Selector(0)
        )
    );
    assert_eq!(
        first_error(".local $x = {1}\n.match $x\n* {{a}}").kind,
        DataModelErrorKind::MissingSelectorAnnotation
    );
}

#[test]
fn annotation_flows_through_locals() {
    let source = ".input {$n :number}\n.local $m = {$n}\n.match $m\n* {{a}}";
    assert!(validate(&parse(source)).is_ok());
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn duplicate_declarations() {
    assert_eq!(
        first_error(".input {$x :number}\n.input {$x :string}\n{{}}"),
        DataModelError::new(
            DataModelErrorKind::DuplicateDeclaration,
            NodePath::Declaration(1)
        )
    );
    assert_eq!(
        first_error(".local $x = {$x}\n{{}}"),
        DataModelError::new(
            DataModelErrorKind::DuplicateDeclaration,
            NodePath::Declaration(0)
        )
    );
    assert_eq!(
        first_error(".local $a = {1}\n.input {$a :number}\n{{}}").node,
        NodePath::Declaration(1)
    );
}

#[test]
fn input_may_reference_itself() {
    assert!(validate(&parse(".input {$x :number}\n{{{$x}}}")).is_ok());
}

// =============================================================================
// Reporting Everything
// =============================================================================

#[test]
fn validate_with_reports_every_problem() {
    let source = ".input {$a :string}\n.input {$a :string}\n.match $a\nx {{1}}\nx {{2}}";
    let kinds: Vec<DataModelErrorKind> =
        all_errors(source).into_iter().map(|error| error.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DataModelErrorKind::DuplicateDeclaration,
            DataModelErrorKind::DuplicateVariant,
            DataModelErrorKind::MissingFallback,
        ]
    );
}

#[test]
fn validation_lists_functions_and_arguments() {
    let source = ".local $x = {$y :number}\n{{{$x} {$z :string fmt=$w} {#b}}}";
    let validation = validate(&parse(source)).unwrap();
    assert_eq!(
        validation,
        Validation {
            functions: set(&["number", "string"]),
            variables: set(&["w", "y", "z"]),
        }
    );
}
