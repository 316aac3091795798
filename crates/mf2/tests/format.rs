//! Integration tests for message formatting.

use std::collections::HashMap;

use mf2::types::NumberPartKind;
use mf2::{
    BidiIsolation, Direction, MessageError, MessageFormat, MessageFormatOptions, MessagePart,
    Value, args,
};

fn plain(source: &str) -> MessageFormat {
    let options = MessageFormatOptions::builder()
        .bidi_isolation(BidiIsolation::None)
        .build();
    MessageFormat::with_options(&["en"], source, options).unwrap()
}

fn format_collecting(mf: &MessageFormat, args: &HashMap<String, Value>) -> (String, Vec<MessageError>) {
    let mut errors = Vec::new();
    let text = mf.format_with(args, |error| errors.push(error));
    (text, errors)
}

fn error_kinds(errors: &[MessageError]) -> Vec<&'static str> {
    errors.iter().map(MessageError::kind).collect()
}

// =============================================================================
// Basic Formatting
// =============================================================================

#[test]
fn hello_world() {
    let mf = plain("Hello {$name}!");
    assert_eq!(mf.format(&args! { "name" => "World" }), "Hello World!");
}

#[test]
fn literal_placeholders() {
    let mf = plain("{|quoted text|} and {42}");
    assert_eq!(mf.format(&args! {}), "quoted text and 42");
}

#[test]
fn quoted_pattern_with_declarations() {
    let mf = plain(".local $greeting = {|Hi|}\n{{{$greeting}, {$name}.}}");
    assert_eq!(mf.format(&args! { "name" => "Ada" }), "Hi, Ada.");
}

#[test]
fn implicit_number_formatting() {
    let mf = plain("{$a} {$b}");
    assert_eq!(mf.format(&args! { "a" => 1234567, "b" => 2.5 }), "1,234,567 2.5");
}

#[test]
fn booleans_format_as_unknown_values() {
    let mf = plain("{$flag}");
    let (text, errors) = format_collecting(&mf, &args! { "flag" => true });
    assert_eq!(text, "true");
    assert!(errors.is_empty());
}

#[test]
fn declarations_shadow_arguments() {
    let mf = plain(".local $x = {|local|}\n{{{$x}}}");
    assert_eq!(mf.format(&args! { "x" => "argument" }), "local");
}

#[test]
fn dotted_names_index_into_maps() {
    let mf = plain("{$user.name}");
    let user = Value::Map([("name".to_string(), Value::from("Ada"))].into());
    assert_eq!(mf.format(&args! { "user" => user }), "Ada");
}

#[test]
fn argument_names_compare_normalized() {
    let mf = plain("{$\u{e9}}");
    assert_eq!(mf.format(&args! { "e\u{301}" => "ok" }), "ok");
}

// =============================================================================
// Errors and Fallbacks
// =============================================================================

#[test]
fn unresolved_variable_falls_back() {
    let mf = plain("Hi {$missing}");
    let (text, errors) = format_collecting(&mf, &args! {});
    assert_eq!(text, "Hi {$missing}");
    assert_eq!(error_kinds(&errors), vec!["unresolved-variable"]);
}

#[test]
fn unresolved_operand_is_not_passed_to_function() {
    let mf = plain("{$missing :number}");
    let (text, errors) = format_collecting(&mf, &args! {});
    assert_eq!(text, "{$missing}");
    assert_eq!(error_kinds(&errors), vec!["unresolved-variable"]);
}

#[test]
fn unknown_function_suggests_names() {
    let mf = plain("{$n :numbr}");
    let (text, errors) = format_collecting(&mf, &args! { "n" => 1 });
    assert_eq!(text, "{$n}");
    assert_eq!(error_kinds(&errors), vec!["unknown-function"]);
    insta::assert_snapshot!(
        errors[0].to_string(),
        @"unknown-function in $n: unknown function :numbr, did you mean :number?"
    );
}

#[test]
fn function_without_operand_falls_back_to_its_name() {
    let mf = plain("{:nope}");
    let (text, errors) = format_collecting(&mf, &args! {});
    assert_eq!(text, "{:nope}");
    assert_eq!(error_kinds(&errors), vec!["unknown-function"]);
}

#[test]
fn bad_operand_falls_back() {
    let mf = plain("{|abc| :number}");
    let (text, errors) = format_collecting(&mf, &args! {});
    assert_eq!(text, "{|abc|}");
    assert_eq!(error_kinds(&errors), vec!["bad-operand"]);
}

#[test]
fn maps_are_not_formattable() {
    let mf = plain("{$m}");
    let (text, errors) = format_collecting(&mf, &args! { "m" => Value::Map(Default::default()) });
    assert_eq!(text, "{$m}");
    assert_eq!(error_kinds(&errors), vec!["not-formattable"]);
}

#[test]
fn fallback_from_declaration_uses_reference_source() {
    let mf = plain(".local $x = {$missing}\n{{{$x}}}");
    let (text, errors) = format_collecting(&mf, &args! {});
    assert_eq!(text, "{$x}");
    assert_eq!(error_kinds(&errors), vec!["unresolved-variable"]);
}

#[test]
fn default_sink_does_not_panic() {
    let mf = plain("{$missing}");
    assert_eq!(mf.format(&args! {}), "{$missing}");
}

// =============================================================================
// Bidi Isolation
// =============================================================================

#[test]
fn strings_are_isolated_by_default() {
    let mf = MessageFormat::new(&["en"], "Hello {$name}!").unwrap();
    assert_eq!(
        mf.format(&args! { "name" => "World" }),
        "Hello \u{2068}World\u{2069}!"
    );
}

#[test]
fn ltr_numbers_in_ltr_message_are_not_isolated() {
    let mf = MessageFormat::new(&["en"], "{$n}").unwrap();
    assert_eq!(mf.format(&args! { "n" => 5 }), "5");
}

#[test]
fn rtl_message_isolates_ltr_values() {
    let mf = MessageFormat::new(&["ar"], "{$n :number u:locale=en}").unwrap();
    assert_eq!(mf.dir(), Direction::Rtl);
    assert_eq!(mf.format(&args! { "n" => 5 }), "\u{2066}5\u{2069}");
}

#[test]
fn explicit_value_direction() {
    let mf = MessageFormat::new(&["en"], "{|abc| :string u:dir=rtl}").unwrap();
    assert_eq!(mf.format(&args! {}), "\u{2067}abc\u{2069}");
}

#[test]
fn invalid_u_dir_is_reported() {
    let mf = plain("{|abc| :string u:dir=sideways}");
    let (text, errors) = format_collecting(&mf, &args! {});
    assert_eq!(text, "abc");
    assert_eq!(error_kinds(&errors), vec!["bad-option"]);
}

#[test]
fn invalid_u_locale_is_reported() {
    let mf = plain("{|x| :string u:locale=|not a tag|}");
    let (text, errors) = format_collecting(&mf, &args! {});
    assert_eq!(text, "x");
    assert_eq!(error_kinds(&errors), vec!["bad-option"]);
}

#[test]
fn fallbacks_are_isolated() {
    let mf = MessageFormat::new(&["en"], "{$missing}").unwrap();
    let (text, _) = format_collecting(&mf, &args! {});
    assert_eq!(text, "\u{2068}{$missing}\u{2069}");
}

// =============================================================================
// Parts
// =============================================================================

#[test]
fn parts_for_text_and_string() {
    let mf = plain("Hi {$name}");
    let parts = mf.format_to_parts(&args! { "name" => "Ada" });
    assert_eq!(
        parts,
        vec![
            MessagePart::text("Hi "),
            MessagePart::String {
                source: "$name".to_string(),
                locale: "en".to_string(),
                dir: None,
                id: None,
                value: "Ada".to_string(),
            },
        ]
    );
}

#[test]
fn markup_parts_carry_options_and_id() {
    let mf = plain("{#a href=$url u:id=link}x{/a}");
    let parts = mf.format_to_parts(&args! { "url" => "https://example.com" });
    assert_eq!(parts.len(), 3);
    let MessagePart::Markup {
        kind,
        name,
        id,
        options,
    } = &parts[0]
    else {
        panic!("expected markup, got {:?}", parts[0]);
    };
    assert_eq!(kind.as_str(), "open");
    assert_eq!(name, "a");
    assert_eq!(id.as_deref(), Some("link"));
    assert_eq!(options["href"], Value::from("https://example.com"));
    assert_eq!(parts[1], MessagePart::text("x"));
    assert!(matches!(&parts[2], MessagePart::Markup { kind, .. } if kind.as_str() == "close"));
}

#[test]
fn markup_contributes_no_text() {
    let mf = plain("{#b}bold{/b}{#br /}");
    assert_eq!(mf.format(&args! {}), "bold");
}

#[test]
fn u_dir_on_markup_is_a_bad_option() {
    let mf = plain("{#b u:dir=rtl}x{/b}");
    let mut errors = Vec::new();
    let parts = mf.format_to_parts_with(&args! {}, |error| errors.push(error));
    assert_eq!(parts.len(), 3);
    assert_eq!(error_kinds(&errors), vec!["bad-option"]);
}

#[test]
fn number_parts_with_id() {
    let mf = plain("{$n :number u:id=count}");
    let parts = mf.format_to_parts(&args! { "n" => -1234.5 });
    let [MessagePart::Number { id, parts, .. }] = parts.as_slice() else {
        panic!("expected one number part, got {parts:?}");
    };
    assert_eq!(id.as_deref(), Some("count"));
    let kinds: Vec<NumberPartKind> = parts.iter().map(|part| part.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NumberPartKind::MinusSign,
            NumberPartKind::Integer,
            NumberPartKind::Group,
            NumberPartKind::Integer,
            NumberPartKind::Decimal,
            NumberPartKind::Fraction,
        ]
    );
}

#[test]
fn isolated_parts() {
    let mf = MessageFormat::new(&["en"], "{$name}").unwrap();
    let parts = mf.format_to_parts(&args! { "name" => "x" });
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].type_name(), "bidiIsolation");
    assert_eq!(parts[1].type_name(), "string");
    assert_eq!(parts[2].to_text(), "\u{2069}");
}

#[test]
fn fallback_part() {
    let mf = plain("{$missing}");
    let mut errors = Vec::new();
    let parts = mf.format_to_parts_with(&args! {}, |error| errors.push(error));
    assert_eq!(parts, vec![MessagePart::fallback("$missing")]);
    assert_eq!(errors.len(), 1);
}

#[test]
fn parts_serialize_with_type_tags() {
    let mf = plain("a{$n}");
    let parts = mf.format_to_parts(&args! { "n" => 7 });
    let json = serde_json::to_value(&parts).unwrap();
    assert_eq!(json[0]["type"], "text");
    assert_eq!(json[1]["type"], "number");
    assert_eq!(json[1]["parts"][0]["type"], "integer");
    assert_eq!(json[1]["parts"][0]["value"], "7");
}

#[test]
fn parts_and_string_agree() {
    let mf = MessageFormat::new(&["en"], "{#b}{$n :number minimumFractionDigits=1}{/b} {$s}").unwrap();
    let args = args! { "n" => 3, "s" => "x" };
    let joined: String = mf.format_to_parts(&args).iter().map(MessagePart::to_text).collect();
    assert_eq!(joined, mf.format(&args));
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn syntax_error_fails_construction() {
    let Err(error) = MessageFormat::new(&["en"], "{:f a=1 a=2}") else {
        panic!("expected a syntax error");
    };
    assert_eq!(error.kind(), "duplicate-option-name");
    assert!(matches!(error, MessageError::Syntax(_)));
}

#[test]
fn locales_are_kept_in_order() {
    let mf = MessageFormat::new(&["fr-CA", "en"], "x").unwrap();
    let tags: Vec<String> = mf.locales().iter().map(ToString::to_string).collect();
    assert_eq!(tags, vec!["fr-CA", "en"]);
}

#[test]
fn formatter_is_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MessageFormat>();

    let mf = plain("{$n} items");
    std::thread::scope(|scope| {
        for n in 0..4 {
            let mf = &mf;
            scope.spawn(move || {
                assert_eq!(mf.format(&args! { "n" => n }), format!("{n} items"));
            });
        }
    });
}
