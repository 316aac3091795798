//! Property tests over generated messages.

use std::collections::BTreeSet;

use mf2::model::{DataModelErrorKind, message_from_cst, validate_with};
use mf2::parser::{stringify_cst, stringify_cst_with};
use mf2::{
    BidiIsolation, MessageFormat, MessageFormatOptions, MessagePart, ParseOptions, args,
    parse_cst, parse_message, stringify_message, stringify_message_with, validate,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn text() -> impl Strategy<Value = String> {
    "[a-z ,!]{1,8}"
}

/// `a` and `b` are always passed as arguments; `c` never is.
fn variable() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("a"), Just("b"), Just("c")]
}

fn placeholder() -> impl Strategy<Value = String> {
    prop_oneof![
        variable().prop_map(|name| format!("{{${name}}}")),
        "[a-z ]{0,5}".prop_map(|lit| format!("{{|{lit}|}}")),
        variable().prop_map(|name| format!("{{${name} :string}}")),
        variable().prop_map(|name| format!("{{${name} :number minimumFractionDigits=1}}")),
        "[a-z]{1,4}".prop_map(|name| format!("{{#{name}}}")),
        "[a-z]{1,4}".prop_map(|name| format!("{{/{name}}}")),
        Just("{:unknown}".to_string()),
    ]
}

/// A well-formed simple message: text and placeholders.
fn pattern() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![text(), placeholder()], 0..6)
        .prop_map(|parts| parts.concat())
}

/// A well-formed select message over one string selector, with its keys.
///
/// The variant for key `k` formats to text starting with `k: `.
fn keyed_select_message() -> impl Strategy<Value = (BTreeSet<String>, String)> {
    (
        prop::collection::btree_set("[a-e]", 0..4),
        pattern(),
        pattern(),
    )
        .prop_map(|(keys, body, fallback)| {
            let mut source = ".input {$s :string}\n.match $s\n".to_string();
            for key in &keys {
                source.push_str(&format!("{key} {{{{{key}: {body}}}}}\n"));
            }
            source.push_str(&format!("* {{{{{fallback}}}}}"));
            (keys, source)
        })
}

fn select_message() -> impl Strategy<Value = String> {
    keyed_select_message().prop_map(|(_, source)| source)
}

fn message() -> impl Strategy<Value = String> {
    prop_oneof![pattern(), select_message()]
}

/// Text for resource mode, with line breaks followed by indentation.
fn resource_message() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof!["[a-z]{1,4}", "\n[ \t]{0,3}", "\\\\[nt]", placeholder()], 1..6)
        .prop_map(|parts| parts.concat())
}

fn formatter(source: &str) -> MessageFormat {
    let options = MessageFormatOptions::builder()
        .bidi_isolation(BidiIsolation::None)
        .build();
    MessageFormat::with_options(&["en"], source, options).unwrap()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn stringified_message_parses_back(source in message()) {
        let parsed = parse_message(&source, ParseOptions::default()).unwrap();
        let again = parse_message(&stringify_message(&parsed), ParseOptions::default()).unwrap();
        prop_assert_eq!(again, parsed);
    }

    #[test]
    fn both_parsers_agree_on_valid_input(source in message()) {
        let strict = parse_message(&source, ParseOptions::default()).unwrap();
        let cst = parse_cst(&source, ParseOptions::default());
        prop_assert!(cst.errors().is_empty());
        prop_assert_eq!(message_from_cst(&cst).unwrap(), strict);
    }

    #[test]
    fn cst_parser_accepts_anything(source in "[a-c{}|$:#/@=. \\\\\n]{0,24}") {
        let cst = parse_cst(&source, ParseOptions::default());
        let _ = stringify_cst(&cst);
        for error in cst.errors() {
            prop_assert!(error.span.start <= source.len());
        }
    }

    #[test]
    fn formatting_never_fails(source in message(), s in "[a-f]", a in 0i64..2000) {
        let mf = formatter(&source);
        let args = args! { "s" => s, "a" => a, "b" => "12" };
        let mut errors = 0;
        let text = mf.format_with(&args, |_| errors += 1);
        let parts: String = mf
            .format_to_parts_with(&args, |_| {})
            .iter()
            .map(MessagePart::to_text)
            .collect();
        prop_assert_eq!(text, parts);
        if !source.contains(":unknown") && !source.contains("$c") {
            prop_assert_eq!(errors, 0);
        }
    }

    #[test]
    fn each_error_has_one_fallback(source in message(), s in "[a-f]") {
        let mf = formatter(&source);
        let args = args! { "s" => s, "a" => 7, "b" => "12" };
        let mut errors = 0;
        let parts = mf.format_to_parts_with(&args, |_| errors += 1);
        let fallbacks = parts
            .iter()
            .filter(|part| matches!(part, MessagePart::Fallback { .. }))
            .count();
        prop_assert_eq!(errors, fallbacks);

        let text = mf.format_with(&args, |_| {});
        let tokens = text.matches("{$c}").count() + text.matches("{:unknown}").count();
        prop_assert_eq!(errors, tokens);
    }

    #[test]
    fn selection_picks_exactly_one_variant(
        (keys, source) in keyed_select_message(),
        s in "[a-f]",
    ) {
        let mf = formatter(&source);
        let args = args! { "s" => s.clone(), "a" => 1, "b" => 2 };
        let mut kinds = Vec::new();
        let text = mf.format_with(&args, |error| kinds.push(error.kind()));
        prop_assert!(!kinds.contains(&"no-match"));
        prop_assert!(!kinds.contains(&"bad-selector"));
        prop_assert_eq!(text.starts_with(&format!("{s}: ")), keys.contains(&s));
        prop_assert_eq!(mf.format_with(&args, |_| {}), text);
    }

    #[test]
    fn resource_messages_round_trip(source in resource_message()) {
        let resource = ParseOptions { resource: true };
        let parsed = parse_message(&source, resource).unwrap();
        let again = parse_message(&stringify_message_with(&parsed, resource), resource).unwrap();
        prop_assert_eq!(again, parsed.clone());

        let cst = parse_cst(&source, resource);
        let reparsed = parse_cst(&stringify_cst_with(&cst, resource), resource);
        prop_assert!(reparsed.errors().is_empty());
        prop_assert_eq!(message_from_cst(&reparsed).unwrap(), parsed);
    }

    #[test]
    fn validator_flags_fallback_and_arity(
        variants in prop::collection::vec(prop::collection::vec("[a-c*]", 1..4), 1..5),
        selectors in 1usize..4,
    ) {
        let mut source = String::new();
        for i in 0..selectors {
            source.push_str(&format!(".input {{$v{i} :string}}\n"));
        }
        source.push_str(".match");
        for i in 0..selectors {
            source.push_str(&format!(" $v{i}"));
        }
        for keys in &variants {
            source.push_str(&format!("\n{} {{{{x}}}}", keys.join(" ")));
        }
        let message = parse_message(&source, ParseOptions::default()).unwrap();
        let mut kinds = Vec::new();
        validate_with(&message, |error| kinds.push(error.kind));

        let has_fallback = variants.iter().any(|keys| keys.iter().all(|key| key == "*"));
        let mismatched = variants.iter().any(|keys| keys.len() != selectors);
        prop_assert_eq!(kinds.contains(&DataModelErrorKind::MissingFallback), !has_fallback);
        prop_assert_eq!(kinds.contains(&DataModelErrorKind::KeyMismatch), mismatched);
    }

    #[test]
    fn validate_reports_first_collected_error(
        keys in prop::collection::vec("[a-c*]", 1..4),
        selectors in 1usize..3,
    ) {
        let mut source = String::new();
        for i in 0..selectors {
            source.push_str(&format!(".input {{$v{i} :string}}\n"));
        }
        source.push_str(".match");
        for i in 0..selectors {
            source.push_str(&format!(" $v{i}"));
        }
        for key in &keys {
            source.push_str(&format!("\n{key} {{{{x}}}}"));
        }
        let message = parse_message(&source, ParseOptions::default()).unwrap();
        let mut collected = Vec::new();
        validate_with(&message, |error| collected.push(error));
        match validate(&message) {
            Ok(_) => prop_assert!(collected.is_empty()),
            Err(error) => prop_assert_eq!(Some(&error), collected.first()),
        }
    }
}
