//! Integration tests for data model traversal.

use mf2::model::{
    Message, Node, OperandRef, ValueContext, ValuePosition, Visitor, visit,
};
use mf2::{ParseOptions, parse_message};

fn parse(source: &str) -> Message {
    parse_message(source, ParseOptions::default()).unwrap()
}

fn node_name(node: Node<'_>) -> &'static str {
    match node {
        Node::Declaration(_) => "declaration",
        Node::Expression(_) => "expression",
        Node::FunctionRef(_) => "function",
        Node::Markup(_) => "markup",
        Node::Value(_) => "value",
        Node::Variant(_) => "variant",
        Node::Key(_) => "key",
    }
}

/// Records node entries and counts exits through the generic callbacks.
#[derive(Default)]
struct Trace {
    entered: Vec<&'static str>,
    exited: usize,
}

impl<'m> Visitor<'m> for Trace {
    fn node(&mut self, node: Node<'m>) {
        self.entered.push(node_name(node));
    }

    fn exit_node(&mut self, _node: Node<'m>) {
        self.exited += 1;
    }
}

/// Collects every variable reference with where it appears.
#[derive(Default)]
struct Variables {
    seen: Vec<(String, ValueContext, ValuePosition)>,
}

impl<'m> Visitor<'m> for Variables {
    fn value(&mut self, value: OperandRef<'m>, context: ValueContext, position: ValuePosition) {
        if let OperandRef::Variable(var) = value {
            self.seen.push((var.name.clone(), context, position));
        }
    }
}

// =============================================================================
// Traversal Order
// =============================================================================

#[test]
fn visits_in_source_order() {
    let msg = parse(".input {$n :number}\n.match $n\none {{{$n}}}\n* {{x}}");
    let mut trace = Trace::default();
    visit(&msg, &mut trace);
    assert_eq!(
        trace.entered,
        vec![
            "declaration",
            "expression",
            "value",
            "function",
            "value",
            "variant",
            "key",
            "expression",
            "value",
            "variant",
            "key",
        ]
    );
    // declaration, two expressions, one function, two variants
    assert_eq!(trace.exited, 6);
}

#[test]
fn markup_is_visited_with_options() {
    let msg = parse("{#a href=$url}x{/a}");
    let mut trace = Trace::default();
    visit(&msg, &mut trace);
    assert_eq!(trace.entered, vec!["markup", "value", "markup"]);
    assert_eq!(trace.exited, 2);
}

// =============================================================================
// Value Positions
// =============================================================================

#[test]
fn value_context_and_position() {
    let msg = parse(".local $x = {$a :number digits=$d}\n.match $x\n* {{{$b @t=|v|}}}");
    let mut vars = Variables::default();
    visit(&msg, &mut vars);
    assert_eq!(
        vars.seen,
        vec![
            ("a".to_string(), ValueContext::Declaration, ValuePosition::Arg),
            ("d".to_string(), ValueContext::Declaration, ValuePosition::Option),
            ("x".to_string(), ValueContext::Selector, ValuePosition::Arg),
            ("b".to_string(), ValueContext::Placeholder, ValuePosition::Arg),
        ]
    );
}
