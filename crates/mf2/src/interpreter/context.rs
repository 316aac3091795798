//! Per-call resolution state.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use icu_locale_core::Locale;
use unicode_normalization::UnicodeNormalization;

use crate::interpreter::{FunctionRegistry, LocaleMatcher, MessageError, ResolutionError};
use crate::model::Declaration;
use crate::types::{FunctionInput, MessageValue, Value};

/// Resolution state of one declaration.
#[derive(Debug, Clone)]
enum DeclarationState {
    Unresolved,
    Resolving,
    Resolved(Rc<dyn MessageValue>),
}

/// State carried through the resolution of one `format` call.
///
/// The context tracks:
/// - Caller arguments and the message's declarations, which together form
///   the variable scope
/// - Which declarations have been resolved, so each is resolved at most once
/// - Formatter settings shared by every function call
/// - The error sink
pub(crate) struct Context<'a> {
    args: &'a HashMap<String, Value>,
    declarations: &'a [Declaration],
    /// Declaration index by declared name.
    names: HashMap<&'a str, usize>,
    states: Vec<DeclarationState>,
    /// Set while resolving an `.input` declaration, whose expression sees
    /// only the caller arguments.
    args_only: bool,
    pub(crate) locales: &'a [Locale],
    pub(crate) locale_matcher: LocaleMatcher,
    pub(crate) functions: &'a FunctionRegistry,
    on_error: &'a mut dyn FnMut(MessageError),
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        args: &'a HashMap<String, Value>,
        declarations: &'a [Declaration],
        locales: &'a [Locale],
        locale_matcher: LocaleMatcher,
        functions: &'a FunctionRegistry,
        on_error: &'a mut dyn FnMut(MessageError),
    ) -> Self {
        let mut names = HashMap::new();
        for (i, declaration) in declarations.iter().enumerate() {
            names.entry(declaration.name()).or_insert(i);
        }
        Self {
            args,
            declarations,
            names,
            states: vec![DeclarationState::Unresolved; declarations.len()],
            args_only: false,
            locales,
            locale_matcher,
            functions,
            on_error,
        }
    }

    /// Report an error to the caller's sink.
    pub(crate) fn report(&mut self, error: impl Into<MessageError>) {
        (self.on_error)(error.into());
    }

    /// Look up a variable by name.
    ///
    /// Declarations shadow arguments. A declaration is resolved on first
    /// lookup and its value reused afterwards. A dotted name such as
    /// `user.name` that is not itself in scope is looked up as a path: the
    /// longest prefix in scope is the head, and the rest indexes into it.
    /// Argument names are finally compared after NFC normalization.
    ///
    /// Returns `None` when nothing matches; the caller reports
    /// `unresolved-variable`.
    pub(crate) fn lookup(&mut self, name: &str) -> Option<FunctionInput> {
        if let Some(found) = self.lookup_exact(name) {
            return Some(found);
        }
        let mut end = name.len();
        while let Some(dot) = name[..end].rfind('.') {
            if let Some(head) = self.lookup_exact(&name[..dot]) {
                return match head {
                    FunctionInput::Value(Value::Map(map)) => {
                        lookup_path(&map, &name[dot + 1..]).map(FunctionInput::Value)
                    }
                    FunctionInput::Value(_) | FunctionInput::Message(_) => None,
                };
            }
            end = dot;
        }
        self.args
            .iter()
            .find(|(key, _)| key.nfc().eq(name.chars()))
            .map(|(_, value)| FunctionInput::Value(value.clone()))
    }

    fn lookup_exact(&mut self, name: &str) -> Option<FunctionInput> {
        if !self.args_only {
            if let Some(&index) = self.names.get(name) {
                return self.resolve_declaration(index).map(FunctionInput::Message);
            }
        }
        self.args.get(name).cloned().map(FunctionInput::Value)
    }

    fn resolve_declaration(&mut self, index: usize) -> Option<Rc<dyn MessageValue>> {
        match &self.states[index] {
            DeclarationState::Resolved(value) => return Some(Rc::clone(value)),
            DeclarationState::Resolving => return None,
            DeclarationState::Unresolved => {}
        }
        self.states[index] = DeclarationState::Resolving;
        let declarations = self.declarations;
        let declaration = &declarations[index];
        let outer = self.args_only;
        self.args_only = matches!(declaration, Declaration::Input { .. });
        let value = self.resolve_expression(declaration.value());
        self.args_only = outer;
        self.states[index] = DeclarationState::Resolved(Rc::clone(&value));
        Some(value)
    }

    pub(crate) fn unresolved(&mut self, name: &str) {
        self.report(ResolutionError::unresolved_variable(name));
    }
}

/// Look up a dotted `path` in nested argument maps.
fn lookup_path(map: &BTreeMap<String, Value>, path: &str) -> Option<Value> {
    if let Some(value) = map.get(path) {
        return Some(value.clone());
    }
    let mut end = path.len();
    while let Some(dot) = path[..end].rfind('.') {
        if let Some(head) = map.get(&path[..dot]) {
            return match head {
                Value::Map(inner) => lookup_path(inner, &path[dot + 1..]),
                _ => None,
            };
        }
        end = dot;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn path_walks_nested_maps() {
        let inner = map(&[("c", Value::from(1))]);
        let outer = map(&[("b", Value::Map(inner))]);
        assert_eq!(lookup_path(&outer, "b.c"), Some(Value::from(1)));
        assert_eq!(lookup_path(&outer, "b.d"), None);
    }

    #[test]
    fn path_prefers_longest_dotted_key() {
        let outer = map(&[
            ("b.c", Value::Map(map(&[("d", Value::from("long"))]))),
            ("b", Value::Map(map(&[("c.d", Value::from("short"))]))),
        ]);
        assert_eq!(lookup_path(&outer, "b.c.d"), Some(Value::from("long")));
    }

    #[test]
    fn scalar_head_ends_the_path() {
        let outer = map(&[("a", Value::from(3))]);
        assert_eq!(lookup_path(&outer, "a.b"), None);
    }
}
