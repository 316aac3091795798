//! Function registry and the per-call context functions receive.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::mem;
use std::sync::Arc;

use icu_locale_core::Locale;

use crate::interpreter::{LocaleMatcher, ResolutionError};
use crate::types::{Direction, FunctionInput, MessageValue};

/// Resolved options passed to a function, without the reserved `u:` options.
pub type FunctionOptions = BTreeMap<String, FunctionInput>;

/// What a function call produces.
pub type FunctionResult = Result<Box<dyn MessageValue>, ResolutionError>;

/// A function callable from a message as `:name`.
///
/// Any `Fn(&mut FunctionContext, &FunctionOptions, Option<&FunctionInput>)
/// -> FunctionResult` closure is a message function. Functions are shared
/// by every formatter built from a registry, so they must be thread-safe.
pub trait MessageFunction: Send + Sync {
    /// Resolves `operand` with `options`.
    ///
    /// Returning an error makes the expression format as a fallback. Non-fatal
    /// problems, like an ignored invalid option, go to
    /// [`FunctionContext::report`].
    fn call(
        &self,
        ctx: &mut FunctionContext,
        options: &FunctionOptions,
        operand: Option<&FunctionInput>,
    ) -> FunctionResult;
}

impl<F> MessageFunction for F
where
    F: Fn(&mut FunctionContext, &FunctionOptions, Option<&FunctionInput>) -> FunctionResult
        + Send
        + Sync,
{
    fn call(
        &self,
        ctx: &mut FunctionContext,
        options: &FunctionOptions,
        operand: Option<&FunctionInput>,
    ) -> FunctionResult {
        self(ctx, options, operand)
    }
}

/// A name to function mapping.
///
/// Registries passed to a formatter are merged over the default functions,
/// so a custom `number` replaces the built-in one.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn MessageFunction>>,
}

impl FunctionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn MessageFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered function names, in order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.functions.keys()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Register `function` as `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, function: impl MessageFunction + 'static) {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Register a closure as `name`.
    ///
    /// Equivalent to [`insert`](Self::insert), but the closure's argument
    /// types are inferred.
    pub fn insert_fn<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&mut FunctionContext, &FunctionOptions, Option<&FunctionInput>) -> FunctionResult
            + Send
            + Sync
            + 'static,
    {
        self.insert(name, function);
    }

    /// Copy every function of `other` into this registry, replacing
    /// functions of the same name.
    pub fn extend(&mut self, other: &FunctionRegistry) {
        for (name, function) in &other.functions {
            self.functions.insert(name.clone(), Arc::clone(function));
        }
    }
}

impl Debug for FunctionRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

/// Context for one function call.
///
/// Built by the resolver for each annotated expression, after the reserved
/// `u:dir`, `u:id` and `u:locale` options are applied.
#[derive(Debug, Clone)]
pub struct FunctionContext {
    source: String,
    locales: Vec<Locale>,
    locale_matcher: LocaleMatcher,
    dir: Option<Direction>,
    id: Option<String>,
    literal_option_keys: BTreeSet<String>,
    errors: Vec<ResolutionError>,
}

impl FunctionContext {
    pub fn new(
        source: impl Into<String>,
        locales: Vec<Locale>,
        locale_matcher: LocaleMatcher,
    ) -> Self {
        Self {
            source: source.into(),
            locales,
            locale_matcher,
            dir: None,
            id: None,
            literal_option_keys: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    /// Label of the expression being resolved, e.g. `$count` or `|1|`.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Locales to format for, most preferred first. Never empty.
    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    /// The most preferred locale.
    pub fn locale(&self) -> Locale {
        self.locales.first().cloned().unwrap_or(Locale::UNKNOWN)
    }

    pub fn locale_matcher(&self) -> LocaleMatcher {
        self.locale_matcher
    }

    /// Direction set with `u:dir`, if any.
    pub fn dir(&self) -> Option<Direction> {
        self.dir
    }

    /// Identifier set with `u:id`, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether option `name` was given as a literal rather than a variable.
    pub fn is_literal_option(&self, name: &str) -> bool {
        self.literal_option_keys.contains(name)
    }

    pub fn literal_option_keys(&self) -> &BTreeSet<String> {
        &self.literal_option_keys
    }

    /// Report a problem that does not stop the function from returning a value.
    pub fn report(&mut self, error: ResolutionError) {
        self.errors.push(error);
    }

    pub(crate) fn set_locales(&mut self, locales: Vec<Locale>) {
        if !locales.is_empty() {
            self.locales = locales;
        }
    }

    pub(crate) fn set_dir(&mut self, dir: Option<Direction>) {
        self.dir = dir;
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    pub(crate) fn add_literal_option(&mut self, name: &str) {
        self.literal_option_keys.insert(name.to_string());
    }

    pub(crate) fn take_errors(&mut self) -> Vec<ResolutionError> {
        mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FallbackValue;

    fn echo(
        ctx: &mut FunctionContext,
        _: &FunctionOptions,
        _: Option<&FunctionInput>,
    ) -> FunctionResult {
        Ok(Box::new(FallbackValue::new(ctx.source())))
    }

    #[test]
    fn extend_replaces_same_name() {
        let mut base = FunctionRegistry::new();
        base.insert("a", echo);
        base.insert("b", echo);
        let mut other = FunctionRegistry::new();
        other.insert_fn("b", |_, _, _| {
            Err(ResolutionError::bad_operand("always fails", "|x|"))
        });
        base.extend(&other);
        assert_eq!(base.len(), 2);

        let mut ctx =
            FunctionContext::new("|x|", vec![Locale::UNKNOWN], LocaleMatcher::BestFit);
        let Some(b) = base.get("b") else {
            panic!("b is registered");
        };
        assert!(b.call(&mut ctx, &FunctionOptions::new(), None).is_err());
    }

    #[test]
    fn debug_lists_names() {
        let mut registry = FunctionRegistry::new();
        registry.insert("number", echo);
        registry.insert("string", echo);
        assert_eq!(format!("{registry:?}"), r#"{"number", "string"}"#);
    }

    #[test]
    fn reported_errors_are_taken_once() {
        let mut ctx =
            FunctionContext::new("$x", vec![Locale::UNKNOWN], LocaleMatcher::Lookup);
        ctx.report(ResolutionError::bad_option("bad", "$x"));
        assert_eq!(ctx.take_errors().len(), 1);
        assert!(ctx.take_errors().is_empty());
    }
}
