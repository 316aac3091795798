//! Semantic validation of data model messages.

use std::collections::{BTreeSet, HashSet};

use unicode_normalization::UnicodeNormalization;

use super::visit::{self, OperandRef, ValueContext, ValuePosition, Visitor};
use super::{
    DataModelError, DataModelErrorKind, Declaration, Expression, Message, NodePath, Operand,
    Variant, VariantKey,
};

/// Names referenced by a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// Every function name used in an expression.
    pub functions: BTreeSet<String>,
    /// Every variable referenced but not declared with `.local`, i.e. the
    /// arguments the message expects.
    pub variables: BTreeSet<String>,
}

/// Validates `message`, failing on the first problem.
pub fn validate(message: &Message) -> Result<Validation, DataModelError> {
    let mut first = None;
    let validation = validate_with(message, |error| {
        first.get_or_insert(error);
    });
    match first {
        Some(error) => Err(error),
        None => Ok(validation),
    }
}

/// Validates `message`, reporting every problem to `on_error`.
///
/// Checks that selectors are annotated, that names are declared once and
/// before use, and that variants have the right number of keys, are unique,
/// and include a fallback.
pub fn validate_with(message: &Message, on_error: impl FnMut(DataModelError)) -> Validation {
    let mut validator = Validator {
        on_error,
        annotated: HashSet::new(),
        declared: HashSet::new(),
        local_vars: BTreeSet::new(),
        functions: BTreeSet::new(),
        variables: BTreeSet::new(),
        seen_variants: HashSet::new(),
        selector_count: 0,
        missing_fallback: None,
        arg_is_declared: true,
        declaration_index: 0,
        variant_index: 0,
    };
    visit::visit(message, &mut validator);

    if let Some(selector) = validator.missing_fallback {
        validator.report(DataModelErrorKind::MissingFallback, NodePath::Selector(selector));
    }
    let Validator {
        functions,
        mut variables,
        local_vars,
        ..
    } = validator;
    variables.retain(|name| !local_vars.contains(name));
    Validation {
        functions,
        variables,
    }
}

struct Validator<F> {
    on_error: F,
    /// Variables bound directly or transitively to a function annotation.
    annotated: HashSet<String>,
    declared: HashSet<String>,
    local_vars: BTreeSet<String>,
    functions: BTreeSet<String>,
    variables: BTreeSet<String>,
    /// Key tuples of earlier variants; `None` stands for `*`.
    seen_variants: HashSet<Vec<Option<String>>>,
    selector_count: usize,
    /// Index of the last selector while no all-catch-all variant has been seen.
    missing_fallback: Option<usize>,
    /// Whether the current declaration's own operand counts as a use.
    arg_is_declared: bool,
    declaration_index: usize,
    variant_index: usize,
}

impl<F: FnMut(DataModelError)> Validator<F> {
    fn report(&mut self, kind: DataModelErrorKind, node: NodePath) {
        (self.on_error)(DataModelError::new(kind, node));
    }
}

impl<'m, F: FnMut(DataModelError)> Visitor<'m> for Validator<F> {
    fn declaration(&mut self, declaration: &'m Declaration) {
        let value = declaration.value();
        let annotated = value.function().is_some()
            || match (declaration, value.arg()) {
                (Declaration::Local { .. }, Some(Operand::Variable(var))) => {
                    self.annotated.contains(&var.name)
                }
                _ => false,
            };
        if annotated {
            self.annotated.insert(declaration.name().to_string());
        }
        let is_local = matches!(declaration, Declaration::Local { .. });
        if is_local {
            self.local_vars.insert(declaration.name().to_string());
        }
        self.arg_is_declared = is_local;
    }

    fn exit_declaration(&mut self, declaration: &'m Declaration) {
        let path = NodePath::Declaration(self.declaration_index);
        self.declaration_index += 1;
        if !self.declared.insert(declaration.name().to_string()) {
            self.report(DataModelErrorKind::DuplicateDeclaration, path);
        }
    }

    fn expression(&mut self, expression: &'m Expression, _context: ValueContext) {
        if let Some(function) = expression.function() {
            self.functions.insert(function.name.clone());
        }
    }

    fn value(&mut self, value: OperandRef<'m>, context: ValueContext, position: ValuePosition) {
        let OperandRef::Variable(var) = value else {
            return;
        };
        self.variables.insert(var.name.clone());
        match context {
            ValueContext::Declaration => {
                if position != ValuePosition::Arg || self.arg_is_declared {
                    self.declared.insert(var.name.clone());
                }
            }
            ValueContext::Selector => {
                let index = self.selector_count;
                self.selector_count += 1;
                self.missing_fallback = Some(index);
                if !self.annotated.contains(&var.name) {
                    self.report(
                        DataModelErrorKind::MissingSelectorAnnotation,
                        NodePath::Selector(index),
                    );
                }
            }
            ValueContext::Placeholder => {}
        }
    }

    fn variant(&mut self, variant: &'m Variant) {
        let path = NodePath::Variant(self.variant_index);
        self.variant_index += 1;
        if variant.keys.len() != self.selector_count {
            self.report(DataModelErrorKind::KeyMismatch, path);
        }
        let keys = variant
            .keys
            .iter()
            .map(|key| match key {
                VariantKey::Literal(lit) => Some(lit.value.nfc().collect::<String>()),
                VariantKey::CatchAll => None,
            })
            .collect();
        if !self.seen_variants.insert(keys) {
            self.report(DataModelErrorKind::DuplicateVariant, path);
        }
        if variant.keys.iter().all(VariantKey::is_catch_all) {
            self.missing_fallback = None;
        }
    }
}
