//! Variant selection for `.match` messages.

use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::trace;
use unicode_normalization::UnicodeNormalization;

use crate::interpreter::SelectionError;
use crate::interpreter::context::Context;
use crate::model::{PatternElement, SelectMessage, Variant, VariantKey};
use crate::types::MessageValue;

/// Selection state of one selector.
struct Selector {
    value: Rc<dyn MessageValue>,
    /// Cleared after the value fails to select once.
    selectable: bool,
    /// Keys this selector may still choose from; `None` until computed from
    /// the current candidates.
    keys: Option<BTreeSet<String>>,
    /// The chosen key, or `None` for the catch-all.
    best: Option<String>,
}

fn literal_key(key: &VariantKey) -> Option<String> {
    match key {
        VariantKey::Literal(lit) => Some(lit.value.nfc().collect()),
        VariantKey::CatchAll => None,
    }
}

/// Choose the pattern of the variant that best matches the selectors.
///
/// Selectors are considered in order, earlier ones taking precedence. Each
/// selector picks its best key among the keys still present at its position,
/// and the candidates narrow to the variants with that key (or with `*` when
/// nothing matched). When the candidates run out, the nearest earlier
/// selector that chose a concrete key gives up that key and the scan starts
/// over. Each backtrack removes one key for good, so the scan terminates.
///
/// If no variant can match, reports `no-match` and returns an empty pattern.
pub(crate) fn select_pattern<'m>(
    ctx: &mut Context<'_>,
    message: &'m SelectMessage,
) -> &'m [PatternElement] {
    let mut selectors: Vec<Selector> = message
        .selectors
        .iter()
        .map(|var| {
            let value = ctx.resolve_variable(var);
            let selectable = supports_selection(ctx, value.as_ref());
            Selector {
                value,
                selectable,
                keys: None,
                best: None,
            }
        })
        .collect();

    let all: Vec<&Variant> = message.variants.iter().collect();
    let mut candidates = all.clone();
    let mut i = 0;
    'scan: while i < selectors.len() {
        let selector = &mut selectors[i];
        if selector.keys.is_none() {
            let mut keys = BTreeSet::new();
            for variant in &candidates {
                match variant.keys.get(i) {
                    Some(key) => keys.extend(literal_key(key)),
                    None => break 'scan,
                }
            }
            selector.keys = Some(keys);
        }

        selector.best = choose(ctx, selector);
        trace!(selector = i, best = ?selector.best, "selector chose key");
        let best = selector.best.clone();
        candidates.retain(|variant| match variant.keys.get(i) {
            Some(key) => literal_key(key) == best,
            None => false,
        });

        if candidates.is_empty() {
            let Some(j) = (0..i).rev().find(|&j| selectors[j].best.is_some()) else {
                break;
            };
            let previous = &mut selectors[j];
            if let (Some(keys), Some(best)) = (previous.keys.as_mut(), previous.best.take()) {
                trace!(selector = j, key = %best, "backtracking");
                keys.remove(&best);
            }
            for later in &mut selectors[j + 1..] {
                later.keys = None;
                later.best = None;
            }
            candidates.clone_from(&all);
            i = 0;
        } else {
            i += 1;
        }
    }

    match candidates.first() {
        Some(variant) => &variant.value,
        None => {
            ctx.report(SelectionError::no_match());
            &[]
        }
    }
}

/// Check that `value` can select at all, reporting `bad-selector` if not.
///
/// Asked up front so the error is reported even when the selector never
/// gets to choose among literal keys, e.g. when all its keys are `*`.
fn supports_selection(ctx: &mut Context<'_>, value: &dyn MessageValue) -> bool {
    match value.select_key(&BTreeSet::new()) {
        Ok(_) => true,
        Err(cause) => {
            ctx.report(SelectionError::bad_selector(value.source(), Some(cause)));
            false
        }
    }
}

/// Ask a selector's value for its best key among the selector's keys.
fn choose(ctx: &mut Context<'_>, selector: &mut Selector) -> Option<String> {
    let keys = selector.keys.as_ref()?;
    if keys.is_empty() || !selector.selectable {
        return None;
    }
    match selector.value.select_key(keys) {
        Ok(best) => best.filter(|key| keys.contains(key)),
        Err(cause) => {
            ctx.report(SelectionError::bad_selector(
                selector.value.source(),
                Some(cause),
            ));
            selector.selectable = false;
            None
        }
    }
}
