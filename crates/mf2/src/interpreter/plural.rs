//! CLDR plural category resolution.
//!
//! Different languages have different plural rules: English has "one" and
//! "other", Russian has "one", "few", "many" and "other", and Arabic uses all
//! six categories. Ordinal rules ("1st", "2nd", ...) are separate again.
//!
//! `PluralRules` are cached per thread per locale and rule type, so selecting
//! on many numbers in one locale builds the rules once.

use std::cell::RefCell;

use fixed_decimal::Decimal;
use icu_locale_core::Locale;
use icu_plurals::{PluralCategory, PluralOperands, PluralRuleType, PluralRules};
use tracing::debug;

thread_local! {
    /// Per-thread cache of `PluralRules` keyed by locale tag and ordinal flag.
    static PLURAL_RULES_CACHE: RefCell<Vec<(String, bool, PluralRules)>> = const { RefCell::new(Vec::new()) };
}

/// Translate a `PluralCategory` enum to its string representation.
fn category_str(category: PluralCategory) -> &'static str {
    match category {
        PluralCategory::Zero => "zero",
        PluralCategory::One => "one",
        PluralCategory::Two => "two",
        PluralCategory::Few => "few",
        PluralCategory::Many => "many",
        PluralCategory::Other => "other",
    }
}

fn build_rules(locale: &Locale, ordinal: bool) -> Option<PluralRules> {
    let rule_type = if ordinal {
        PluralRuleType::Ordinal
    } else {
        PluralRuleType::Cardinal
    };
    match PluralRules::try_new(locale.clone().into(), rule_type.into()) {
        Ok(rules) => Some(rules),
        Err(error) => {
            debug!(%locale, %error, "no plural rules for locale");
            None
        }
    }
}

/// Get the CLDR plural category of a formatted number.
///
/// `number` is the decimal digits as they are displayed, e.g. `"1"` or
/// `"1.50"`; visible trailing zeros matter to some rules. A leading sign is
/// ignored. Returns "other" when the locale has no rules or `number` is not a
/// plain decimal.
///
/// # Examples
///
/// ```
/// use icu_locale_core::locale;
/// use mf2::interpreter::plural_category;
///
/// assert_eq!(plural_category(&locale!("en"), false, "1"), "one");
/// assert_eq!(plural_category(&locale!("en"), false, "1.0"), "other");
/// assert_eq!(plural_category(&locale!("ru"), false, "3"), "few");
/// assert_eq!(plural_category(&locale!("en"), true, "2"), "two");
/// ```
pub fn plural_category(locale: &Locale, ordinal: bool, number: &str) -> &'static str {
    let digits = number.trim_start_matches(['-', '+']);
    let Ok(decimal) = digits.parse::<Decimal>() else {
        return "other";
    };
    let operands = PluralOperands::from(&decimal);
    let key = locale.to_string();
    PLURAL_RULES_CACHE.with_borrow_mut(|cache| {
        if let Some((_, _, rules)) = cache
            .iter()
            .find(|(tag, is_ordinal, _)| *tag == key && *is_ordinal == ordinal)
        {
            return category_str(rules.category_for(operands));
        }
        let Some(rules) = build_rules(locale, ordinal) else {
            return "other";
        };
        let category = category_str(rules.category_for(operands));
        cache.push((key, ordinal, rules));
        category
    })
}
