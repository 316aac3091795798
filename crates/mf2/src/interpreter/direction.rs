//! Text direction of locales.

use icu_locale_core::Locale;

use crate::types::Direction;

/// Scripts written right to left.
const RTL_SCRIPTS: &[&str] = &[
    "Adlm", "Arab", "Hebr", "Mand", "Nkoo", "Rohg", "Samr", "Syrc", "Thaa",
];

/// Languages whose default script is written right to left.
const RTL_LANGUAGES: &[&str] = &[
    "ar", "ckb", "dv", "fa", "he", "ks", "ps", "sd", "syr", "ug", "ur", "yi",
];

/// The default text direction of `locale`.
///
/// An explicit script subtag decides; otherwise the language does. The
/// undetermined locale `und` has no direction of its own.
pub fn locale_direction(locale: &Locale) -> Direction {
    if let Some(script) = locale.id.script {
        return if RTL_SCRIPTS.contains(&script.as_str()) {
            Direction::Rtl
        } else {
            Direction::Ltr
        };
    }
    match locale.id.language.as_str() {
        "und" => Direction::Auto,
        lang if RTL_LANGUAGES.contains(&lang) => Direction::Rtl,
        _ => Direction::Ltr,
    }
}
