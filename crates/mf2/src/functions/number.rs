//! The `:number` and `:integer` functions.
//!
//! Numbers are formatted with Latin digits, `,` grouping and `.` as the
//! decimal separator. Selection compares the exact value first and then the
//! CLDR plural category of the formatted number.

use std::any::Any;
use std::collections::BTreeSet;
use std::str::FromStr;

use icu_locale_core::Locale;

use crate::interpreter::{
    FunctionContext, FunctionOptions, FunctionResult, ResolutionError, locale_direction,
    plural_category,
};
use crate::types::{
    Direction, FunctionInput, MessagePart, MessageValue, NumberPart, NumberPartKind, Value,
};

const DEFAULT_MAXIMUM_FRACTION_DIGITS: usize = 3;
const MAX_FRACTION_DIGITS: usize = 100;
const MAX_INTEGER_DIGITS: usize = 21;

const OPTION_NAMES: [&str; 6] = [
    "minimumIntegerDigits",
    "minimumFractionDigits",
    "maximumFractionDigits",
    "useGrouping",
    "signDisplay",
    "select",
];

/// When to insert grouping separators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Grouping {
    /// Group numbers of four or more integer digits.
    #[default]
    Auto,
    Always,
    /// Group only numbers of five or more integer digits.
    Min2,
    Never,
}

impl FromStr for Grouping {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" | "true" => Ok(Grouping::Auto),
            "always" => Ok(Grouping::Always),
            "min2" => Ok(Grouping::Min2),
            "never" | "false" => Ok(Grouping::Never),
            _ => Err(()),
        }
    }
}

/// When to show a sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SignDisplay {
    /// Minus for negative numbers only.
    #[default]
    Auto,
    /// Plus or minus for every number.
    Always,
    /// Plus or minus for every number except zero.
    ExceptZero,
    /// Minus for negative numbers other than zero.
    Negative,
    Never,
}

impl FromStr for SignDisplay {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(SignDisplay::Auto),
            "always" => Ok(SignDisplay::Always),
            "exceptZero" => Ok(SignDisplay::ExceptZero),
            "negative" => Ok(SignDisplay::Negative),
            "never" => Ok(SignDisplay::Never),
            _ => Err(()),
        }
    }
}

/// How a number chooses a variant key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NumberSelect {
    /// Exact value, then cardinal plural category.
    #[default]
    Plural,
    /// Exact value, then ordinal plural category.
    Ordinal,
    /// Exact value only.
    Exact,
}

impl FromStr for NumberSelect {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plural" => Ok(NumberSelect::Plural),
            "ordinal" => Ok(NumberSelect::Ordinal),
            "exact" => Ok(NumberSelect::Exact),
            _ => Err(()),
        }
    }
}

/// Resolved formatting options of a number.
///
/// A number used as the operand of another `:number` passes these on; the
/// outer expression's own options take precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NumberOptions {
    pub minimum_integer_digits: Option<usize>,
    pub minimum_fraction_digits: Option<usize>,
    pub maximum_fraction_digits: Option<usize>,
    pub use_grouping: Grouping,
    pub sign_display: SignDisplay,
    pub select: NumberSelect,
}

impl NumberOptions {
    fn fraction_digits(&self) -> (usize, usize) {
        let min = self.minimum_fraction_digits.unwrap_or(0);
        let max = self
            .maximum_fraction_digits
            .unwrap_or(DEFAULT_MAXIMUM_FRACTION_DIGITS)
            .max(min);
        (min, max)
    }
}

/// A numeric operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Float(f64),
}

impl Numeric {
    /// Parse a numeric string: an integer, or a decimal with optional
    /// exponent. Words like `NaN` and `inf` are not accepted.
    fn parse(s: &str) -> Option<Numeric> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Some(Numeric::Integer(n));
        }
        let numeric_chars = s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if !numeric_chars || !s.chars().any(|c| c.is_ascii_digit()) {
            return None;
        }
        s.parse::<f64>().ok().map(Numeric::Float)
    }

    fn from_value(value: &Value) -> Option<Numeric> {
        match value {
            Value::Number(n) => Some(Numeric::Integer(*n)),
            Value::Float(f) => Some(Numeric::Float(*f)),
            Value::String(s) => Numeric::parse(s),
            Value::Bool(_) | Value::Map(_) => None,
        }
    }

    fn truncate(self) -> Numeric {
        match self {
            Numeric::Integer(_) => self,
            Numeric::Float(f) if !f.is_finite() => self,
            Numeric::Float(f) => {
                let t = f.trunc();
                if t >= i64::MIN as f64 && t < i64::MAX as f64 {
                    Numeric::Integer(t as i64)
                } else {
                    Numeric::Float(t)
                }
            }
        }
    }

    /// The value as written in a variant key, e.g. `1` or `0.5`.
    fn exact_key(self) -> String {
        match self {
            Numeric::Integer(n) => n.to_string(),
            Numeric::Float(f) => f.to_string(),
        }
    }

    fn to_value(self) -> Value {
        match self {
            Numeric::Integer(n) => Value::Number(n),
            Numeric::Float(f) => Value::Float(f),
        }
    }
}

/// Formats a number.
///
/// Accepts numbers, numeric strings, and the results of other numeric
/// functions, whose options it inherits.
pub fn number(
    ctx: &mut FunctionContext,
    options: &FunctionOptions,
    operand: Option<&FunctionInput>,
) -> FunctionResult {
    let (value, inherited) = read_operand(ctx, operand)?;
    let options = read_options(ctx, options, inherited);
    Ok(Box::new(NumberValue::new(ctx, value, options)))
}

/// Formats a number truncated toward zero, without a fraction.
pub fn integer(
    ctx: &mut FunctionContext,
    options: &FunctionOptions,
    operand: Option<&FunctionInput>,
) -> FunctionResult {
    let (value, inherited) = read_operand(ctx, operand)?;
    let mut options = read_options(ctx, options, inherited);
    options.minimum_fraction_digits = Some(0);
    options.maximum_fraction_digits = Some(0);
    Ok(Box::new(NumberValue::new(ctx, value.truncate(), options)))
}

fn read_operand(
    ctx: &FunctionContext,
    operand: Option<&FunctionInput>,
) -> Result<(Numeric, NumberOptions), ResolutionError> {
    let not_numeric = || ResolutionError::bad_operand("input is not numeric", ctx.source());
    let Some(input) = operand else {
        return Err(not_numeric());
    };
    if let Some(number) = input
        .as_message()
        .and_then(|mv| mv.as_any().downcast_ref::<NumberValue>())
    {
        return Ok((number.value, number.options));
    }
    let value = input.value_of().ok_or_else(not_numeric)?;
    let numeric = Numeric::from_value(&value).ok_or_else(not_numeric)?;
    Ok((numeric, NumberOptions::default()))
}

fn read_options(
    ctx: &mut FunctionContext,
    options: &FunctionOptions,
    inherited: NumberOptions,
) -> NumberOptions {
    let mut resolved = inherited;
    for (name, input) in options {
        let text = input.value_of().map(|value| value.to_string());
        let ok = match (name.as_str(), text.as_deref()) {
            (name, None) => !OPTION_NAMES.contains(&name),
            ("minimumIntegerDigits", Some(text)) => {
                let digits = read_digits(text, 1, MAX_INTEGER_DIGITS);
                resolved.minimum_integer_digits = digits.or(resolved.minimum_integer_digits);
                digits.is_some()
            }
            ("minimumFractionDigits", Some(text)) => {
                let digits = read_digits(text, 0, MAX_FRACTION_DIGITS);
                resolved.minimum_fraction_digits = digits.or(resolved.minimum_fraction_digits);
                digits.is_some()
            }
            ("maximumFractionDigits", Some(text)) => {
                let digits = read_digits(text, 0, MAX_FRACTION_DIGITS);
                resolved.maximum_fraction_digits = digits.or(resolved.maximum_fraction_digits);
                digits.is_some()
            }
            ("useGrouping", Some(text)) => text
                .parse::<Grouping>()
                .map(|g| resolved.use_grouping = g)
                .is_ok(),
            ("signDisplay", Some(text)) => {
                text.parse::<SignDisplay>().map(|s| resolved.sign_display = s).is_ok()
            }
            ("select", Some(text)) => {
                if !ctx.is_literal_option("select") {
                    ctx.report(ResolutionError::bad_option(
                        "the select option must be a literal",
                        ctx.source(),
                    ));
                    continue;
                }
                text.parse::<NumberSelect>().map(|s| resolved.select = s).is_ok()
            }
            // Unrecognized options are ignored.
            (_, Some(_)) => true,
        };
        if !ok {
            ctx.report(ResolutionError::bad_option(
                format!("invalid value for option {name}"),
                ctx.source(),
            ));
        }
    }
    resolved
}

fn read_digits(text: &str, min: usize, max: usize) -> Option<usize> {
    let digits = match Numeric::parse(text)? {
        Numeric::Integer(n) => usize::try_from(n).ok()?,
        Numeric::Float(f) if f.fract() == 0.0 && f >= 0.0 && f <= max as f64 => f as usize,
        Numeric::Float(_) => return None,
    };
    (min..=max).contains(&digits).then_some(digits)
}

/// The result of `:number` or `:integer`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberValue {
    source: String,
    locale: Locale,
    dir: Option<Direction>,
    value: Numeric,
    options: NumberOptions,
}

impl NumberValue {
    fn new(ctx: &FunctionContext, value: Numeric, options: NumberOptions) -> Self {
        Self {
            source: ctx.source().to_string(),
            locale: ctx.locale(),
            dir: ctx.dir(),
            value,
            options,
        }
    }

    pub fn value(&self) -> Numeric {
        self.value
    }

    pub fn options(&self) -> &NumberOptions {
        &self.options
    }

    fn digits(&self) -> Digits {
        Digits::new(self.value, &self.options)
    }
}

impl MessageValue for NumberValue {
    fn type_name(&self) -> &str {
        "number"
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn dir(&self) -> Direction {
        self.dir.unwrap_or_else(|| locale_direction(&self.locale))
    }

    fn locale(&self) -> Option<&Locale> {
        Some(&self.locale)
    }

    fn select_key(&self, keys: &BTreeSet<String>) -> Result<Option<String>, ResolutionError> {
        let exact = self.value.exact_key();
        if keys.contains(&exact) {
            return Ok(Some(exact));
        }
        let ordinal = match self.options.select {
            NumberSelect::Exact => return Ok(None),
            NumberSelect::Plural => false,
            NumberSelect::Ordinal => true,
        };
        let Digits::Finite {
            integer, fraction, ..
        } = self.digits()
        else {
            return Ok(None);
        };
        let plain = if fraction.is_empty() {
            integer
        } else {
            format!("{integer}.{fraction}")
        };
        let category = plural_category(&self.locale, ordinal, &plain);
        Ok(keys.contains(category).then(|| category.to_string()))
    }

    fn to_text(&self) -> Option<String> {
        Some(self.number_parts().iter().map(|part| part.value.as_str()).collect())
    }

    fn to_parts(&self) -> Option<Vec<MessagePart>> {
        Some(vec![MessagePart::Number {
            source: self.source.clone(),
            locale: self.locale.to_string(),
            dir: self.dir,
            id: None,
            parts: self.number_parts(),
        }])
    }

    fn value_of(&self) -> Option<Value> {
        Some(self.value.to_value())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NumberValue {
    fn number_parts(&self) -> Vec<NumberPart> {
        let digits = self.digits();
        let mut parts = Vec::new();
        let (negative, zero) = match &digits {
            Digits::NaN => return vec![NumberPart::new(NumberPartKind::Nan, "NaN")],
            Digits::Infinite { negative } => (*negative, false),
            Digits::Finite {
                negative,
                integer,
                fraction,
            } => (
                *negative,
                integer.chars().chain(fraction.chars()).all(|c| c == '0'),
            ),
        };
        let sign = match (self.options.sign_display, negative, zero) {
            (SignDisplay::Never, _, _) | (SignDisplay::Negative, _, true) => None,
            (_, true, _) => Some(NumberPart::new(NumberPartKind::MinusSign, "-")),
            (SignDisplay::Always, false, _) | (SignDisplay::ExceptZero, false, false) => {
                Some(NumberPart::new(NumberPartKind::PlusSign, "+"))
            }
            _ => None,
        };
        parts.extend(sign);
        match digits {
            Digits::NaN => {}
            Digits::Infinite { .. } => parts.push(NumberPart::new(NumberPartKind::Infinity, "∞")),
            Digits::Finite {
                integer, fraction, ..
            } => {
                push_grouped(&mut parts, &integer, self.options.use_grouping);
                if !fraction.is_empty() {
                    parts.push(NumberPart::new(NumberPartKind::Decimal, "."));
                    parts.push(NumberPart::new(NumberPartKind::Fraction, fraction));
                }
            }
        }
        parts
    }
}

/// Push `integer` as integer parts separated by group separators.
fn push_grouped(parts: &mut Vec<NumberPart>, integer: &str, grouping: Grouping) {
    let min_digits = match grouping {
        Grouping::Never => usize::MAX,
        Grouping::Min2 => 5,
        Grouping::Auto | Grouping::Always => 4,
    };
    if integer.len() < min_digits {
        parts.push(NumberPart::new(NumberPartKind::Integer, integer));
        return;
    }
    let first = match integer.len() % 3 {
        0 => 3,
        n => n,
    };
    parts.push(NumberPart::new(NumberPartKind::Integer, &integer[..first]));
    let mut start = first;
    while start < integer.len() {
        parts.push(NumberPart::new(NumberPartKind::Group, ","));
        parts.push(NumberPart::new(
            NumberPartKind::Integer,
            &integer[start..start + 3],
        ));
        start += 3;
    }
}

/// The digits of a number after rounding, without sign or separators.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Digits {
    NaN,
    Infinite {
        negative: bool,
    },
    Finite {
        negative: bool,
        integer: String,
        fraction: String,
    },
}

impl Digits {
    fn new(value: Numeric, options: &NumberOptions) -> Digits {
        let (min_fraction, max_fraction) = options.fraction_digits();
        let (negative, mut integer, mut fraction) = match value {
            Numeric::Integer(n) => (n < 0, n.unsigned_abs().to_string(), String::new()),
            Numeric::Float(f) if f.is_nan() => return Digits::NaN,
            Numeric::Float(f) if f.is_infinite() => {
                return Digits::Infinite { negative: f < 0.0 };
            }
            Numeric::Float(f) => {
                let rounded = format!("{:.*}", max_fraction, f.abs());
                let (integer, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
                (f < 0.0, integer.to_string(), fraction.to_string())
            }
        };
        while fraction.len() > min_fraction && fraction.ends_with('0') {
            fraction.pop();
        }
        while fraction.len() < min_fraction {
            fraction.push('0');
        }
        let min_integer = options.minimum_integer_digits.unwrap_or(1);
        if integer.len() < min_integer {
            integer = format!("{}{integer}", "0".repeat(min_integer - integer.len()));
        }
        Digits::Finite {
            negative,
            integer,
            fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(value: Numeric, options: NumberOptions) -> String {
        let mv = NumberValue {
            source: "|n|".to_string(),
            locale: Locale::UNKNOWN,
            dir: None,
            value,
            options,
        };
        mv.to_text().unwrap()
    }

    #[test]
    fn groups_thousands() {
        let options = NumberOptions::default();
        assert_eq!(format(Numeric::Integer(1234567), options), "1,234,567");
        assert_eq!(format(Numeric::Integer(123), options), "123");
        assert_eq!(format(Numeric::Integer(-1000), options), "-1,000");
    }

    #[test]
    fn min2_grouping_skips_four_digits() {
        let options = NumberOptions {
            use_grouping: Grouping::Min2,
            ..NumberOptions::default()
        };
        assert_eq!(format(Numeric::Integer(1234), options), "1234");
        assert_eq!(format(Numeric::Integer(12345), options), "12,345");
    }

    #[test]
    fn rounds_to_maximum_fraction_digits() {
        let options = NumberOptions::default();
        assert_eq!(format(Numeric::Float(3.14159), options), "3.142");
        assert_eq!(format(Numeric::Float(2.5), options), "2.5");
        assert_eq!(format(Numeric::Float(4.0), options), "4");
    }

    #[test]
    fn pads_minimum_digits() {
        let options = NumberOptions {
            minimum_integer_digits: Some(3),
            minimum_fraction_digits: Some(2),
            ..NumberOptions::default()
        };
        assert_eq!(format(Numeric::Integer(7), options), "007.00");
    }

    #[test]
    fn sign_display_variants() {
        let with = |sign_display| NumberOptions {
            sign_display,
            ..NumberOptions::default()
        };
        assert_eq!(format(Numeric::Integer(5), with(SignDisplay::Always)), "+5");
        assert_eq!(format(Numeric::Integer(0), with(SignDisplay::ExceptZero)), "0");
        assert_eq!(format(Numeric::Integer(-5), with(SignDisplay::Never)), "5");
        assert_eq!(format(Numeric::Integer(-5), with(SignDisplay::Negative)), "-5");
    }

    #[test]
    fn non_finite_values() {
        let options = NumberOptions::default();
        assert_eq!(format(Numeric::Float(f64::NAN), options), "NaN");
        assert_eq!(format(Numeric::Float(f64::NEG_INFINITY), options), "-∞");
    }

    #[test]
    fn numeric_strings() {
        assert_eq!(Numeric::parse("42"), Some(Numeric::Integer(42)));
        assert_eq!(Numeric::parse(" 1.5e2 "), Some(Numeric::Float(150.0)));
        assert_eq!(Numeric::parse("NaN"), None);
        assert_eq!(Numeric::parse("-"), None);
    }

    #[test]
    fn truncation() {
        assert_eq!(Numeric::Float(-2.7).truncate(), Numeric::Integer(-2));
        assert_eq!(Numeric::Float(3.0).exact_key(), "3");
    }

    #[test]
    fn digit_option_range() {
        assert_eq!(read_digits("2", 0, 100), Some(2));
        assert_eq!(read_digits("0", 1, 21), None);
        assert_eq!(read_digits("1.5", 0, 100), None);
    }
}
