//! Lexical helpers shared by both parsers.
//!
//! These are pure functions over a source string and a byte position: they
//! never allocate parser state and never move backwards.

use unicode_normalization::UnicodeNormalization;

/// Result of skipping a run of whitespace and bidi control characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Whitespace {
    /// Whether at least one actual whitespace character was consumed.
    pub has_ws: bool,
    pub end: usize,
}

/// Returns the character starting at byte offset `pos`, if any.
pub fn char_at(src: &str, pos: usize) -> Option<char> {
    src.get(pos..).and_then(|rest| rest.chars().next())
}

pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{3000}')
}

/// Bidi control characters that may appear around names and between tokens.
pub fn is_bidi(c: char) -> bool {
    matches!(c, '\u{061C}' | '\u{200E}' | '\u{200F}' | '\u{2066}'..='\u{2069}')
}

/// Skips whitespace and bidi controls starting at `start`.
pub fn whitespaces(src: &str, start: usize) -> Whitespace {
    let mut has_ws = false;
    let mut end = start;
    for c in src.get(start..).unwrap_or_default().chars() {
        if is_whitespace(c) {
            has_ws = true;
        } else if !is_bidi(c) {
            break;
        }
        end += c.len_utf8();
    }
    Whitespace { has_ws, end }
}

pub fn is_name_start(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | '_'
        | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{61B}'
        | '\u{61D}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFC}'
        | '\u{10000}'..='\u{EFFFF}')
}

pub fn is_name_char(c: char) -> bool {
    is_name_start(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// A name read from the source, NFC-normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub value: String,
    pub end: usize,
}

/// Reads a name at `start`: optional bidi mark, name-start, name chars,
/// optional bidi mark.
///
/// Returns `None` if no name starts here.
pub fn parse_name(src: &str, start: usize) -> Option<Name> {
    let mut pos = start;
    if let Some(c) = char_at(src, pos).filter(|&c| is_bidi(c)) {
        pos += c.len_utf8();
    }
    let name_start = pos;
    let first = char_at(src, pos).filter(|&c| is_name_start(c))?;
    pos += first.len_utf8();
    while let Some(c) = char_at(src, pos).filter(|&c| is_name_char(c)) {
        pos += c.len_utf8();
    }
    let value: String = src[name_start..pos].nfc().collect();
    if let Some(c) = char_at(src, pos).filter(|&c| is_bidi(c)) {
        pos += c.len_utf8();
    }
    Some(Name { value, end: pos })
}

/// Reads the longest run of name characters at `start`.
///
/// Returns the empty string if none are present.
pub fn unquoted_literal(src: &str, start: usize) -> &str {
    let rest = src.get(start..).unwrap_or_default();
    let len = rest
        .char_indices()
        .find(|&(_, c)| !is_name_char(c))
        .map_or(rest.len(), |(i, _)| i);
    &rest[..len]
}

/// Returns whether `value` can be written as an unquoted literal.
pub fn is_valid_unquoted_literal(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_name_char)
}

/// Outcome of decoding an escape sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escape {
    /// The decoded character and the offset just past the sequence.
    Char { value: char, end: usize },
    /// Not a valid escape; the offending sequence ends at `end`.
    Invalid { end: usize },
}

/// Decodes the escape sequence whose backslash is at `pos`.
///
/// `\\`, `\{`, `\|` and `\}` are always valid. In resource mode the control
/// escapes `\t`, `\n`, `\r`, `\xHH`, `\uHHHH` and `\UHHHHHH` are also accepted.
pub fn decode_escape(src: &str, pos: usize, resource: bool) -> Escape {
    let next = pos + 1;
    let Some(c) = char_at(src, next) else {
        return Escape::Invalid { end: next };
    };
    let after = next + c.len_utf8();
    match c {
        '\\' | '{' | '|' | '}' => Escape::Char { value: c, end: after },
        't' if resource => Escape::Char { value: '\t', end: after },
        'n' if resource => Escape::Char { value: '\n', end: after },
        'r' if resource => Escape::Char { value: '\r', end: after },
        'x' if resource => decode_hex(src, after, 2),
        'u' if resource => decode_hex(src, after, 4),
        'U' if resource => decode_hex(src, after, 6),
        _ => Escape::Invalid { end: after },
    }
}

fn decode_hex(src: &str, start: usize, digits: usize) -> Escape {
    let hex_len = src
        .get(start..)
        .unwrap_or_default()
        .chars()
        .take(digits)
        .take_while(char::is_ascii_hexdigit)
        .count();
    let end = start + hex_len;
    let value = (hex_len == digits)
        .then(|| u32::from_str_radix(&src[start..end], 16).ok())
        .flatten()
        .and_then(char::from_u32);
    match value {
        Some(value) => Escape::Char { value, end },
        None => Escape::Invalid { end },
    }
}

/// Offset just past the indentation following a newline at `pos`, used by
/// resource mode to drop leading whitespace of continuation lines.
pub fn skip_indent(src: &str, pos: usize) -> usize {
    let rest = src.get(pos..).unwrap_or_default();
    let len = rest
        .char_indices()
        .find(|&(_, c)| c != ' ' && c != '\t')
        .map_or(rest.len(), |(i, _)| i);
    pos + len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_reports_real_whitespace_only() {
        assert_eq!(
            whitespaces("\u{200E}x", 0),
            Whitespace {
                has_ws: false,
                end: 3
            }
        );
        assert_eq!(whitespaces(" \t x", 0), Whitespace { has_ws: true, end: 3 });
        assert_eq!(whitespaces("x", 0), Whitespace { has_ws: false, end: 0 });
    }

    #[test]
    fn name_allows_dots_and_dashes_after_start() {
        let name = parse_name("a.b-c=", 0).unwrap();
        assert_eq!(name.value, "a.b-c");
        assert_eq!(name.end, 5);
    }

    #[test]
    fn name_cannot_start_with_digit() {
        assert_eq!(parse_name("1abc", 0), None);
    }

    #[test]
    fn name_strips_surrounding_bidi_marks() {
        let src = "\u{200F}name\u{200E} ";
        let name = parse_name(src, 0).unwrap();
        assert_eq!(name.value, "name");
        assert_eq!(name.end, src.len() - 1);
    }

    #[test]
    fn unquoted_literal_may_start_with_digit() {
        assert_eq!(unquoted_literal("1.5 x", 0), "1.5");
        assert_eq!(unquoted_literal("|x|", 0), "");
    }

    #[test]
    fn basic_escapes_decode_everywhere() {
        assert_eq!(
            decode_escape("\\{", 0, false),
            Escape::Char { value: '{', end: 2 }
        );
        assert_eq!(decode_escape("\\n", 0, false), Escape::Invalid { end: 2 });
    }

    #[test]
    fn resource_escapes_decode_hex() {
        assert_eq!(
            decode_escape("\\x41", 0, true),
            Escape::Char { value: 'A', end: 4 }
        );
        assert_eq!(
            decode_escape("\\u00e9", 0, true),
            Escape::Char { value: 'é', end: 6 }
        );
        assert_eq!(
            decode_escape("\\U01F600", 0, true),
            Escape::Char {
                value: '\u{1F600}',
                end: 8
            }
        );
        assert_eq!(decode_escape("\\xZ1", 0, true), Escape::Invalid { end: 2 });
        assert_eq!(decode_escape("\\x4", 0, true), Escape::Invalid { end: 3 });
    }
}
