//! C-style escape decoding for the inner text of quoted atoms.
//!
//! Supported sequences:
//!
//! | Sequence        | Meaning                                     |
//! |-----------------|---------------------------------------------|
//! | `\a \b \f \n \r \t \v` | the usual control characters         |
//! | `\\ \' \" \?`   | the character itself                        |
//! | `\o \oo \ooo`   | octal code point, one to three digits       |
//! | `\xh...`        | hex code point, one to seven digits         |
//! | `\uhhhh`        | exactly four hex digits                     |
//! | `\Uhhhhhhhh`    | exactly eight hex digits                    |
//!
//! A `\u` high surrogate immediately followed by a `\u` low surrogate is
//! combined into one scalar value. Anything else that does not name a Unicode
//! scalar value (lone surrogates, values above `0x10FFFF`) is rejected, as are
//! truncated sequences.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

const MAX_CODE_POINT: u32 = 0x10FFFF;
const HIGH_SURROGATES: std::ops::RangeInclusive<u32> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u32> = 0xDC00..=0xDFFF;

/// An invalid escape sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeError {
    /// The sequence as written, starting with the backslash.
    pub sequence: String,
    pub reason: &'static str,
}

impl EscapeError {
    fn new(sequence: impl Into<String>, reason: &'static str) -> Self {
        Self {
            sequence: sequence.into(),
            reason,
        }
    }
}

impl fmt::Display for EscapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid escape sequence '{}': {}", self.sequence, self.reason)
    }
}

impl std::error::Error for EscapeError {}

/// Decodes every escape sequence in `text`.
pub fn decode_escapes(text: &str) -> Result<String, EscapeError> {
    let mut decoded = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }

        let Some(code) = chars.next() else {
            return Err(EscapeError::new("\\", "escape sequence is incomplete"));
        };

        if let Some(simple) = simple_escape(code) {
            decoded.push(simple);
            continue;
        }

        let (sequence, value) = match code {
            '0'..='7' => {
                let mut digits = String::from(code);
                digits.push_str(&take_digits(&mut chars, 2, 8));
                let value = parse_digits(&digits, 8);
                (format!("\\{digits}"), value)
            }
            'x' => {
                let digits = take_digits(&mut chars, 7, 16);
                if digits.is_empty() {
                    return Err(EscapeError::new("\\x", "expected at least one hex digit"));
                }
                (format!("\\x{digits}"), parse_digits(&digits, 16))
            }
            'u' => {
                let digits = take_exact(&mut chars, 4, "\\u")?;
                let high = parse_digits(&digits, 16);
                if HIGH_SURROGATES.contains(&high) {
                    let low = take_low_surrogate(&mut chars).ok_or_else(|| {
                        EscapeError::new(format!("\\u{digits}"), "unpaired surrogate")
                    })?;
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    (format!("\\u{digits}"), combined)
                } else {
                    (format!("\\u{digits}"), high)
                }
            }
            'U' => {
                let digits = take_exact(&mut chars, 8, "\\U")?;
                (format!("\\U{digits}"), parse_digits(&digits, 16))
            }
            other => {
                return Err(EscapeError::new(
                    format!("\\{other}"),
                    "unknown escape character",
                ));
            }
        };

        decoded.push(to_scalar(&sequence, value)?);
    }

    Ok(decoded)
}

fn simple_escape(code: char) -> Option<char> {
    match code {
        'a' => Some('\u{07}'),
        'b' => Some('\u{08}'),
        'f' => Some('\u{0C}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{0B}'),
        '\\' | '\'' | '"' | '?' => Some(code),
        _ => None,
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>, max: usize, radix: u32) -> String {
    let mut digits = String::new();
    while digits.len() < max {
        match chars.peek() {
            Some(c) if c.is_digit(radix) => {
                digits.push(*c);
                chars.next();
            }
            _ => break,
        }
    }
    digits
}

fn take_exact(
    chars: &mut Peekable<Chars<'_>>,
    count: usize,
    prefix: &str,
) -> Result<String, EscapeError> {
    let digits = take_digits(chars, count, 16);
    if digits.len() < count {
        return Err(EscapeError::new(
            format!("{prefix}{digits}"),
            "too few hex digits",
        ));
    }
    Ok(digits)
}

/// Consumes a `\uDC00`..`\uDFFF` sequence if one follows, leaving the
/// iterator untouched otherwise.
fn take_low_surrogate(chars: &mut Peekable<Chars<'_>>) -> Option<u32> {
    let mut lookahead = chars.clone();
    if lookahead.next() != Some('\\') || lookahead.next() != Some('u') {
        return None;
    }
    let digits = take_digits(&mut lookahead, 4, 16);
    if digits.len() != 4 {
        return None;
    }
    let low = parse_digits(&digits, 16);
    if !LOW_SURROGATES.contains(&low) {
        return None;
    }
    *chars = lookahead;
    Some(low)
}

fn parse_digits(digits: &str, radix: u32) -> u32 {
    // At most eight hex or three octal digits, so this cannot overflow.
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0, |acc, d| acc * radix + d)
}

fn to_scalar(sequence: &str, value: u32) -> Result<char, EscapeError> {
    if value > MAX_CODE_POINT {
        return Err(EscapeError::new(sequence, "code point out of range"));
    }
    if HIGH_SURROGATES.contains(&value) || LOW_SURROGATES.contains(&value) {
        return Err(EscapeError::new(sequence, "unpaired surrogate"));
    }
    char::from_u32(value).ok_or_else(|| EscapeError::new(sequence, "not a Unicode scalar value"))
}
