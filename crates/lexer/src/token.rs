use crate::coerce::TokenEnum;
use crate::error::FormatError;
use crate::escape::decode_escapes;
use crate::location::Location;
use once_cell::sync::OnceCell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Atom,
    ExpressionOpen,
    ExpressionClose,
    LineBreak,
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Atom => "Atom",
            TokenKind::ExpressionOpen => "ExpressionOpen",
            TokenKind::ExpressionClose => "ExpressionClose",
            TokenKind::LineBreak => "LineBreak",
            TokenKind::EndOfFile => "EndOfFile",
        };
        f.write_str(name)
    }
}

/// A lexical unit with its source position.
///
/// The decoded value of a quoted atom is computed on first access and kept
/// with the token.
#[derive(Debug, Clone)]
pub struct Token {
    raw: String,
    kind: TokenKind,
    location: Location,
    preceding_whitespace: String,
    decoded: OnceCell<Result<String, FormatError>>,
}

impl Token {
    pub fn new(
        raw: impl Into<String>,
        kind: TokenKind,
        location: Location,
        preceding_whitespace: impl Into<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            kind,
            location,
            preceding_whitespace: preceding_whitespace.into(),
            decoded: OnceCell::new(),
        }
    }

    pub fn atom(raw: impl Into<String>, location: Location) -> Self {
        Self::new(raw, TokenKind::Atom, location, "")
    }

    pub fn end_of_file(location: Location) -> Self {
        Self::new("", TokenKind::EndOfFile, location, "")
    }

    /// The text exactly as it appeared in the source.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn preceding_whitespace(&self) -> &str {
        &self.preceding_whitespace
    }

    pub fn is_atom(&self) -> bool {
        self.kind == TokenKind::Atom
    }

    pub fn is_quoted(&self) -> bool {
        self.is_atom() && self.raw.len() >= 2 && self.raw.starts_with('"')
    }

    /// The decoded value: quotes stripped and escapes resolved for quoted
    /// atoms, the raw text for everything else.
    pub fn value(&self) -> Result<&str, FormatError> {
        match self.decoded.get_or_init(|| self.decode()) {
            Ok(value) => Ok(value.as_str()),
            Err(err) => Err(err.clone()),
        }
    }

    /// True when this is an atom whose decoded value equals `text`.
    pub fn is(&self, text: &str) -> bool {
        self.is_atom() && self.value().is_ok_and(|v| v == text)
    }

    fn decode(&self) -> Result<String, FormatError> {
        if !self.is_quoted() {
            return Ok(self.raw.clone());
        }
        let inner = &self.raw[1..self.raw.len() - 1];
        if !inner.contains('\\') {
            return Ok(inner.to_string());
        }
        decode_escapes(inner).map_err(|err| self.error(err.to_string()))
    }

    /// A short human-readable rendering for error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Atom => format!("\"{}\"", self.raw),
            other => other.to_string(),
        }
    }

    /// Builds a format error pointing at this token.
    pub fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::new(message, self.raw.clone(), self.location)
    }

    fn coercion_error(&self, expected: &str) -> FormatError {
        self.error(format!("Expected {expected}, got {}", self.describe()))
    }

    pub fn to_int(&self) -> Result<i32, FormatError> {
        self.value()?
            .parse::<i32>()
            .map_err(|_| self.coercion_error("an integer"))
    }

    pub fn to_double(&self) -> Result<f64, FormatError> {
        let value = self.value()?;
        match value.parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(number),
            _ => Err(self.coercion_error("a floating point number")),
        }
    }

    pub fn to_bool(&self) -> Result<bool, FormatError> {
        match self.value()? {
            "Y" | "1" => Ok(true),
            "N" | "0" => Ok(false),
            _ => Err(self.coercion_error("a boolean (Y, N, 1 or 0)")),
        }
    }

    pub fn to_char(&self) -> Result<char, FormatError> {
        let mut chars = self.value()?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(self.coercion_error("a single character")),
        }
    }

    /// Maps the raw text onto an enumerant through its spelling table.
    pub fn to_enum<T: TokenEnum>(&self) -> Result<T, FormatError> {
        T::lookup()
            .get(self.raw.as_str())
            .copied()
            .ok_or_else(|| {
                self.error(format!(
                    "Expected one of {}, got {}",
                    T::accepted_spellings(),
                    self.describe()
                ))
            })
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value() == other.value()
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.value().is_ok_and(|v| v == *other)
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.value().is_ok_and(|v| v == other)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Atom => f.write_str(&self.raw),
            other => write!(f, "{other}"),
        }
    }
}
