use crate::location::Location;
use schsvg_traits::SourceError;
use thiserror::Error;

/// A malformed or unexpected token.
///
/// Fatal to the current render; the message is safe to show to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at {location}")]
pub struct FormatError {
    pub message: String,
    /// The offending raw text, empty when the error is not tied to a token.
    pub text: String,
    pub location: Location,
}

impl FormatError {
    pub fn new(message: impl Into<String>, text: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            text: text.into(),
            location,
        }
    }

    pub fn at(location: Location, message: impl Into<String>) -> Self {
        Self::new(message, String::new(), location)
    }
}

#[derive(Error, Debug)]
pub enum LexError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("Source unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("Reading the document was cancelled")]
    Cancelled,
}

impl From<std::io::Error> for LexError {
    fn from(err: std::io::Error) -> Self {
        LexError::Source(SourceError::from(err))
    }
}

pub type LexResult<T> = Result<T, LexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display_includes_location() {
        let err = FormatError::new("Expected LineBreak, got \"FAIL\"", "FAIL", Location::new(2, 9));
        assert_eq!(
            err.to_string(),
            "Expected LineBreak, got \"FAIL\" at line 2, column 9"
        );
    }

    #[test]
    fn test_lex_error_from_io() {
        let err: LexError = std::io::Error::other("socket closed").into();
        assert!(matches!(err, LexError::Source(SourceError::Io(_))));
    }
}
