//! Defines the error types for all rendering operations.

use schsvg_lexer::{FormatError, LexError};
use schsvg_svg::WriterError;
use schsvg_traits::SourceError;
use thiserror::Error;

/// The main error enum for a render request.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid schematic: {0}")]
    Format(#[from] FormatError),

    #[error("Source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("Output error: {0}")]
    Writer(WriterError),

    #[error("Rendering was cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RenderError {
    /// HTTP-style status for reporting the failure before output started.
    pub fn status_code(&self) -> u16 {
        match self {
            RenderError::SourceUnavailable(err) => err.status_code(),
            _ => 500,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RenderError::Cancelled)
    }

    /// True for failures whose message describes the input rather than the
    /// renderer, and so may be shown inside the output.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, RenderError::Format(_) | RenderError::SourceUnavailable(_))
    }
}

impl From<LexError> for RenderError {
    fn from(err: LexError) -> Self {
        match err {
            LexError::Format(e) => RenderError::Format(e),
            LexError::Source(e) => RenderError::SourceUnavailable(e),
            LexError::Cancelled => RenderError::Cancelled,
        }
    }
}

impl From<WriterError> for RenderError {
    fn from(err: WriterError) -> Self {
        match err {
            WriterError::Cancelled => RenderError::Cancelled,
            other => RenderError::Writer(other),
        }
    }
}

/// A failed render, after the environment has seen the error.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RenderFailure {
    pub error: RenderError,
    /// True when the environment already reported the failure to its caller.
    pub reported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use schsvg_lexer::Location;

    #[test]
    fn test_lex_errors_map_onto_render_errors() {
        let format = LexError::Format(FormatError::at(Location::START, "bad"));
        assert!(matches!(RenderError::from(format), RenderError::Format(_)));
        assert!(RenderError::from(LexError::Cancelled).is_cancelled());
        assert!(RenderError::from(WriterError::Cancelled).is_cancelled());
    }

    #[test]
    fn test_status_codes() {
        let missing = RenderError::SourceUnavailable(SourceError::NotFound("a.sch".into()));
        assert_eq!(missing.status_code(), 404);
        let format = RenderError::Format(FormatError::at(Location::START, "bad"));
        assert_eq!(format.status_code(), 500);
    }

    #[test]
    fn test_only_input_errors_are_user_facing() {
        let format = RenderError::Format(FormatError::at(Location::START, "bad"));
        assert!(format.is_user_facing());
        let missing = RenderError::SourceUnavailable(SourceError::NotFound("a.lib".into()));
        assert!(missing.is_user_facing());
        assert!(!RenderError::Internal("stack underflow".into()).is_user_facing());
        let writer = RenderError::Writer(WriterError::NoOpenElement {
            operation: "end_element",
        });
        assert!(!writer.is_user_facing());
        assert!(!RenderError::Cancelled.is_user_facing());
    }
}
