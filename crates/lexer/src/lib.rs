//! # schsvg-lexer
//!
//! Lexical layer for KiCad's legacy `EESchema` schematic and symbol library
//! files.
//!
//! - [`Tokenizer`]: turns an async character stream into positioned [`Token`]s
//! - [`Token`]: raw text plus a lazily decoded, memoized value and typed
//!   coercions (`to_int`, `to_double`, `to_bool`, `to_char`, `to_enum`)
//! - [`escape`]: C-style escape decoding for quoted atoms
//! - [`TokenEnum`] / [`token_enum!`]: static spelling tables for enumerants
//!
//! Every grammar violation surfaces as a [`FormatError`] carrying the exact
//! source [`Location`].

pub mod coerce;
pub mod error;
pub mod escape;
pub mod location;
pub mod token;
pub mod tokenizer;

pub use coerce::TokenEnum;
pub use error::{FormatError, LexError, LexResult};
pub use location::Location;
pub use token::{Token, TokenKind};
pub use tokenizer::{GrammarMode, Tokenizer};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
