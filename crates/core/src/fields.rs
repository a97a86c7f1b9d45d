//! Line-oriented reading helpers shared by the schematic and library
//! grammars.

use crate::error::RenderError;
use schsvg_lexer::{FormatError, Location, Token, TokenEnum, TokenKind, Tokenizer};

/// Skips the rest of the current line, then whole lines until one starting
/// with `end`, which is consumed too.
pub(crate) async fn skip_block(tz: &mut Tokenizer, end: &str) -> Result<(), RenderError> {
    tz.skip_to_next_line().await?;
    loop {
        let token = tz.read().await?;
        match token.kind() {
            TokenKind::EndOfFile => {
                return Err(token
                    .error(format!("Expected \"{end}\", got end of file"))
                    .into());
            }
            TokenKind::LineBreak => continue,
            _ if token.is(end) => {
                read_line(tz).await?;
                return Ok(());
            }
            _ => tz.skip_to_next_line().await?,
        }
    }
}

/// The remaining tokens of one line.
pub(crate) struct LineFields {
    pub(crate) tokens: Vec<Token>,
    next: usize,
    end: Location,
}

/// Reads tokens up to and including the next line break (or end of input).
pub(crate) async fn read_line(tz: &mut Tokenizer) -> Result<LineFields, RenderError> {
    let mut tokens = Vec::new();
    loop {
        let token = tz.read().await?;
        match token.kind() {
            TokenKind::LineBreak | TokenKind::EndOfFile => {
                return Ok(LineFields {
                    tokens,
                    next: 0,
                    end: token.location(),
                });
            }
            _ => tokens.push(token),
        }
    }
}

impl LineFields {
    fn missing(&self, expected: &str) -> FormatError {
        FormatError::at(self.end, format!("Expected {expected}, got LineBreak"))
    }

    pub(crate) fn next_token(&mut self, expected: &str) -> Result<&Token, FormatError> {
        let token = self
            .tokens
            .get(self.next)
            .ok_or_else(|| self.missing(expected))?;
        self.next += 1;
        Ok(token)
    }

    pub(crate) fn optional(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.next)?;
        self.next += 1;
        Some(token)
    }

    pub(crate) fn int(&mut self) -> Result<i32, FormatError> {
        self.next_token("an integer")?.to_int()
    }

    pub(crate) fn point(&mut self) -> Result<(i32, i32), FormatError> {
        Ok((self.int()?, self.int()?))
    }

    pub(crate) fn text(&mut self, expected: &str) -> Result<String, FormatError> {
        Ok(self.next_token(expected)?.value()?.to_string())
    }

    pub(crate) fn enumerant<T: TokenEnum>(&mut self) -> Result<T, FormatError> {
        let spellings = T::accepted_spellings();
        self.next_token(&format!("one of {spellings}"))?.to_enum()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.next)
    }
}
