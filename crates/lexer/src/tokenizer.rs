use crate::coerce::TokenEnum;
use crate::error::{FormatError, LexError, LexResult};
use crate::location::Location;
use crate::token::{Token, TokenKind};
use log::trace;
use schsvg_traits::{Cancellation, DocumentSource, SourceError, SourceReader};
use std::collections::VecDeque;
use tokio::io::AsyncReadExt;

const READ_CHUNK: usize = 8 * 1024;

/// Which file grammar a tokenizer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrammarMode {
    /// `.sch` documents.
    #[default]
    Schematic,
    /// `.lib` documents, where a line starting with `#` is a comment.
    Library,
}

/// Turns one document's character stream into tokens.
///
/// Reads suspend only when the internal buffer runs dry; every such read
/// races the cancellation signal.
pub struct Tokenizer {
    name: String,
    reader: SourceReader,
    mode: GrammarMode,
    cancel: Cancellation,
    scratch: Vec<u8>,
    undecoded: Vec<u8>,
    pending: VecDeque<char>,
    exhausted: bool,
    line: usize,
    col: usize,
    at_line_start: bool,
    finished: Option<Location>,
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("location", &self.location())
            .finish_non_exhaustive()
    }
}

impl Tokenizer {
    pub fn new(source: DocumentSource, mode: GrammarMode, cancel: Cancellation) -> Self {
        Self {
            name: source.name,
            reader: source.reader,
            mode,
            cancel,
            scratch: vec![0; READ_CHUNK],
            undecoded: Vec::new(),
            pending: VecDeque::new(),
            exhausted: false,
            line: 1,
            col: 1,
            at_line_start: true,
            finished: None,
        }
    }

    /// A tokenizer over in-memory text that can never be cancelled.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>, mode: GrammarMode) -> Self {
        let source = DocumentSource::from_bytes(name, text.into().into_bytes());
        Self::new(source, mode, Cancellation::never())
    }

    /// Display name of the document being read.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> GrammarMode {
        self.mode
    }

    /// Location of the next unread character.
    pub fn location(&self) -> Location {
        Location::new(self.line, self.col)
    }

    pub async fn read(&mut self) -> LexResult<Token> {
        if let Some(location) = self.finished {
            return Ok(Token::end_of_file(location));
        }

        let mut whitespace = String::new();
        loop {
            let next = self.peek(0).await?;
            let lone_cr = next == Some('\r') && self.peek(1).await? != Some('\n');
            match next {
                Some(c @ (' ' | '\t')) => {
                    self.bump();
                    whitespace.push(c);
                }
                Some('\r') if lone_cr => {
                    self.bump();
                    whitespace.push('\r');
                }
                Some('#') if self.mode == GrammarMode::Library && self.at_line_start => {
                    self.discard_line().await?;
                    whitespace.clear();
                }
                _ => break,
            }
        }

        let location = self.location();
        let Some(c) = self.peek(0).await? else {
            trace!("{}: end of input at {}", self.name, location);
            self.finished = Some(location);
            return Ok(Token::end_of_file(location));
        };

        let token = match c {
            '\r' | '\n' => {
                let mut raw = String::new();
                if c == '\r' {
                    self.bump();
                    raw.push('\r');
                }
                self.bump();
                raw.push('\n');
                self.at_line_start = true;
                return Ok(Token::new(raw, TokenKind::LineBreak, location, whitespace));
            }
            '(' => {
                self.bump();
                Token::new("(", TokenKind::ExpressionOpen, location, whitespace)
            }
            ')' => {
                self.bump();
                Token::new(")", TokenKind::ExpressionClose, location, whitespace)
            }
            '"' => {
                let raw = self.read_quoted(location).await?;
                Token::new(raw, TokenKind::Atom, location, whitespace)
            }
            _ => {
                let mut raw = String::new();
                while let Some(c) = self.peek(0).await? {
                    if is_separator(c) {
                        break;
                    }
                    self.bump();
                    raw.push(c);
                }
                Token::new(raw, TokenKind::Atom, location, whitespace)
            }
        };
        self.at_line_start = false;
        Ok(token)
    }

    /// Reads a token and checks its kind.
    pub async fn read_kind(&mut self, kind: TokenKind) -> LexResult<Token> {
        let token = self.read().await?;
        if token.kind() != kind {
            return Err(token
                .error(format!("Expected {kind}, got {}", token.describe()))
                .into());
        }
        Ok(token)
    }

    pub async fn read_atom(&mut self) -> LexResult<Token> {
        self.read_kind(TokenKind::Atom).await
    }

    async fn read_typed(&mut self, expected: &str) -> LexResult<Token> {
        let token = self.read().await?;
        if !token.is_atom() {
            return Err(token
                .error(format!("Expected {expected}, got {}", token.describe()))
                .into());
        }
        Ok(token)
    }

    pub async fn read_int(&mut self) -> LexResult<i32> {
        Ok(self.read_typed("an integer").await?.to_int()?)
    }

    pub async fn read_double(&mut self) -> LexResult<f64> {
        Ok(self.read_typed("a floating point number").await?.to_double()?)
    }

    pub async fn read_bool(&mut self) -> LexResult<bool> {
        Ok(self.read_typed("a boolean").await?.to_bool()?)
    }

    pub async fn read_char(&mut self) -> LexResult<char> {
        Ok(self.read_typed("a single character").await?.to_char()?)
    }

    pub async fn read_enum<T: TokenEnum>(&mut self) -> LexResult<T> {
        let token = self.read().await?;
        Ok(token.to_enum::<T>()?)
    }

    /// Reads an atom that must be one of `expected`.
    pub async fn read_literal(&mut self, expected: &[&str]) -> LexResult<Token> {
        let token = self.read().await?;
        if token.is_atom() && expected.iter().any(|e| token.is(e)) {
            return Ok(token);
        }
        let names = expected
            .iter()
            .map(|e| format!("\"{e}\""))
            .collect::<Vec<_>>()
            .join(" or ");
        Err(token
            .error(format!("Expected {names}, got {}", token.describe()))
            .into())
    }

    /// Collects raw text up to the first character that would start one of
    /// the `terminators`. The terminator itself is left unread.
    pub async fn read_text_until(&mut self, terminators: &[TokenKind]) -> LexResult<String> {
        let stop_at_line = terminators.contains(&TokenKind::LineBreak);
        let mut text = String::new();
        while let Some(c) = self.peek(0).await? {
            let stop = match c {
                '\n' => stop_at_line,
                '\r' => stop_at_line && self.peek(1).await? == Some('\n'),
                '(' => terminators.contains(&TokenKind::ExpressionOpen),
                ')' => terminators.contains(&TokenKind::ExpressionClose),
                _ => false,
            };
            if stop {
                break;
            }
            self.bump();
            text.push(c);
        }
        if !text.is_empty() {
            self.at_line_start = false;
        }
        Ok(text)
    }

    /// Discards the remainder of the current line including its line break.
    pub async fn skip_to_next_line(&mut self) -> LexResult<()> {
        self.discard_line().await
    }

    async fn discard_line(&mut self) -> LexResult<()> {
        while let Some(c) = self.peek(0).await? {
            self.bump();
            if c == '\n' {
                break;
            }
        }
        self.at_line_start = true;
        Ok(())
    }

    async fn read_quoted(&mut self, start: Location) -> LexResult<String> {
        let mut raw = String::new();
        if let Some(quote) = self.bump() {
            raw.push(quote);
        }
        loop {
            let Some(c) = self.peek(0).await? else {
                return Err(FormatError::new("Unterminated quoted text", raw, start).into());
            };
            self.bump();
            raw.push(c);
            match c {
                '"' => break,
                '\\' => {
                    let Some(escaped) = self.peek(0).await? else {
                        return Err(
                            FormatError::new("Unterminated quoted text", raw, start).into()
                        );
                    };
                    self.bump();
                    raw.push(escaped);
                }
                _ => {}
            }
        }

        if let Some(next) = self.peek(0).await?
            && !is_separator(next)
        {
            let location = self.location();
            return Err(FormatError::new(
                format!("Expected whitespace after quoted text, got '{next}'"),
                raw,
                location,
            )
            .into());
        }
        Ok(raw)
    }

    /// Consumes one buffered character, keeping the cursor location current.
    fn bump(&mut self) -> Option<char> {
        let c = self.pending.pop_front()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    async fn peek(&mut self, offset: usize) -> LexResult<Option<char>> {
        self.fill(offset + 1).await?;
        Ok(self.pending.get(offset).copied())
    }

    async fn fill(&mut self, wanted: usize) -> LexResult<()> {
        while self.pending.len() < wanted && !self.exhausted {
            if self.cancel.is_cancelled() {
                return Err(LexError::Cancelled);
            }
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(LexError::Cancelled),
                result = self.reader.read(&mut self.scratch) => result.map_err(SourceError::from)?,
            };
            if read == 0 {
                self.exhausted = true;
                if !self.undecoded.is_empty() {
                    return Err(self.invalid_utf8().into());
                }
                break;
            }
            self.undecoded.extend_from_slice(&self.scratch[..read]);
            self.decode_pending()?;
        }
        Ok(())
    }

    fn decode_pending(&mut self) -> LexResult<()> {
        let (valid, broken) = match std::str::from_utf8(&self.undecoded) {
            Ok(text) => {
                self.pending.extend(text.chars());
                self.undecoded.clear();
                return Ok(());
            }
            Err(err) => (err.valid_up_to(), err.error_len().is_some()),
        };
        let text = String::from_utf8_lossy(&self.undecoded[..valid]).into_owned();
        self.pending.extend(text.chars());
        self.undecoded.drain(..valid);
        if broken {
            return Err(self.invalid_utf8().into());
        }
        Ok(())
    }

    /// Location just past the characters decoded so far.
    fn invalid_utf8(&self) -> FormatError {
        let (mut line, mut col) = (self.line, self.col);
        for c in &self.pending {
            if *c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        FormatError::at(Location::new(line, col), "Invalid UTF-8 in document")
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '(' | ')')
}
