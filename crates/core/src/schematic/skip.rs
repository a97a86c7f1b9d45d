//! Constructs that carry nothing drawable.

use crate::error::RenderError;
use crate::fields::skip_block;
use crate::registry::ConstructRenderer;
use crate::session::RenderSession;
use async_trait::async_trait;
use log::trace;
use schsvg_lexer::Token;

/// Skips a construct running to a line that starts with `end`, e.g.
/// `$Bitmap` ... `$EndBitmap`.
#[derive(Debug, Clone, Copy)]
pub struct SkipBlockRenderer {
    end: &'static str,
}

impl SkipBlockRenderer {
    pub fn new(end: &'static str) -> Self {
        Self { end }
    }
}

#[async_trait]
impl ConstructRenderer for SkipBlockRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        keyword: &Token,
    ) -> Result<(), RenderError> {
        trace!("skipping {} block at {}", keyword.raw(), keyword.location());
        skip_block(session.tokenizer(), self.end).await
    }
}

/// Skips the rest of the keyword's line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipLineRenderer;

#[async_trait]
impl ConstructRenderer for SkipLineRenderer {
    async fn render(
        &self,
        session: &mut RenderSession<'_>,
        _keyword: &Token,
    ) -> Result<(), RenderError> {
        session.tokenizer().skip_to_next_line().await?;
        Ok(())
    }
}
