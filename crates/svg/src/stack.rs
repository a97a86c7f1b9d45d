use crate::error::WriterError;
use crate::writer::SvgWriter;

/// Redirectable output: the most recently pushed writer receives all
/// markup until it is popped again.
///
/// The base writer is always present and cannot be popped.
#[derive(Debug)]
pub struct WriterStack {
    base: SvgWriter,
    redirected: Vec<SvgWriter>,
}

impl WriterStack {
    pub fn new(base: SvgWriter) -> Self {
        Self {
            base,
            redirected: Vec::new(),
        }
    }

    /// Suspends the active writer, leaving it open, and activates `writer`.
    pub fn push(&mut self, writer: SvgWriter) {
        self.redirected.push(writer);
    }

    /// Removes the active writer and reactivates the one below it.
    pub fn pop(&mut self) -> Result<SvgWriter, WriterError> {
        self.redirected.pop().ok_or(WriterError::BaseWriter)
    }

    pub fn current(&self) -> &SvgWriter {
        self.redirected.last().unwrap_or(&self.base)
    }

    pub fn current_mut(&mut self) -> &mut SvgWriter {
        self.redirected.last_mut().unwrap_or(&mut self.base)
    }

    pub fn base(&self) -> &SvgWriter {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut SvgWriter {
        &mut self.base
    }

    /// Number of writers above the base.
    pub fn depth(&self) -> usize {
        self.redirected.len()
    }

    /// Drops any redirected writers and returns the base.
    pub fn into_base(self) -> SvgWriter {
        self.base
    }
}
