//! The host side of a render: where documents come from and where SVG goes.

use crate::error::RenderError;
use crate::settings::RenderSettings;
use async_trait::async_trait;
use log::debug;
use schsvg_svg::{SvgWriter, WriterError, format_number};
use schsvg_traits::{Cancellation, DocumentSource, OutputSink, SourceError};

const ERROR_COLOR: &str = "rgb(255,0,0)";
const GENERIC_FAILURE: &str = "Rendering failed";

/// Result of a render that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered { bytes_written: u64 },
    /// The caller's validator matched the document; nothing was written.
    NotModified,
}

/// Everything a render needs from its host.
///
/// # Implementations
///
/// - [`InMemoryEnvironment`](crate::InMemoryEnvironment): inline documents,
///   output captured in memory
/// - `FileEnvironment` (schsvg): files on disk
/// - `HttpRenderEnvironment` (schsvg-service): fetched documents, streamed
///   responses
#[async_trait]
pub trait RenderEnvironment: Send + Sync {
    /// Opens the root schematic.
    async fn create_source(&self, cancel: &Cancellation) -> Result<DocumentSource, SourceError>;

    /// Opens the library file `name` (e.g. `device.lib`) declared by the root.
    async fn create_library_source(
        &self,
        name: &str,
        cancel: &Cancellation,
    ) -> Result<DocumentSource, SourceError>;

    async fn create_sink(&self, cancel: &Cancellation) -> Result<Box<dyn OutputSink>, RenderError>;

    fn render_settings(&self) -> RenderSettings {
        RenderSettings::default()
    }

    /// A validator the caller already holds, e.g. from `If-None-Match`.
    fn request_validator(&self) -> Option<String> {
        None
    }

    fn set_response_validator(&self, _validator: &str) {}

    /// Whether a validator match should end the render with
    /// [`RenderOutcome::NotModified`].
    fn handle_matching_validators(&self) -> bool {
        false
    }

    /// Called once when a render fails. Returns true when the environment
    /// reported the error to its caller itself.
    async fn handle_error(&self, error: &RenderError, output: &mut FailureOutput<'_>) -> bool {
        if let Err(err) = output.recover_in_band(error).await {
            debug!("in-band error annotation failed: {err}");
        }
        false
    }
}

/// The output side of a failed render.
#[derive(Debug)]
pub struct FailureOutput<'a> {
    writer: Option<&'a mut SvgWriter>,
    error_font_size: f64,
}

impl<'a> FailureOutput<'a> {
    pub fn new(writer: Option<&'a mut SvgWriter>, error_font_size: f64) -> Self {
        Self {
            writer,
            error_font_size,
        }
    }

    /// True once any byte has reached the sink.
    pub fn has_output_started(&self) -> bool {
        self.writer
            .as_ref()
            .is_some_and(|writer| writer.has_output_started())
    }

    pub fn writer(&mut self) -> Option<&mut SvgWriter> {
        self.writer.as_deref_mut()
    }

    /// Appends the error to output that has already started, then flushes.
    /// Does nothing when no output has reached the sink yet or when the
    /// render was cancelled.
    ///
    /// Only input errors carry their message into the output. With the root
    /// element still open the message becomes a red `<text>` and the
    /// document is closed; otherwise it becomes a trailing comment. Any
    /// other failure leaves a generic comment.
    pub async fn recover_in_band(&mut self, error: &RenderError) -> Result<(), WriterError> {
        if !self.has_output_started() || error.is_cancelled() {
            return Ok(());
        }
        let font_size = format_number(self.error_font_size);
        let Some(writer) = self.writer.as_deref_mut() else {
            return Ok(());
        };

        if writer.is_root_open() {
            while writer.depth() > 1 {
                writer.end_element()?;
            }
            if error.is_user_facing() {
                writer.start_element("text")?;
                writer.write_non_inherited_attribute("class", "error")?;
                writer.write_non_inherited_attribute("x", "0")?;
                writer.write_non_inherited_attribute("y", "100")?;
                writer.write_inherited_attribute("fill", ERROR_COLOR)?;
                writer.write_inherited_attribute("font-size", &font_size)?;
                writer.write_text(&error.to_string())?;
                writer.end_element()?;
            } else {
                writer.write_comment(GENERIC_FAILURE);
            }
            writer.end_all()?;
        } else if error.is_user_facing() {
            writer.write_comment(&error.to_string());
        } else {
            writer.write_comment(GENERIC_FAILURE);
        }
        writer.flush().await
    }
}
