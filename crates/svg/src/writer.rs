use crate::error::WriterError;
use log::trace;
use quick_xml::escape::escape;
use schsvg_traits::{Cancellation, OutputSink};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

const DEFAULT_FLUSH_THRESHOLD: usize = 16 * 1024;

/// Lifecycle of the root element of a document writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    NotStarted,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterMode {
    /// Exactly one root element, streamed to a sink.
    Document,
    /// Any number of top-level elements, kept in memory.
    Fragment,
}

#[derive(Debug)]
struct Frame {
    name: String,
    inherited: HashMap<String, String>,
    written: HashSet<String>,
    start_tag_open: bool,
}

impl Frame {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inherited: HashMap::new(),
            written: HashSet::new(),
            start_tag_open: true,
        }
    }
}

/// Forward-only SVG writer.
///
/// Calls are synchronous and append to an internal buffer; only
/// [`flush`](Self::flush) touches the sink.
pub struct SvgWriter {
    mode: WriterMode,
    state: WriterState,
    frames: Vec<Frame>,
    /// Inherited values in effect outside any element, e.g. for a capture
    /// that will be spliced into an existing group.
    context: HashMap<String, String>,
    buffer: String,
    sink: Option<Box<dyn OutputSink>>,
    cancel: Cancellation,
    bytes_written: u64,
    flush_threshold: usize,
}

impl fmt::Debug for SvgWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvgWriter")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("depth", &self.frames.len())
            .field("buffered", &self.buffer.len())
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

impl SvgWriter {
    /// A writer for a complete document, streamed into `sink`.
    pub fn document(sink: Box<dyn OutputSink>, cancel: Cancellation) -> Self {
        Self {
            mode: WriterMode::Document,
            state: WriterState::NotStarted,
            frames: Vec::new(),
            context: HashMap::new(),
            buffer: String::new(),
            sink: Some(sink),
            cancel,
            bytes_written: 0,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }

    /// An in-memory writer for markup that is later spliced elsewhere.
    pub fn fragment() -> Self {
        Self {
            mode: WriterMode::Fragment,
            state: WriterState::NotStarted,
            frames: Vec::new(),
            context: HashMap::new(),
            buffer: String::new(),
            sink: None,
            cancel: Cancellation::never(),
            bytes_written: 0,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }

    /// A fragment writer that sees `parent`'s current inherited values, so
    /// that redundant attributes are elided in the captured markup too.
    pub fn fragment_within(parent: &SvgWriter) -> Self {
        let mut writer = Self::fragment();
        writer.context = parent.visible_values();
        writer
    }

    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold;
        self
    }

    pub fn mode(&self) -> WriterMode {
        self.mode
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Bytes handed to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// True once any byte has reached the sink.
    pub fn has_output_started(&self) -> bool {
        self.bytes_written > 0
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_root_open(&self) -> bool {
        self.state == WriterState::Open
    }

    /// The value of an inherited attribute as seen by the innermost open
    /// element.
    pub fn inherited_value(&self, name: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.inherited.get(name))
            .or_else(|| self.context.get(name))
            .map(String::as_str)
    }

    fn visible_values(&self) -> HashMap<String, String> {
        let mut values = self.context.clone();
        for frame in &self.frames {
            values.extend(frame.inherited.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        values
    }

    pub fn start_element(&mut self, name: &str) -> Result<(), WriterError> {
        if self.mode == WriterMode::Document && self.frames.is_empty() {
            if self.state != WriterState::NotStarted {
                return Err(WriterError::SecondRoot {
                    name: name.to_string(),
                });
            }
            self.state = WriterState::Open;
        }
        self.close_start_tag();
        self.buffer.push('<');
        self.buffer.push_str(name);
        self.frames.push(Frame::new(name));
        Ok(())
    }

    /// Writes a presentation attribute that descendants inherit. Nothing is
    /// emitted when the inherited value already matches.
    pub fn write_inherited_attribute(&mut self, name: &str, value: &str) -> Result<(), WriterError> {
        self.check_attribute(name)?;
        let redundant = self.inherited_value(name) == Some(value);
        if let Some(frame) = self.frames.last_mut() {
            frame.written.insert(name.to_string());
            frame.inherited.insert(name.to_string(), value.to_string());
        }
        if !redundant {
            self.push_attribute(name, value);
        }
        Ok(())
    }

    pub fn write_non_inherited_attribute(
        &mut self,
        name: &str,
        value: &str,
    ) -> Result<(), WriterError> {
        self.check_attribute(name)?;
        if let Some(frame) = self.frames.last_mut() {
            frame.written.insert(name.to_string());
        }
        self.push_attribute(name, value);
        Ok(())
    }

    fn check_attribute(&self, name: &str) -> Result<(), WriterError> {
        let frame = self.frames.last().ok_or(WriterError::NoOpenElement {
            operation: "write an attribute",
        })?;
        if !frame.start_tag_open {
            return Err(WriterError::AttributeAfterContent {
                name: name.to_string(),
            });
        }
        if frame.written.contains(name) {
            return Err(WriterError::DuplicateAttribute {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn push_attribute(&mut self, name: &str, value: &str) {
        self.buffer.push(' ');
        self.buffer.push_str(name);
        self.buffer.push_str("=\"");
        self.buffer.push_str(&escape(value));
        self.buffer.push('"');
    }

    pub fn write_text(&mut self, text: &str) -> Result<(), WriterError> {
        if self.frames.is_empty() {
            return Err(WriterError::NoOpenElement {
                operation: "write text",
            });
        }
        self.close_start_tag();
        self.buffer.push_str(&escape(text));
        Ok(())
    }

    /// Writes an XML comment. Allowed anywhere, including after the root
    /// element has been closed.
    pub fn write_comment(&mut self, text: &str) {
        self.close_start_tag();
        let mut body = text.to_string();
        while body.contains("--") {
            body = body.replace("--", "- -");
        }
        if body.ends_with('-') {
            body.push(' ');
        }
        self.buffer.push_str("<!--");
        self.buffer.push_str(&body);
        self.buffer.push_str("-->");
    }

    /// Appends markup produced by a fragment writer inside the current
    /// element.
    pub fn write_markup(&mut self, markup: &str) -> Result<(), WriterError> {
        if self.frames.is_empty() && self.mode == WriterMode::Document {
            return Err(WriterError::NoOpenElement {
                operation: "write markup",
            });
        }
        self.close_start_tag();
        self.buffer.push_str(markup);
        Ok(())
    }

    pub fn end_element(&mut self) -> Result<(), WriterError> {
        let frame = self.frames.pop().ok_or(WriterError::NoOpenElement {
            operation: "end an element",
        })?;
        if frame.start_tag_open {
            self.buffer.push_str("/>");
        } else {
            self.buffer.push_str("</");
            self.buffer.push_str(&frame.name);
            self.buffer.push('>');
        }
        if self.mode == WriterMode::Document {
            match self.frames.len() {
                0 => self.state = WriterState::Closed,
                1 => self.buffer.push('\n'),
                _ => {}
            }
        }
        Ok(())
    }

    /// Ends every open element.
    pub fn end_all(&mut self) -> Result<(), WriterError> {
        while !self.frames.is_empty() {
            self.end_element()?;
        }
        Ok(())
    }

    fn close_start_tag(&mut self) {
        if let Some(frame) = self.frames.last_mut()
            && frame.start_tag_open
        {
            frame.start_tag_open = false;
            self.buffer.push('>');
            if self.mode == WriterMode::Document && self.frames.len() == 1 {
                self.buffer.push('\n');
            }
        }
    }

    /// Hands buffered markup to the sink. Fragment writers keep their
    /// buffer.
    pub async fn flush(&mut self) -> Result<(), WriterError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        if self.buffer.is_empty() {
            return Ok(());
        }
        if self.cancel.is_cancelled() {
            return Err(WriterError::Cancelled);
        }
        let bytes = self.buffer.as_bytes();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(WriterError::Cancelled),
            result = async {
                sink.write_all(bytes).await?;
                sink.flush().await
            } => result?,
        }
        trace!("flushed {} bytes", bytes.len());
        self.bytes_written += bytes.len() as u64;
        self.buffer.clear();
        Ok(())
    }

    /// Flushes once the buffer has grown past the threshold.
    pub async fn flush_if_full(&mut self) -> Result<(), WriterError> {
        if self.buffer.len() >= self.flush_threshold {
            self.flush().await?;
        }
        Ok(())
    }

    /// The markup accumulated so far, leaving the writer empty.
    pub fn take_markup(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    pub fn into_markup(mut self) -> String {
        self.take_markup()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schsvg_traits::{CancellationSource, MemorySink};

    fn document() -> (SvgWriter, MemorySink) {
        let capture = MemorySink::new();
        let writer = SvgWriter::document(Box::new(capture.clone()), Cancellation::never());
        (writer, capture)
    }

    #[test]
    fn test_inherited_attribute_elided_when_unchanged() {
        let mut writer = SvgWriter::fragment();
        writer.start_element("g").unwrap();
        writer.write_inherited_attribute("stroke", "red").unwrap();
        writer.start_element("line").unwrap();
        writer.write_inherited_attribute("stroke", "red").unwrap();
        writer.end_element().unwrap();
        writer.start_element("line").unwrap();
        writer.write_inherited_attribute("stroke", "blue").unwrap();
        writer.end_element().unwrap();
        writer.end_element().unwrap();

        assert_eq!(
            writer.into_markup(),
            r#"<g stroke="red"><line/><line stroke="blue"/></g>"#
        );
    }

    #[test]
    fn test_inherited_value_is_nearest_ancestor_or_self() {
        let mut writer = SvgWriter::fragment();
        writer.start_element("g").unwrap();
        writer.write_inherited_attribute("fill", "none").unwrap();
        writer.start_element("g").unwrap();
        assert_eq!(writer.inherited_value("fill"), Some("none"));
        writer.write_inherited_attribute("fill", "red").unwrap();
        assert_eq!(writer.inherited_value("fill"), Some("red"));
        writer.end_element().unwrap();
        assert_eq!(writer.inherited_value("fill"), Some("none"));
        writer.end_element().unwrap();
        assert_eq!(writer.inherited_value("fill"), None);
    }

    #[test]
    fn test_non_inherited_attribute_always_written() {
        let mut writer = SvgWriter::fragment();
        writer.start_element("g").unwrap();
        writer.write_non_inherited_attribute("class", "wire").unwrap();
        writer.start_element("line").unwrap();
        writer.write_non_inherited_attribute("class", "wire").unwrap();
        writer.end_all().unwrap();
        assert_eq!(
            writer.into_markup(),
            r#"<g class="wire"><line class="wire"/></g>"#
        );
    }

    #[test]
    fn test_structural_misuse_is_rejected() {
        let mut writer = SvgWriter::fragment();
        assert!(matches!(
            writer.end_element(),
            Err(WriterError::NoOpenElement { .. })
        ));
        writer.start_element("text").unwrap();
        writer.write_non_inherited_attribute("x", "1").unwrap();
        assert!(matches!(
            writer.write_non_inherited_attribute("x", "2"),
            Err(WriterError::DuplicateAttribute { .. })
        ));
        writer.write_text("R1").unwrap();
        assert!(matches!(
            writer.write_inherited_attribute("fill", "red"),
            Err(WriterError::AttributeAfterContent { .. })
        ));
    }

    #[test]
    fn test_escaping() {
        let mut writer = SvgWriter::fragment();
        writer.start_element("text").unwrap();
        writer
            .write_non_inherited_attribute("data-name", "a\"b<c")
            .unwrap();
        writer.write_text("R&D <1>").unwrap();
        writer.end_element().unwrap();
        writer.write_comment("a -- b --");

        let markup = writer.into_markup();
        assert!(markup.contains("a&quot;b&lt;c"));
        assert!(markup.contains("R&amp;D &lt;1&gt;"));
        assert!(markup.ends_with("<!--a - - b - - -->"));
    }

    #[test]
    fn test_document_state_and_single_root() {
        let (mut writer, _) = document();
        assert_eq!(writer.state(), WriterState::NotStarted);
        writer.start_element("svg").unwrap();
        assert_eq!(writer.state(), WriterState::Open);
        writer.end_element().unwrap();
        assert_eq!(writer.state(), WriterState::Closed);
        assert!(matches!(
            writer.start_element("svg"),
            Err(WriterError::SecondRoot { .. })
        ));
    }

    #[test]
    fn test_fragment_allows_several_top_level_elements() {
        let mut writer = SvgWriter::fragment();
        writer.start_element("line").unwrap();
        writer.end_element().unwrap();
        writer.start_element("circle").unwrap();
        writer.end_element().unwrap();
        assert_eq!(writer.state(), WriterState::NotStarted);
        assert_eq!(writer.into_markup(), "<line/><circle/>");
    }

    #[test]
    fn test_fragment_within_sees_parent_values() {
        let mut parent = SvgWriter::fragment();
        parent.start_element("g").unwrap();
        parent.write_inherited_attribute("stroke", "green").unwrap();

        let mut capture = SvgWriter::fragment_within(&parent);
        capture.start_element("line").unwrap();
        capture.write_inherited_attribute("stroke", "green").unwrap();
        capture.end_element().unwrap();
        let markup = capture.into_markup();
        assert_eq!(markup, "<line/>");

        parent.write_markup(&markup).unwrap();
        parent.end_element().unwrap();
        assert_eq!(parent.into_markup(), r#"<g stroke="green"><line/></g>"#);
    }

    #[tokio::test]
    async fn test_flush_moves_buffer_to_sink() {
        let (mut writer, capture) = document();
        writer.start_element("svg").unwrap();
        writer
            .write_non_inherited_attribute("xmlns", SVG_NAMESPACE)
            .unwrap();
        assert!(capture.is_empty());
        assert!(!writer.has_output_started());

        writer.flush().await.unwrap();
        assert!(writer.has_output_started());
        assert_eq!(writer.buffered_len(), 0);

        writer.start_element("line").unwrap();
        writer.end_element().unwrap();
        writer.end_element().unwrap();
        writer.flush().await.unwrap();

        let svg = capture.contents_string();
        assert_eq!(writer.bytes_written(), svg.len() as u64);
        let doc = roxmltree::Document::parse(&svg).unwrap();
        assert_eq!(doc.root_element().tag_name().name(), "svg");
        assert_eq!(doc.root_element().children().filter(|n| n.is_element()).count(), 1);
    }

    #[tokio::test]
    async fn test_flush_if_full_respects_threshold() {
        let (writer, capture) = document();
        let mut writer = writer.with_flush_threshold(64);
        writer.start_element("svg").unwrap();
        writer.flush_if_full().await.unwrap();
        assert!(capture.is_empty());
        for _ in 0..8 {
            writer.start_element("line").unwrap();
            writer.write_non_inherited_attribute("x1", "100").unwrap();
            writer.end_element().unwrap();
        }
        writer.flush_if_full().await.unwrap();
        assert!(!capture.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_flush_reports_cancellation() {
        let source = CancellationSource::new();
        let mut writer = SvgWriter::document(Box::new(MemorySink::new()), source.token());
        writer.start_element("svg").unwrap();
        source.cancel();
        assert!(matches!(writer.flush().await, Err(WriterError::Cancelled)));
        writer.end_element().unwrap();
    }
}
