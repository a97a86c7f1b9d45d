//! # schsvg-svg
//!
//! A forward-only SVG writer. Markup is built in memory and handed to an
//! [`OutputSink`](schsvg_traits::OutputSink) on [`SvgWriter::flush`].
//!
//! Presentation attributes written with
//! [`SvgWriter::write_inherited_attribute`] are only emitted when they change
//! the value an element would otherwise inherit from its ancestors.

pub mod error;
pub mod format;
pub mod stack;
pub mod writer;

pub use error::WriterError;
pub use format::{format_length, format_number};
pub use stack::WriterStack;
pub use writer::{SVG_NAMESPACE, SvgWriter, WriterMode, WriterState};
