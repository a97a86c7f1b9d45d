//! Platform abstractions for the schsvg rendering pipeline.
//!
//! Nothing in here knows about the schematic grammar. The crate defines how
//! document bytes come in ([`SourceProvider`], [`DocumentSource`]), how SVG
//! bytes go out ([`OutputSink`]) and how a request is cancelled
//! ([`Cancellation`]).

pub mod cancel;
pub mod sink;
pub mod source;

pub use cancel::{Cancellation, CancellationSource, CancelOnDrop};
pub use sink::{AsyncWriteSink, MemorySink, OutputSink};
pub use source::{
    DocumentSource, InMemorySourceProvider, SourceError, SourceProvider, SourceReader,
};
