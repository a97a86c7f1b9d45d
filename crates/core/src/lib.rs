//! # schsvg-core
//!
//! Platform-agnostic rendering of KiCad legacy schematics (`.sch`) to SVG.
//!
//! - **render**: the orchestrator; dispatch loop and failure recovery
//! - **header**: the signature, `LIBS:` and `$Descr` lines before the body
//! - **registry**: keyword to [`ConstructRenderer`] dispatch table
//! - **schematic**: one renderer per schematic construct
//! - **library**: symbol library (`.lib`) loading for component bodies
//! - **environment**: the [`RenderEnvironment`] a host implements
//!
//! ## Design Principle
//!
//! This crate does no I/O of its own. Documents come in and SVG goes out
//! through the environment, which decides where both live (memory, disk,
//! network).

pub use schsvg_lexer as lexer;
pub use schsvg_svg as svg;
pub use schsvg_traits as traits;

pub mod environment;
pub mod error;
mod fields;
pub mod header;
pub mod library;
pub mod memory;
pub mod registry;
pub mod render;
pub mod schematic;
pub mod session;
pub mod settings;
pub mod transform;

pub use environment::{FailureOutput, RenderEnvironment, RenderOutcome};
pub use error::{RenderError, RenderFailure};
pub use memory::InMemoryEnvironment;
pub use registry::{ConstructRegistry, ConstructRenderer};
pub use render::{render, render_with_registry};
pub use session::RenderSession;
pub use settings::{LengthUnit, RenderSettings};

pub use traits::{Cancellation, CancellationSource, DocumentSource, OutputSink, SourceError};
