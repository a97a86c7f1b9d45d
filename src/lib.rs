//! # schsvg
//!
//! Renders KiCad legacy schematics (`.sch`) to SVG.
//!
//! The rendering engine lives in `schsvg-core`; this crate adds the
//! filesystem [`FileEnvironment`] and the `schsvg` command-line tool.
//!
//! ```no_run
//! use schsvg::{Cancellation, FileEnvironment, OutputTarget, render};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let environment = FileEnvironment::new(
//!     "board/main.sch",
//!     OutputTarget::File("main.svg".into()),
//! )?;
//! render(&environment, Cancellation::never()).await?;
//! # Ok(())
//! # }
//! ```

pub mod environment;
pub mod error;

pub use environment::{FileEnvironment, OutputTarget};
pub use error::EnvironmentError;

pub use schsvg_core::{
    Cancellation, CancellationSource, ConstructRegistry, ConstructRenderer, InMemoryEnvironment,
    LengthUnit, RenderEnvironment, RenderError, RenderFailure, RenderOutcome, RenderSettings,
    render, render_with_registry,
};
