//! Document providers for the schsvg renderer.
//!
//! This crate provides platform-specific implementations of the
//! `SourceProvider` trait from schsvg-traits.
//!
//! ## Available Providers
//!
//! - [`FilesystemSourceProvider`]: Opens documents below a base directory
//! - [`HttpSourceProvider`]: Fetches documents from `http`/`https` URLs
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the in-memory provider from schsvg-traits:
//! - [`InMemorySourceProvider`]: Pre-populated in-memory storage

mod filesystem;
mod http;

pub use filesystem::FilesystemSourceProvider;
pub use http::HttpSourceProvider;

pub use schsvg_traits::InMemorySourceProvider;
