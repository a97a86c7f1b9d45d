// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Errors setting up a [`FileEnvironment`](crate::FileEnvironment), before
/// any rendering starts.
#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Not a schematic file path: {0}")]
    InvalidPath(PathBuf),

    #[error("Library directory does not exist: {0}")]
    MissingLibraryDir(PathBuf),
}
