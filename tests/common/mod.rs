pub mod fixtures;

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A temporary project directory holding a schematic and its libraries.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn write(&self, name: &str, text: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, text)?;
        Ok(path)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Parses `svg` and returns the `class` of every element that has one.
pub fn classes(svg: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(svg).expect("output is well-formed XML");
    doc.descendants()
        .filter_map(|n| n.attribute("class").map(str::to_string))
        .collect()
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("output file exists")
}
