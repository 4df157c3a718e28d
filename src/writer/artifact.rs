use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::GenerateError;

/// Destination of generated artifacts
pub trait ArtifactWriter {
    /// Write `content` to `path`, creating parent directories as needed
    fn write_file(&mut self, path: &Path, content: &str) -> Result<(), GenerateError>;
}

/// Writes artifacts to the filesystem
#[derive(Debug, Default)]
pub struct FsWriter {
    written: Vec<PathBuf>,
}

impl FsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths written so far, in write order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactWriter for FsWriter {
    fn write_file(&mut self, path: &Path, content: &str) -> Result<(), GenerateError> {
        let wrap = |source| GenerateError::Write {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(wrap)?;

        // readers never see a partial artifact; the temp file is removed on failure
        let mut tmp = NamedTempFile::new_in(parent).map_err(wrap)?;
        tmp.write_all(content.as_bytes()).map_err(wrap)?;
        tmp.persist(path).map_err(|e| wrap(e.error))?;

        self.written.push(path.to_path_buf());
        Ok(())
    }
}

/// Keeps artifacts in memory
#[derive(Debug, Default)]
pub struct MemoryWriter {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &BTreeMap<PathBuf, String> {
        &self.files
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }
}

impl ArtifactWriter for MemoryWriter {
    fn write_file(&mut self, path: &Path, content: &str) -> Result<(), GenerateError> {
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}
