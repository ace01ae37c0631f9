use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::EngineError;

pub const OVERRIDES_EXPORT_FILE: &str = "catalog-overrides.json";
pub const INVENTORY_EXPORT_FILE: &str = "inventory.json";

/// Destination for exported documents (a download folder, a test buffer).
pub trait FileSink {
    fn deliver(&mut self, file_name: &str, contents: &str) -> Result<(), EngineError>;
}

/// Writes each export as a file inside one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn deliver(&mut self, file_name: &str, contents: &str) -> Result<(), EngineError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        fs::write(&path, contents)?;
        info!(path = %path.display(), bytes = contents.len(), "export written");
        Ok(())
    }
}

/// Keeps delivered files in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Vec<(String, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest contents delivered under `file_name`.
    pub fn file(&self, file_name: &str) -> Option<&str> {
        self.files
            .iter()
            .rev()
            .find(|(name, _)| name == file_name)
            .map(|(_, contents)| contents.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSink for MemorySink {
    fn deliver(&mut self, file_name: &str, contents: &str) -> Result<(), EngineError> {
        self.files.push((file_name.to_string(), contents.to_string()));
        Ok(())
    }
}

/// Read a user-selected import file into text.
pub fn read_document(path: impl AsRef<Path>) -> Result<String, EngineError> {
    Ok(fs::read_to_string(path)?)
}
