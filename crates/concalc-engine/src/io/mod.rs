//! Thin collaborators around the editing core: key-value persistence, file
//! export and the clipboard. None of their failures is fatal to a session.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Key-value persistence of the buffer.
pub trait Store {
    /// `Ok(None)` when nothing was stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, IoError>;
    fn put(&mut self, key: &str, text: &str) -> Result<(), IoError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, IoError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, text: &str) -> Result<(), IoError> {
        (**self).put(key, text)
    }
}

/// Write-only clipboard.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), IoError>;
}

/// One `<key>.txt` file per key under a state directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, IoError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(IoError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.txt")))
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, IoError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(IoError::Io(err)),
        }
    }

    fn put(&mut self, key: &str, text: &str) -> Result<(), IoError> {
        let path = self.path_for(key)?;
        write_file(&path, text)
    }
}

/// In-memory store; `fail_writes` makes every `put` fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn with_entry(key: &str, text: &str) -> Self {
        let mut store = Self::default();
        store.entries.insert(key.to_string(), text.to_string());
        store
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, IoError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, text: &str) -> Result<(), IoError> {
        if self.fail_writes {
            return Err(IoError::Unavailable("writes disabled".to_string()));
        }
        self.entries.insert(key.to_string(), text.to_string());
        Ok(())
    }
}

/// Read a whole text file
pub fn read_file(path: &Path) -> Result<String, IoError> {
    fs::read_to_string(path).map_err(IoError::Io)
}

/// Write a text file, creating parent directories
pub fn write_file(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, content).map_err(IoError::Io)
}

/// Save the buffer as a plain text file
pub fn export_to_file(path: &Path, text: &str) -> Result<(), IoError> {
    write_file(path, text)
}

/// Write to the clipboard, absorbing failure. Returns whether it worked.
pub fn write_clipboard(clipboard: &mut dyn Clipboard, text: &str) -> bool {
    match clipboard.write_text(text) {
        Ok(()) => true,
        Err(err) => {
            warn!("Clipboard write failed: {err}");
            false
        }
    }
}
