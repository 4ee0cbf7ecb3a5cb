//! JSON-file persistence shared by every store.
//!
//! Each store owns one document and rewrites it whole on every change. Writes
//! go to a uniquely named sibling temp file that is renamed over the target, so a crash
//! mid-write leaves the previous document in place. Nothing coordinates
//! separate processes: two invocations doing read-modify-write on the same
//! file race and the last writer wins.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{MonetaError, Result};

/// Outcome of reading a store document from disk.
#[derive(Debug)]
pub enum Loaded<T> {
    Missing,
    Parsed(T),
    Corrupt(String),
}

impl<T> Loaded<T> {
    /// Collapses the outcome into a document plus the load-error message, if any.
    pub fn or_else(self, default: impl FnOnce() -> T) -> (T, Option<String>) {
        match self {
            Loaded::Parsed(doc) => (doc, None),
            Loaded::Missing => (default(), None),
            Loaded::Corrupt(msg) => (default(), Some(msg)),
        }
    }
}

/// Creates `dir` and any missing parents. Idempotent.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(MonetaError::Io(std::io::Error::other(format!(
            "{} exists and is not a directory",
            dir.display()
        ))));
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Loaded<T> {
    log::debug!("Loading {}", path.display());
    if let Some(parent) = path.parent() {
        if let Err(e) = ensure_directory(parent) {
            log::warn!("Could not prepare {}: {e}", parent.display());
        }
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Loaded::Missing,
        Err(e) => {
            let msg = format!("Could not read {}: {e}", path.display());
            log::warn!("{msg}");
            return Loaded::Corrupt(msg);
        }
    };
    match serde_json::from_str(&content) {
        Ok(doc) => Loaded::Parsed(doc),
        Err(e) => {
            let msg = format!("{} is not a valid document ({e}); starting fresh", path.display());
            log::warn!("{msg}");
            Loaded::Corrupt(msg)
        }
    }
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, doc: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_directory(parent)?;
    let json = serde_json::to_string_pretty(doc)?;

    // unique per writer and created 0o600 on unix
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(format!("{json}\n").as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    log::debug!("Saved {}", path.display());
    Ok(())
}
