//! JSON snapshot files with file locking.
//!
//! Used by the local store and local auth backends to keep their state on
//! disk between runs. Writers hold a [`FileLock`] across reload, mutate and
//! save so concurrent processes do not overwrite each other's changes.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Exclusive lock on the `<snapshot>.lock` sidecar file, released on drop
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until no other writer holds the lock for `snapshot`
    pub fn acquire(snapshot: &Path) -> Result<Self> {
        let mut name = snapshot.as_os_str().to_os_string();
        name.push(".lock");
        let path = PathBuf::from(name);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        tracing::debug!("Acquired {:?}", path);
        Ok(Self { file, path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release {:?}: {}", self.path, e);
        }
    }
}

/// Load a snapshot from a file with shared locking
///
/// Returns the default value if the file doesn't exist.
/// If the file is unreadable or corrupted, logs a warning and returns the
/// default value.
pub fn load_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::info!("No snapshot at {:?}, starting empty", path);
        return Ok(T::default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Starting empty.", path, e);
            return Ok(T::default());
        }
    };

    // Acquire shared lock for reading
    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Starting empty.", path, e);
        return Ok(T::default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {:?}: {}. Starting empty.", path, e);
        return Ok(T::default());
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded snapshot from {:?}", path);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Starting empty.", path, e);
            Ok(T::default())
        }
    }
}

/// Save a snapshot to a file
///
/// Readers never see a partial file. Concurrent writers must hold the
/// snapshot's [`FileLock`]. Atomically writes by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved snapshot to {:?}", path);
    Ok(())
}
