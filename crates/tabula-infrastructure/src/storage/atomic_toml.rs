//! Crash-safe TOML documents.
//!
//! Writes go to a hidden sibling file which is fsynced and renamed over the
//! target, so readers see either the old or the new document. Read-modify-write
//! cycles additionally hold an exclusive `fs2` lock on `<name>.lock`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tabula_core::{Result, TabulaError};

pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. A missing or blank file yields `None`.
    pub fn load(&self) -> Result<Option<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        toml::from_str(&content).map(Some).map_err(|e| TabulaError::Serialization {
            format: "TOML".into(),
            message: format!("{}: {}", self.path.display(), e),
        })
    }

    /// Replaces the document in one rename.
    pub fn save(&self, value: &T) -> Result<()> {
        let parent = self.parent_dir()?;
        fs::create_dir_all(parent)?;

        let rendered = toml::to_string_pretty(value)?;
        let staging = self.staging_path()?;

        {
            let mut file = File::create(&staging)?;
            file.write_all(rendered.as_bytes())?;
            file.sync_all()?;
        }

        if let Err(err) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }

        tracing::debug!("Wrote {}", self.path.display());
        Ok(())
    }

    /// Loads (or starts from `initial`), applies `edit`, and saves, all under
    /// the exclusive lock. Nothing is written when `edit` fails.
    pub fn update<F>(&self, initial: T, edit: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let _lock = LockGuard::acquire(&self.path)?;

        let mut value = self.load()?.unwrap_or(initial);
        edit(&mut value)?;
        self.save(&value)?;
        Ok(value)
    }

    fn parent_dir(&self) -> Result<&Path> {
        self.path
            .parent()
            .ok_or_else(|| TabulaError::io(format!("{} has no parent directory", self.path.display())))
    }

    fn staging_path(&self) -> Result<PathBuf> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| TabulaError::io(format!("{} has no file name", self.path.display())))?;
        Ok(self.parent_dir()?.join(format!(".{}.tmp", name.to_string_lossy())))
    }
}

/// Exclusive advisory lock, released and cleaned up on drop.
struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    fn acquire(target: &Path) -> Result<Self> {
        let path = target.with_extension("lock");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.lock_exclusive()
            .map_err(|e| TabulaError::io(format!("Failed to lock {}: {}", path.display(), e)))?;

        Ok(Self { file, path })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = fs::remove_file(&self.path);
    }
}
