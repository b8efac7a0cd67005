//! Loads and saves `config.toml`.
//!
//! The file is optional; every missing key falls back to its default. Two
//! environment variables win over the file:
//!
//! | Variable                  | Field                     |
//! |---------------------------|---------------------------|
//! | `TABULA_API_URL`          | `api.base_url`            |
//! | `TABULA_MAX_UPLOAD_BYTES` | `upload.max_size_bytes`   |

use std::sync::RwLock;

use tabula_core::config::ClientConfig;
use tabula_core::{Result, TabulaError};

use crate::paths::TabulaPaths;
use crate::storage::AtomicTomlFile;

pub const API_URL_ENV: &str = "TABULA_API_URL";
pub const MAX_UPLOAD_BYTES_ENV: &str = "TABULA_MAX_UPLOAD_BYTES";

pub struct ConfigService {
    file: AtomicTomlFile<ClientConfig>,
    cached: RwLock<Option<ClientConfig>>,
}

impl ConfigService {
    pub fn new(paths: &TabulaPaths) -> Self {
        Self {
            file: AtomicTomlFile::new(paths.config_file()),
            cached: RwLock::new(None),
        }
    }

    /// The effective configuration: file contents, then environment overrides.
    pub fn load(&self) -> Result<ClientConfig> {
        if let Some(config) = self.read_cache() {
            return Ok(config);
        }

        let mut config = self.load_file()?;
        apply_overrides(&mut config, |name| std::env::var(name).ok())?;

        self.write_cache(Some(config.clone()));
        Ok(config)
    }

    /// The configuration as stored on disk, without environment overrides.
    pub fn load_file(&self) -> Result<ClientConfig> {
        Ok(self.file.load()?.unwrap_or_default())
    }

    pub fn save(&self, config: &ClientConfig) -> Result<()> {
        self.file.save(config)?;
        self.write_cache(None);
        tracing::info!("Saved configuration to {}", self.file.path().display());
        Ok(())
    }

    /// Edits the stored file under lock.
    pub fn update<F>(&self, edit: F) -> Result<ClientConfig>
    where
        F: FnOnce(&mut ClientConfig) -> Result<()>,
    {
        let updated = self.file.update(ClientConfig::default(), edit)?;
        self.write_cache(None);
        Ok(updated)
    }

    /// Drops the cached value so the next `load` reads the file again.
    pub fn invalidate_cache(&self) {
        self.write_cache(None);
    }

    fn read_cache(&self) -> Option<ClientConfig> {
        match self.cached.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_cache(&self, value: Option<ClientConfig>) {
        match self.cached.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

/// Applies environment overrides read through `var`.
pub fn apply_overrides<F>(config: &mut ClientConfig, var: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = var(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
        tracing::debug!("{} overrides api.base_url", API_URL_ENV);
        config.api.base_url = url.trim().to_string();
    }

    if let Some(raw) = var(MAX_UPLOAD_BYTES_ENV).filter(|v| !v.trim().is_empty()) {
        let bytes = raw.trim().parse::<u64>().map_err(|_| {
            TabulaError::config(format!(
                "{} must be a whole number of bytes, got '{}'",
                MAX_UPLOAD_BYTES_ENV, raw
            ))
        })?;
        config.upload.max_size_bytes = bytes;
    }

    Ok(())
}
