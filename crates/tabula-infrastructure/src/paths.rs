//! Where Tabula keeps its files on disk.
//!
//! ```text
//! ~/.config/tabula/
//! ├── config.toml    # ClientConfig
//! ├── token.json     # bearer token (0600 on Unix)
//! └── logs/
//!     └── tabula.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

use tabula_core::{Result, TabulaError};

const APP_DIR: &str = "tabula";

/// Overrides the whole directory, mostly for tests and portable installs.
pub const CONFIG_DIR_ENV: &str = "TABULA_CONFIG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabulaPaths {
    config_dir: PathBuf,
}

impl TabulaPaths {
    /// Resolves the platform config directory (`$XDG_CONFIG_HOME/tabula` on
    /// Linux), honouring [`CONFIG_DIR_ENV`].
    pub fn resolve() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_base(PathBuf::from(dir)));
        }

        let base = dirs::config_dir()
            .ok_or_else(|| TabulaError::config("Cannot find the user config directory"))?;
        Ok(Self::with_base(base.join(APP_DIR)))
    }

    /// Uses `config_dir` as-is.
    pub fn with_base(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn token_file(&self) -> PathBuf {
        self.config_dir.join("token.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.config_dir.join("logs")
    }

    /// Creates the config and logs directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_under_base() {
        let paths = TabulaPaths::with_base("/tmp/tabula-test");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/tabula-test/config.toml"));
        assert_eq!(paths.token_file(), PathBuf::from("/tmp/tabula-test/token.json"));
        assert_eq!(paths.logs_dir(), PathBuf::from("/tmp/tabula-test/logs"));
    }

    #[test]
    fn test_ensure_dirs_creates_logs() {
        let temp_dir = TempDir::new().unwrap();
        let paths = TabulaPaths::with_base(temp_dir.path().join("nested"));

        paths.ensure_dirs().unwrap();
        assert!(paths.logs_dir().is_dir());

        // Second call is a no-op.
        paths.ensure_dirs().unwrap();
    }
}
