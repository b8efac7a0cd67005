//! Token store implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tabula_core::Result;
use tabula_core::auth::{StoredToken, TokenStore};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Keeps the token in `token.json`.
///
/// # Security Note
///
/// On Unix the file is created with mode 600.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<StoredToken>(&content) {
            Ok(token) => Ok(Some(token)),
            Err(err) => {
                // Unreadable token: treat as signed out rather than wedging every request.
                tracing::warn!("Ignoring unreadable token file {}: {}", self.path.display(), err);
                Ok(None)
            }
        }
    }

    async fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(token)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;

        #[cfg(unix)]
        {
            // `mode` only applies on creation; tighten a pre-existing file too.
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        tracing::debug!("Stored bearer token at {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("Removed {}", self.path.display());
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local store, for tests and one-shot sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<StoredToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: StoredToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>> {
        Ok(self.token.read().await.clone())
    }

    async fn save(&self, token: &StoredToken) -> Result<()> {
        *self.token.write().await = Some(token.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.token.write().await = None;
        Ok(())
    }
}
