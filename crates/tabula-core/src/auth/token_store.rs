//! Token store trait.
//!
//! Defines where the bearer token lives between runs.

use async_trait::async_trait;

use super::model::StoredToken;
use crate::error::Result;

/// Persistence for the bearer token.
///
/// # Security Note
///
/// Implementations must never log the token itself.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, `None` if signed out.
    async fn load(&self) -> Result<Option<StoredToken>>;

    async fn save(&self, token: &StoredToken) -> Result<()>;

    /// Removes the token. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<()>;
}
