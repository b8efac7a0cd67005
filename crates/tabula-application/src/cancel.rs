//! Racing backend calls against a flow's cancellation token.

use std::future::Future;

use tabula_core::{Result, TabulaError};
use tokio_util::sync::CancellationToken;

/// Resolves to `Err(Cancelled)` as soon as `token` fires, dropping `call`.
///
/// Callers must not touch flow state after a `Cancelled` result.
pub async fn run_cancellable<T, F>(token: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if token.is_cancelled() {
        return Err(TabulaError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(TabulaError::Cancelled),
        result = call => result,
    }
}
