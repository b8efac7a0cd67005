pub mod analyze;
pub mod auth;
pub mod chat;
pub mod compare;
pub mod config;
pub mod files;
pub mod projects;

use std::path::Path;

use anyhow::{Context, Result};
use tabula_core::analysis::SelectedFile;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Reads a local file into the shape the upload flows accept.
pub async fn read_selected_file(path: &str) -> Result<SelectedFile> {
    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", path))?
        .to_string();
    let contents = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    Ok(SelectedFile::new(name, None, contents))
}

/// Cancels `token` on Ctrl-C. Abort the handle once the guarded work is done.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            token.cancel();
        }
    })
}

pub fn stdin_lines() -> tokio::io::Lines<BufReader<tokio::io::Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}
