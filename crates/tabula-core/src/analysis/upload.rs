//! File admission rules applied before anything is sent to the backend.

use std::path::Path;
use std::sync::Arc;

use crate::config::UploadPolicy;
use crate::error::{Result, TabulaError};

const GENERIC_MIME: &str = "application/octet-stream";

/// A file the user picked, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// MIME type reported by the picker, or inferred from the name.
    pub mime_type: String,
    pub size: u64,
    pub contents: Arc<Vec<u8>>,
}

impl SelectedFile {
    /// Builds a selection, inferring the MIME type from the name when none is given.
    pub fn new(name: impl Into<String>, mime_type: Option<String>, contents: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| infer_mime_type(&name));

        Self {
            size: contents.len() as u64,
            name,
            mime_type,
            contents: Arc::new(contents),
        }
    }

    /// Lower-case extension without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// Infers the MIME type from a filename extension using the `mime_guess` library.
pub fn infer_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(GENERIC_MIME)
        .to_string()
}

/// Checks a selection against the policy.
///
/// Order of checks: extension, MIME type, emptiness, size. The first failing
/// rule produces a [`TabulaError::Validation`] with a message meant for display.
pub fn validate_file(file: &SelectedFile, policy: &UploadPolicy) -> Result<()> {
    let extension = file.extension().ok_or_else(|| {
        TabulaError::validation(format!(
            "Unsupported file type. Please upload one of: {}",
            allowed_list(policy)
        ))
    })?;

    if !policy.allowed_extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
        return Err(TabulaError::validation(format!(
            "Unsupported file type '.{}'. Please upload one of: {}",
            extension,
            allowed_list(policy)
        )));
    }

    // Pickers often report a generic type for spreadsheets; the extension decides then.
    let mime = file.mime_type.to_lowercase();
    let mime = mime.split(';').next().unwrap_or_default().trim();
    if mime != GENERIC_MIME
        && !policy.allowed_mime_types.iter().any(|m| m.eq_ignore_ascii_case(mime))
    {
        return Err(TabulaError::validation(format!(
            "Unsupported content type '{}'",
            file.mime_type
        )));
    }

    if file.size == 0 {
        return Err(TabulaError::validation("The selected file is empty"));
    }

    if file.size > policy.max_size_bytes {
        return Err(TabulaError::validation(format!(
            "File is too large ({}). Maximum size is {}",
            format_size(file.size),
            format_size(policy.max_size_bytes)
        )));
    }

    Ok(())
}

fn allowed_list(policy: &UploadPolicy) -> String {
    policy
        .allowed_extensions
        .iter()
        .map(|e| format!(".{}", e))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human readable byte size (`512 B`, `12.0 KB`, `10.0 MB`).
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}
