//! Client-side document validation
//!
//! Documents are checked before any network call: only PDF, Word, and plain
//! text files up to 10 MiB are accepted.

use std::path::Path;

use crate::{Error, Result};

/// Largest accepted document (10 MiB)
pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted for career-insight analysis
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "text/plain",
];

/// A document ready to upload
#[derive(Clone)]
pub struct DocumentUpload {
    /// Original file name
    pub file_name: String,

    /// MIME type
    pub mime_type: String,

    /// File contents
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for DocumentUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl DocumentUpload {
    /// Create an upload from in-memory bytes
    ///
    /// When `mime_type` is `None` it is inferred from the file extension.
    #[must_use]
    pub fn new(file_name: impl Into<String>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_type
            .map(|m| m.trim().to_lowercase())
            .or_else(|| mime_for_file_name(&file_name).map(ToString::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Read and validate a document from disk
    ///
    /// The size limit is checked from file metadata before the contents are read.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or fails validation
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Validation(format!("invalid file name: {}", path.display())))?
            .to_string();

        let mime_type = mime_for_file_name(&file_name)
            .ok_or_else(|| unsupported_type(&file_name))?;
        check_size(std::fs::metadata(path)?.len())?;

        let doc = Self::new(file_name, Some(mime_type), std::fs::read(path)?);
        doc.validate()?;
        Ok(doc)
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check type and size limits
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the document is empty, too large, or of
    /// an unsupported type
    pub fn validate(&self) -> Result<()> {
        if !ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(unsupported_type(&self.file_name));
        }

        if self.bytes.is_empty() {
            return Err(Error::Validation(format!("{} is empty", self.file_name)));
        }

        check_size(self.size())
    }
}

fn check_size(size: u64) -> Result<()> {
    if size > MAX_DOCUMENT_BYTES {
        return Err(Error::Validation(format!(
            "file is {size} bytes, the limit is {MAX_DOCUMENT_BYTES} bytes (10 MiB)"
        )));
    }
    Ok(())
}

fn unsupported_type(file_name: &str) -> Error {
    Error::Validation(format!(
        "unsupported file type for {file_name}: upload a PDF, Word document, or text file"
    ))
}

/// Infer an accepted MIME type from a file name's extension
#[must_use]
pub fn mime_for_file_name(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();

    match ext.as_str() {
        "pdf" => Some("application/pdf"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "doc" => Some("application/msword"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
