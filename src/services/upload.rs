//! Attachment storage
//!
//! PDF attachments are written to the configured upload directory under a
//! random name and served back read-only at `/uploads/<filename>`.

use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::models::PdfFile;

/// Public URL prefix the upload directory is served under
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// A file received from a client, not yet stored
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only PDF files are allowed")]
    InvalidType(String),

    #[error("File too large. Maximum size is {} MB", .max_bytes / 1024 / 1024)]
    TooLarge { max_bytes: u64 },

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

/// Filesystem store for notice attachments
#[derive(Debug, Clone)]
pub struct UploadStore {
    config: UploadConfig,
}

impl UploadStore {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self) -> &Path {
        &self.config.path
    }

    /// Create the upload directory if missing
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        if !self.config.path.exists() {
            fs::create_dir_all(&self.config.path).await?;
        }
        Ok(())
    }

    /// Check type and size without touching the disk
    pub fn validate(&self, file: &UploadedFile) -> Result<(), UploadError> {
        if !self.config.is_type_allowed(&file.content_type) {
            return Err(UploadError::InvalidType(file.content_type.clone()));
        }
        if file.data.is_empty() {
            return Err(UploadError::Empty);
        }
        if file.data.len() as u64 > self.config.max_file_size {
            return Err(UploadError::TooLarge {
                max_bytes: self.config.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate and write the file under a fresh random name
    pub async fn save(&self, file: &UploadedFile) -> Result<PdfFile, UploadError> {
        self.validate(file)?;
        self.ensure_dir().await?;

        let filename = format!("pdf-{}.pdf", Uuid::new_v4());
        fs::write(self.config.path.join(&filename), &file.data).await?;

        tracing::debug!(
            filename = %filename,
            original = file.file_name.as_deref().unwrap_or(""),
            size = file.data.len(),
            "Stored attachment"
        );

        Ok(PdfFile {
            path: format!("{}/{}", UPLOADS_URL_PREFIX, filename),
            filename,
            size: file.data.len() as i64,
        })
    }

    /// Delete a stored attachment. Missing files are not an error.
    pub async fn remove(&self, pdf: &PdfFile) -> Result<(), UploadError> {
        let Some(path) = self.resolve(&pdf.filename) else {
            return Ok(());
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of a stored file, refusing names that would escape the directory
    fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let plain = !filename.is_empty()
            && !filename.contains(['/', '\\'])
            && filename != "."
            && filename != "..";
        plain.then(|| self.config.path.join(filename))
    }
}
