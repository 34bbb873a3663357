//! OCR backend abstraction.

use std::path::Path;

use thiserror::Error;

/// Errors from OCR backends and screenshot preparation.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Screenshot not found: {0}")]
    ScreenshotMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for OcrError {
    fn from(e: image::ImageError) -> Self {
        OcrError::Image(e.to_string())
    }
}

/// A synchronous engine that reads text out of one image file.
pub trait OcrBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Check if this backend is available (binaries installed, models present).
    fn is_available(&self) -> bool;

    /// Describe what is needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Extract text from an image file, reading it as `language` (a
    /// Tesseract-style three-letter code).
    fn run_ocr(&self, image_path: &Path, language: &str) -> Result<String, OcrError>;
}

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}
