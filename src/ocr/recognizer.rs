//! Screenshot text recognition with an ordered fan-out over image variants.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::backend::{OcrBackend, OcrError};
use super::screenshot::write_variants;
use super::tesseract::tesseract_language;
use crate::extraction::tokenize;
use crate::keywords::{StopwordTable, FALLBACK_LANGUAGE};

/// Turns a screenshot into a normalized token string.
///
/// `language` is the two-letter code detected for the page text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn extract_text(&self, screenshot: &Path, language: &str) -> Result<String, OcrError>;
}

/// Run blocking jobs concurrently and collect their outputs in job order.
///
/// Completion order never affects the result. A job that panics yields
/// `None` without disturbing the others.
pub async fn run_ordered_jobs<T, F>(jobs: Vec<F>) -> Vec<Option<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = jobs.into_iter().map(tokio::task::spawn_blocking).collect();

    futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::ok)
        .collect()
}

/// Tokenize OCR output and drop English and web stopwords.
pub fn normalize_ocr_text(text: &str, stopwords: &StopwordTable) -> String {
    tokenize(text)
        .into_iter()
        .filter(|token| !stopwords.is_stopword(FALLBACK_LANGUAGE, token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Recognizer that OCRs every channel variant of a screenshot's top and
/// bottom bands and concatenates the results by variant index.
pub struct ScreenshotOcr {
    backend: Arc<dyn OcrBackend>,
    stopwords: Arc<StopwordTable>,
}

impl ScreenshotOcr {
    pub fn new(backend: Arc<dyn OcrBackend>, stopwords: Arc<StopwordTable>) -> Self {
        Self { backend, stopwords }
    }
}

#[async_trait]
impl TextRecognizer for ScreenshotOcr {
    async fn extract_text(&self, screenshot: &Path, language: &str) -> Result<String, OcrError> {
        if !self.backend.is_available() {
            return Err(OcrError::BackendNotAvailable(
                self.backend.availability_hint(),
            ));
        }

        let workdir = tempfile::tempdir()?;
        let source = screenshot.to_path_buf();
        let dir = workdir.path().to_path_buf();
        let variants = tokio::task::spawn_blocking(move || write_variants(&source, &dir))
            .await
            .map_err(|e| OcrError::OcrFailed(format!("variant preparation failed: {}", e)))??;

        let ocr_language = tesseract_language(language);
        info!(
            backend = self.backend.name(),
            jobs = variants.len(),
            language = ocr_language,
            "Running OCR on {}",
            screenshot.display()
        );

        let jobs: Vec<_> = variants
            .into_iter()
            .map(|path| {
                let backend = Arc::clone(&self.backend);
                move || backend.run_ocr(&path, ocr_language)
            })
            .collect();

        let outputs = run_ordered_jobs(jobs).await;
        let texts: Vec<String> = outputs
            .into_iter()
            .enumerate()
            .map(|(index, output)| match output {
                Some(Ok(text)) => text,
                Some(Err(e)) => {
                    warn!("OCR job {} failed: {}", index, e);
                    String::new()
                }
                None => {
                    warn!("OCR job {} panicked", index);
                    String::new()
                }
            })
            .collect();

        let normalized = normalize_ocr_text(&texts.join(" "), &self.stopwords);
        debug!(tokens = normalized.split(' ').count(), "OCR text normalized");
        Ok(normalized)
    }
}
