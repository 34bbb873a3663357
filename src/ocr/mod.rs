//! Screenshot OCR.
//!
//! A screenshot is reduced to its top and bottom bands, split into six
//! single-channel variants (each colour channel, as captured and inverted),
//! and every variant is run through an [`OcrBackend`] concurrently. Outputs
//! are joined in variant order and normalized into a token string.
//!
//! Tesseract is the only bundled backend.

mod backend;
mod recognizer;
mod screenshot;
mod tesseract;

pub use backend::{check_binary, OcrBackend, OcrError};
pub use recognizer::{normalize_ocr_text, run_ordered_jobs, ScreenshotOcr, TextRecognizer};
pub use screenshot::{channel_variant, crop_bands, write_variants, BAND_HEIGHT, VARIANT_COUNT};
pub use tesseract::{tesseract_language, TesseractBackend, DEFAULT_LANGUAGE};
