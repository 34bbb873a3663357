//! Tesseract OCR backend.
//!
//! Runs the `tesseract` command-line tool, writing recognized text to stdout.

use std::path::Path;
use std::process::Command;

use super::backend::{check_binary, OcrBackend, OcrError};

/// Tesseract language used when the page language has no mapping.
pub const DEFAULT_LANGUAGE: &str = "eng";

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "eng"),
    ("fi", "fin"),
    ("fr", "fra"),
    ("de", "deu"),
    ("es", "spa"),
    ("it", "ita"),
    ("pt", "por"),
    ("sv", "swe"),
    ("nl", "nld"),
];

/// Map a two-letter language code to Tesseract's three-letter code.
///
/// Known three-letter codes pass through; anything else falls back to
/// English.
pub fn tesseract_language(code: &str) -> &'static str {
    let code = code.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(two, three)| *two == code || *three == code)
        .map(|(_, three)| *three)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Tesseract OCR backend.
///
/// Reads each image in the language it is asked for, unless a fixed
/// language was configured.
#[derive(Debug, Clone, Default)]
pub struct TesseractBackend {
    language: Option<String>,
}

impl TesseractBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always use this Tesseract language code (`eng`, `fin`, ...).
    pub fn with_language(language: &str) -> Self {
        Self {
            language: Some(language.to_string()),
        }
    }

    /// The configured fixed language, if any.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    fn effective_language<'a>(&'a self, requested: &'a str) -> &'a str {
        self.language.as_deref().unwrap_or(requested)
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if check_binary("tesseract") {
            "Tesseract is available".to_string()
        } else {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        }
    }

    fn run_ocr(&self, image_path: &Path, language: &str) -> Result<String, OcrError> {
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .args(["-l", self.effective_language(language)])
            .output();

        match output {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable("tesseract not found (install tesseract-ocr)".into()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_mapping() {
        assert_eq!(tesseract_language("en"), "eng");
        assert_eq!(tesseract_language("FI"), "fin");
        assert_eq!(tesseract_language("fr"), "fra");
        assert_eq!(tesseract_language("nl"), "nld");
        assert_eq!(tesseract_language("deu"), "deu");
        assert_eq!(tesseract_language("zz"), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_configured_language_overrides_request() {
        let detected = TesseractBackend::default();
        assert_eq!(detected.language(), None);
        assert_eq!(detected.effective_language("fra"), "fra");

        let fixed = TesseractBackend::with_language("fin");
        assert_eq!(fixed.language(), Some("fin"));
        assert_eq!(fixed.effective_language("fra"), "fin");
    }
}
