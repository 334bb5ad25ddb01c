use std::fs;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR scratch file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Abstraction over an OCR backend.
/// Implementations accept raw PNG/JPEG image bytes and return the
/// recognized text — possibly empty, which is a valid result.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string — lets the extraction pipeline be exercised
/// without a Tesseract installation.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Tesseract CLI backend ─────────────────────────────────────────────────────

/// Shells out to the `tesseract` command-line tool through a scratch
/// directory that is removed when recognition finishes.
pub struct CommandRecognizer {
    binary: String,
    lang: String,
}

impl CommandRecognizer {
    pub fn new(lang: &str) -> Self {
        Self {
            binary: "tesseract".to_string(),
            lang: lang.to_string(),
        }
    }

    /// Override the executable name — used by tests to simulate a missing
    /// installation.
    pub fn with_binary(mut self, binary: &str) -> Self {
        self.binary = binary.to_string();
        self
    }
}

impl OcrBackend for CommandRecognizer {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let scratch = tempfile::TempDir::with_prefix("ampere-ocr")?;
        let input_path = scratch.path().join("input.png");
        let output_base = scratch.path().join("output");
        fs::write(&input_path, image_bytes)?;

        let output = Command::new(&self.binary)
            .arg(&input_path)
            .arg(&output_base)
            .args(["-l", &self.lang])
            .output()?;
        if !output.status.success() {
            return Err(OcrError::Engine(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(fs::read_to_string(output_base.with_extension("txt"))?)
    }
}

// ── Tesseract library backend (optional, gated behind `tesseract` feature) ────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use leptess::LepTess;

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self {
                data_path,
                lang: lang.to_string(),
            }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.get_utf8_text()
                .map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("ADANI ELECTRICITY\nAmount Payable: 845.20");
        assert_eq!(
            r.recognize(b"fake image data").unwrap(),
            "ADANI ELECTRICITY\nAmount Payable: 845.20"
        );
    }

    #[test]
    fn mock_ignores_image_content() {
        let r = MockRecognizer::new("hello");
        assert_eq!(r.recognize(b"anything").unwrap(), "hello");
        assert_eq!(r.recognize(b"").unwrap(), "hello");
    }

    #[test]
    fn missing_binary_is_an_error_not_a_panic() {
        let r = CommandRecognizer::new("eng").with_binary("ampere-no-such-ocr-tool");
        assert!(r.recognize(b"\x89PNG").is_err());
    }
}
