use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("No OCR engine available; build with the `tesseract` feature")]
    NotAvailable,
}

/// Turns a receipt photo into text. The engine itself lives outside this
/// crate; implementations accept raw PNG/JPEG bytes.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image_bytes)
    }
}

/// Returns preset text regardless of the image.
#[derive(Debug, Clone)]
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

/// Backend used when no engine is compiled in. Every call fails with
/// [`OcrError::NotAvailable`] so callers fall back to manual entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRecognizer;

impl OcrBackend for UnavailableRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use std::path::PathBuf;

    use leptess::LepTess;

    use super::{OcrBackend, OcrError};

    /// libtesseract through leptess. A fresh engine is created per image so
    /// the recognizer can be shared across blocking threads.
    #[derive(Debug, Clone)]
    pub struct TesseractRecognizer {
        tessdata: Option<PathBuf>,
        language: String,
    }

    impl Default for TesseractRecognizer {
        fn default() -> Self {
            Self::new(None, "eng")
        }
    }

    impl TesseractRecognizer {
        /// `tessdata` of `None` lets tesseract use its compiled-in search path.
        pub fn new(tessdata: Option<PathBuf>, language: &str) -> Self {
            Self {
                tessdata,
                language: language.to_string(),
            }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let tessdata = self.tessdata.as_deref().and_then(|p| p.to_str());
            let mut engine = LepTess::new(tessdata, &self.language)
                .map_err(|e| OcrError::Engine(format!("init ({}): {e}", self.language)))?;
            engine
                .set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let text = engine
                .get_utf8_text()
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(text.replace("\r\n", "\n"))
        }
    }
}
