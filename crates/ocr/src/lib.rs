pub mod extract;
pub mod pipeline;
pub mod recognizer;
pub mod types;

pub use extract::parse_receipt;
pub use pipeline::{ReceiptScanner, ScanError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use types::ReceiptScan;

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
