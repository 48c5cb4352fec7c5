use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::extract::parse_receipt;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::ReceiptScan;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No image data provided")]
    EmptyImage,
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("OCR task panicked or was cancelled: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Orchestrates: image bytes → OCR backend → total extraction.
pub struct ReceiptScanner<R: OcrBackend> {
    recognizer: Arc<R>,
}

impl<R: OcrBackend> Clone for ReceiptScanner<R> {
    fn clone(&self) -> Self {
        Self { recognizer: Arc::clone(&self.recognizer) }
    }
}

impl<R: OcrBackend + 'static> ReceiptScanner<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer: Arc::new(recognizer) }
    }

    /// Scan an image file on disk.
    pub async fn scan_file(&self, path: &Path) -> Result<ReceiptScan, ScanError> {
        let bytes = tokio::fs::read(path).await?;
        debug!(path = %path.display(), "Read receipt image");
        self.scan_bytes(bytes).await
    }

    /// Scan raw image bytes (upload or camera capture).
    ///
    /// OCR engines are CPU-bound, so recognition runs on the blocking pool.
    pub async fn scan_bytes(&self, image: Vec<u8>) -> Result<ReceiptScan, ScanError> {
        if image.is_empty() {
            return Err(ScanError::EmptyImage);
        }
        let size = image.len();
        let recognizer = Arc::clone(&self.recognizer);
        let text = tokio::task::spawn_blocking(move || recognizer.recognize(&image)).await??;

        let scan = parse_receipt(&text);
        info!(bytes = size, found_total = scan.total.is_some(), "Scanned receipt");
        Ok(scan)
    }

    /// Extract a total from text some other OCR step already produced.
    pub fn scan_text(&self, text: &str) -> ReceiptScan {
        parse_receipt(text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
