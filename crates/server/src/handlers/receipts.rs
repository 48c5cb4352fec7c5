//! Receipt scanning handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::debug;

use outlay_ocr::{OcrError, ReceiptScan, ScanError};

use crate::auth::AuthUser;
use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ScanTextRequest {
    pub text: String,
}

/// POST /api/receipts/scan - Extract the total from OCR text
pub async fn scan_receipt_text(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<ScanTextRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ReceiptScan>>, AppError> {
    let Json(req) = payload.map_err(|r| AppError::new(r.status(), r.body_text()))?;
    let scan = state.scanner.scan_text(&req.text);
    debug!(user_id = %user_id, found_total = scan.total.is_some(), "Scanned receipt text");
    Ok(ApiResponse::new("Receipt scanned", scan))
}

/// POST /api/receipts/scan-image - Run OCR on an uploaded photo, then extract
pub async fn scan_receipt_image(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ApiResponse<ReceiptScan>>, AppError> {
    let scan = state
        .scanner
        .scan_bytes(body.to_vec())
        .await
        .map_err(|e| match e {
            ScanError::EmptyImage => AppError::bad_request("No image data provided"),
            ScanError::Ocr(OcrError::NotAvailable) => {
                AppError::unavailable("OCR is not available on this server; enter the amount manually")
            }
            ScanError::Ocr(OcrError::ImageDecode(_)) => AppError::bad_request("Could not read image"),
            other => other.into(),
        })?;
    Ok(ApiResponse::new("Receipt scanned", scan))
}
