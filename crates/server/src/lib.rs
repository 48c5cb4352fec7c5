//! Outlay HTTP API
//!
//! Axum REST server for expense tracking: account registration and JWT
//! sessions, per-user expense CRUD with filtering and grouping, and receipt
//! total extraction.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};

use outlay_ocr::{OcrBackend, ReceiptScanner};

pub mod auth;
pub mod config;
mod handlers;
pub mod logging;
pub mod store;
pub mod validation;

use auth::TokenKeys;
use config::ServerConfig;
use store::Store;
use validation::FieldErrors;

/// Maximum request body size (10 MB), sized for receipt photos.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub tokens: TokenKeys,
    pub store: RwLock<Store>,
    pub scanner: ReceiptScanner<Box<dyn OcrBackend>>,
}

impl AppState {
    pub fn new(config: ServerConfig, recognizer: Box<dyn OcrBackend>) -> Self {
        Self {
            tokens: TokenKeys::from_config(&config.auth),
            store: RwLock::new(Store::new()),
            scanner: ReceiptScanner::new(recognizer),
            config,
        }
    }
}

/// The OCR engine compiled into this build, if any.
pub fn default_recognizer() -> Box<dyn OcrBackend> {
    #[cfg(feature = "tesseract")]
    {
        Box::new(outlay_ocr::TesseractRecognizer::default())
    }
    #[cfg(not(feature = "tesseract"))]
    {
        Box::new(outlay_ocr::UnavailableRecognizer)
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh-token", post(handlers::refresh_token));

    let protected = Router::new()
        .route("/auth/logout", post(handlers::logout))
        .route("/user/info", get(handlers::user_info))
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route("/expenses/summary", get(handlers::expense_summary))
        .route(
            "/expenses/{id}",
            put(handlers::update_expense).delete(handlers::delete_expense),
        )
        .route("/receipts/scan", post(handlers::scan_receipt_text))
        .route("/receipts/scan-image", post(handlers::scan_receipt_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    Router::new()
        .nest("/api", public.merge(protected))
        .with_state(state.clone())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Start the server
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, default_recognizer()));
    let app = create_router(state);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

// ============================================================================
// Response envelope
// ============================================================================

/// Success envelope: `{ ok: true, message, data }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            ok: true,
            message: message.into(),
            data,
        })
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    errors: Option<FieldErrors>,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
            internal: None,
        }
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    pub fn unavailable(msg: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    /// 422 with per-field messages.
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation failed")
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(ErrorBody {
            ok: false,
            message: &self.message,
            errors: self.errors.as_ref(),
        });

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            // Return generic message to client
            internal: Some(err.into()),
            ..Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred",
            )
        }
    }
}

#[cfg(test)]
mod tests;
