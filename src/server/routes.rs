//! # HTTP API
//!
//! Axum routes for the watermarking service:
//!
//! | Route               | Body (multipart)                     | Success                                  |
//! |---------------------|--------------------------------------|------------------------------------------|
//! | `POST /api/upload`  | `file`, `text`, optional `user_email` | watermarked image bytes as an attachment |
//! | `POST /api/detect`  | `file`                               | `{"detection_result": "..."}`            |
//! | `GET /api/health`   | -                                    | service status and request counters      |
//!
//! Errors are returned as `{"error": "...", "detail": "..."}` with a matching status code.

use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        DefaultBodyLimit, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::common::config::ServerSettings;
use crate::processing::error::WatermarkError;
use crate::processing::raster;
use crate::server::server::ServerCore;

/// Allowance for multipart boundaries and the text fields on top of the image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub const NOT_AN_IMAGE: &str = "File must be an image";
pub const FILE_TOO_LARGE: &str = "File too large";

#[derive(Serialize)]
struct DetectionResponse {
    detection_result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

/// An error response: status code plus a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message.clone(),
                detail: self.message,
            }),
        )
            .into_response()
    }
}

impl From<WatermarkError> for ApiError {
    fn from(e: WatermarkError) -> Self {
        match e {
            WatermarkError::AlreadyWatermarked => Self::new(StatusCode::CONFLICT, e.to_string()),
            WatermarkError::CapacityExceeded { .. }
            | WatermarkError::PayloadTooLong { .. }
            | WatermarkError::UnsupportedCharacter(_)
            | WatermarkError::UnreadableImage(_) => Self::bad_request(e.to_string()),
            WatermarkError::MalformedHeader { .. }
            | WatermarkError::EncodeFailed(_)
            | WatermarkError::Internal(_) => {
                error!("Internal failure: {}", e);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        let status = e.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(status, FILE_TOO_LARGE)
        } else {
            Self::new(status, format!("Failed to read multipart data: {}", e.body_text()))
        }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub core: ServerCore,
    pub max_upload_bytes: usize,
}

/// Build the API router.
pub fn router(core: ServerCore, settings: &ServerSettings) -> Router {
    let state = AppState {
        core,
        max_upload_bytes: settings.max_upload_bytes,
    };

    Router::new()
        .route("/api/upload", post(upload_handler))
        .route("/api/detect", post(detect_handler))
        .route("/api/health", get(health_check))
        .layer(DefaultBodyLimit::max(
            settings.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ))
        .layer(cors_layer(&settings.allowed_origins))
        .with_state(state)
}

/// CORS for the configured origins; permissive when none are configured.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "markora-watermark-api",
        "marker": state.core.policy().marker(),
        "metrics": state.core.metrics().snapshot(),
    }))
}

/// Fields of an upload or detect form.
#[derive(Debug, Default)]
struct ImageForm {
    image: Option<Vec<u8>>,
    filename: Option<String>,
    text: Option<String>,
    user_email: Option<String>,
}

/// Parse multipart form data, enforcing the image content type and size limit.
async fn read_form(mut multipart: Multipart, max_upload_bytes: usize) -> Result<ImageForm, ApiError> {
    let mut form = ImageForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let content_type = field.content_type().unwrap_or("").to_string();
                if !content_type.starts_with("image/") {
                    return Err(ApiError::bad_request(NOT_AN_IMAGE));
                }

                form.filename = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                if data.len() > max_upload_bytes {
                    return Err(ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, FILE_TOO_LARGE));
                }
                form.image = Some(data.to_vec());
            }
            "text" => form.text = Some(field.text().await?),
            "user_email" => form.user_email = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

/// Build an ASCII-only `Content-Disposition` value for `filename`.
fn attachment_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

async fn upload_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(multipart, state.max_upload_bytes).await?;
    let image = form
        .image
        .ok_or_else(|| ApiError::bad_request("No image provided"))?;
    let text = form
        .text
        .ok_or_else(|| ApiError::bad_request("Watermark text is required"))?;

    let request_id = rand::random::<u64>();
    info!(
        "📤 Upload #{}: {} ({} bytes) from {}",
        request_id,
        form.filename.as_deref().unwrap_or("<unnamed>"),
        image.len(),
        form.user_email.as_deref().unwrap_or("anonymous")
    );

    let original_name = form.filename.clone().unwrap_or_else(|| "image".to_string());
    let encoded = state
        .core
        .watermark_image(request_id, image, form.filename, text)
        .await?;

    let download_name = raster::output_filename(&original_name, encoded.format);
    Ok((
        [
            (header::CONTENT_TYPE, encoded.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, attachment_disposition(&download_name)),
        ],
        encoded.bytes,
    )
        .into_response())
}

async fn detect_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<DetectionResponse>, ApiError> {
    let form = read_form(multipart, state.max_upload_bytes).await?;
    let image = form
        .image
        .ok_or_else(|| ApiError::bad_request("No image provided"))?;

    let request_id = rand::random::<u64>();
    let outcome = state.core.detect_watermark(request_id, image).await?;

    Ok(Json(DetectionResponse {
        detection_result: outcome.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::from(WatermarkError::AlreadyWatermarked).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(WatermarkError::CapacityExceeded {
                required: 400,
                available: 300
            })
            .status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WatermarkError::UnsupportedCharacter('☃')).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(WatermarkError::Internal("boom".to_string())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_message_is_literal() {
        assert_eq!(
            ApiError::from(WatermarkError::AlreadyWatermarked).message,
            "This image already has a watermark. Cannot add another."
        );
    }

    #[test]
    fn test_attachment_disposition_is_ascii() {
        assert_eq!(
            attachment_disposition("watermarked_my \"cat\".png"),
            "attachment; filename=\"watermarked_my__cat_.png\""
        );
        assert_eq!(
            attachment_disposition("watermarked_café.png"),
            "attachment; filename=\"watermarked_caf_.png\""
        );
    }
}
