//! # Server Core - Watermarking Service
//!
//! The core server component is responsible for ONE thing: running the watermark
//! codec on uploaded image bytes. HTTP concerns (multipart parsing, status codes,
//! CORS) are handled by the [`routes`](super::routes) layer.

use log::info;
use std::sync::Arc;
use std::time::Instant;

use crate::processing::error::WatermarkError;
use crate::processing::policy::MarkerPolicy;
use crate::processing::raster::{self, EncodedImage};
use crate::processing::steganography::DetectionOutcome;
use crate::server::metrics::ServerMetrics;

/// Core server component that performs watermarking tasks.
///
/// Every request decodes its own pixel grid; the only shared state is the
/// read-only policy and the atomic counters.
#[derive(Clone)]
pub struct ServerCore {
    policy: Arc<MarkerPolicy>,
    metrics: ServerMetrics,
}

impl ServerCore {
    /// Create a new server core instance.
    ///
    /// # Example
    /// ```ignore
    /// let core = ServerCore::new(MarkerPolicy::default());
    /// ```
    pub fn new(policy: MarkerPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
            metrics: ServerMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    pub fn policy(&self) -> &MarkerPolicy {
        &self.policy
    }

    /// Watermark an uploaded image.
    ///
    /// This function:
    /// 1. Decodes the image into an RGB pixel grid
    /// 2. Refuses images that already carry our marker
    /// 3. Embeds `"<text> - <marker>"` into a copy of the grid
    /// 4. Re-encodes in the upload's format (PNG if that format cannot be written)
    ///
    /// # Arguments
    /// - `request_id`: Unique identifier for this task (for logging)
    /// - `image_data`: Raw bytes of the uploaded image
    /// - `filename`: Original filename, used to choose the output format
    /// - `text`: User text to embed
    ///
    /// # Returns
    /// - `Ok(EncodedImage)`: Watermarked image bytes and their format
    /// - `Err`: Unreadable image, already watermarked, or text too long
    pub async fn watermark_image(
        &self,
        request_id: u64,
        image_data: Vec<u8>,
        filename: Option<String>,
        text: String,
    ) -> Result<EncodedImage, WatermarkError> {
        info!(
            "📷 Request #{} embedding {} characters into {} bytes",
            request_id,
            text.chars().count(),
            image_data.len()
        );

        let started = Instant::now();
        let policy = Arc::clone(&self.policy);

        // The codec is CPU-bound; keep it off the async runtime
        let result = tokio::task::spawn_blocking(move || -> Result<EncodedImage, WatermarkError> {
            let decoded = raster::decode_image(&image_data)?;
            let marked = policy.watermark(&decoded.grid, &text)?;
            let format = raster::resolve_format(filename.as_deref(), decoded.format);
            raster::encode_image(&marked, format)
        })
        .await
        .map_err(|e| WatermarkError::Internal(format!("embedding task panicked: {}", e)))
        .and_then(|result| result);

        self.record(started, &result);
        match &result {
            Ok(encoded) => {
                self.metrics.increment_embeds();
                info!(
                    "✅ Request #{} watermarked ({:?}, {} bytes)",
                    request_id,
                    encoded.format,
                    encoded.bytes.len()
                );
            }
            Err(WatermarkError::AlreadyWatermarked) => {
                self.metrics.increment_duplicate_rejections();
                info!("⛔ Request #{} refused: image already watermarked", request_id);
            }
            Err(e) => info!("❌ Request #{} failed: {}", request_id, e),
        }

        result
    }

    /// Detect the watermark in an uploaded image.
    ///
    /// Missing, corrupted and foreign watermarks are reported through the
    /// outcome; only an undecodable image is an error.
    pub async fn detect_watermark(
        &self,
        request_id: u64,
        image_data: Vec<u8>,
    ) -> Result<DetectionOutcome, WatermarkError> {
        info!(
            "🔍 Request #{} scanning {} bytes",
            request_id,
            image_data.len()
        );

        let started = Instant::now();
        let policy = Arc::clone(&self.policy);

        let result = tokio::task::spawn_blocking(move || -> Result<DetectionOutcome, WatermarkError> {
            let decoded = raster::decode_image(&image_data)?;
            Ok(policy.detect(&decoded.grid))
        })
        .await
        .map_err(|e| WatermarkError::Internal(format!("detection task panicked: {}", e)))
        .and_then(|result| result);

        self.record(started, &result);
        match &result {
            Ok(outcome) => {
                self.metrics.increment_detections();
                info!("✅ Request #{}: {}", request_id, outcome);
            }
            Err(e) => info!("❌ Request #{} failed: {}", request_id, e),
        }

        result
    }

    fn record<T>(&self, started: Instant, result: &Result<T, WatermarkError>) {
        self.metrics.increment_total_requests();
        self.metrics
            .update_response_time(started.elapsed().as_secs_f64() * 1000.0);
        if result.is_err() {
            self.metrics.increment_failed_requests();
        }
    }
}
