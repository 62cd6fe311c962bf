//! # Marker Policy
//!
//! Business rules on top of the LSB codec:
//! - an image that already carries our marker is never marked again
//! - every embedded payload is `"<user text> - <marker>"`
//!
//! ## Upload Flow
//!
//! ```text
//! detect(grid) -> ValidWatermark?  -> AlreadyWatermarked
//!              -> otherwise        -> embed(copy of grid, "<text> - <marker>")
//! ```

use log::debug;

use super::error::WatermarkError;
use super::steganography::{self, DetectionOutcome, Detector, DetectorConfig, PixelGrid};

/// Separator between the user's text and the marker.
pub const MARKER_SEPARATOR: &str = " - ";

/// Applies the watermarking rules. Cheap to share; holds only configuration.
#[derive(Debug, Clone, Default)]
pub struct MarkerPolicy {
    detector: Detector,
}

impl MarkerPolicy {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            detector: Detector::new(config),
        }
    }

    pub fn marker(&self) -> &str {
        self.detector.marker()
    }

    /// Text that is actually embedded for `user_text`.
    pub fn payload_for(&self, user_text: &str) -> String {
        format!("{}{}{}", user_text, MARKER_SEPARATOR, self.marker())
    }

    /// Classify the watermark in `grid`, if any.
    pub fn detect(&self, grid: &PixelGrid) -> DetectionOutcome {
        self.detector.detect(grid)
    }

    /// Watermark a copy of `grid` with `user_text` plus the marker.
    ///
    /// # Errors
    /// - [`WatermarkError::AlreadyWatermarked`] if `grid` already carries our marker
    /// - [`WatermarkError::CapacityExceeded`] and other framing errors from the embedder
    pub fn watermark(&self, grid: &PixelGrid, user_text: &str) -> Result<PixelGrid, WatermarkError> {
        let existing = self.detect(grid);
        if existing.is_valid() {
            debug!("Refusing to mark twice: {}", existing);
            return Err(WatermarkError::AlreadyWatermarked);
        }

        steganography::embed(grid.clone(), &self.payload_for(user_text))
    }
}
