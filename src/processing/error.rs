//! # Watermark Errors
//!
//! [`WatermarkError`] covers the conditions that abort an embed or a request.
//! A missing, corrupted or foreign watermark is *not* an error: detection reports
//! those through [`DetectionOutcome`](super::steganography::DetectionOutcome).

/// Errors raised by the watermark codec and the marker policy.
#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    /// The framed payload does not fit into the carrier's channel low bits.
    #[error("The watermark text is too long to embed in this image (need {required} bits, have {available})")]
    CapacityExceeded { required: usize, available: usize },

    /// The 16-bit length header cannot describe a payload this long.
    #[error("The watermark text is too long to embed ({bits} bits exceeds the 65535-bit header limit)")]
    PayloadTooLong { bits: usize },

    /// Only code points that fit into a single byte can be framed.
    #[error("Character {0:?} cannot be embedded; only characters up to U+00FF are supported")]
    UnsupportedCharacter(char),

    /// The length header claims more bits than the stream carries.
    #[error("Length header claims {claimed} bits but only {available} are present")]
    MalformedHeader { claimed: usize, available: usize },

    /// The carrier already holds one of our watermarks.
    #[error("This image already has a watermark. Cannot add another.")]
    AlreadyWatermarked,

    /// The input bytes could not be decoded into a pixel grid.
    #[error("Could not read image: {0}")]
    UnreadableImage(#[source] image::ImageError),

    /// The pixel grid could not be encoded, not even with the PNG fallback.
    #[error("Could not encode image: {0}")]
    EncodeFailed(#[source] image::ImageError),

    /// A worker task failed before producing a result.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WatermarkError {
    /// Whether the caller can fix this error by changing the watermark text or the image.
    pub fn is_capacity_error(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::PayloadTooLong { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_matches_web_client() {
        assert_eq!(
            WatermarkError::AlreadyWatermarked.to_string(),
            "This image already has a watermark. Cannot add another."
        );
    }

    #[test]
    fn test_capacity_classification() {
        assert!(WatermarkError::CapacityExceeded { required: 10, available: 3 }.is_capacity_error());
        assert!(WatermarkError::PayloadTooLong { bits: 70_000 }.is_capacity_error());
        assert!(!WatermarkError::AlreadyWatermarked.is_capacity_error());
    }
}
