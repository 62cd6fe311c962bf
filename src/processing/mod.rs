//! # Image Processing and Watermarking
//!
//! This module provides watermark embedding and detection using LSB (Least
//! Significant Bit) steganography.
//!
//! ## Modules
//!
//! - [`bits`]: Length-prefixed bit framing of watermark text
//! - [`gibberish`]: Heuristic that rejects noise recovered from unmarked images
//! - [`steganography`]: Embedder and chunked, early-exit detector
//! - [`policy`]: Marker rules (no double marking, marker suffix)
//! - [`raster`]: Image file decoding and encoding
//! - [`error`]: Error taxonomy

pub mod bits;
pub mod error;
pub mod gibberish;
pub mod policy;
pub mod raster;
pub mod steganography;

// Re-export main types for convenience
pub use error::WatermarkError;
pub use policy::MarkerPolicy;
pub use steganography::{embed, DetectionOutcome, Detector, DetectorConfig, PixelGrid};
