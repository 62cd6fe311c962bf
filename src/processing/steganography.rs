//! # LSB Steganography Implementation
//!
//! Implements watermark embedding and detection using Least Significant Bit (LSB)
//! steganography over 8-bit RGB pixel grids.
//!
//! ## Algorithm
//!
//! The LSB technique hides text within an image by replacing the least significant
//! bit of each color channel (R, G, B) with one bit of the framed payload.
//!
//! ### Embedding
//! 1. Frame the text with a 16-bit length header (see [`bits`](super::bits))
//! 2. Reject the payload if it exceeds `width * height * 3` bits
//! 3. Walk the pixels row by row, left to right, writing one bit into R, then G, then B
//! 4. Stop writing once the payload is consumed; remaining channels stay untouched
//!
//! ### Detection
//! 1. Skip carriers larger than the configured maximum dimensions
//! 2. Collect channel low bits in chunks of rows, stopping as soon as the header
//!    and the payload it announces have been read
//! 3. Decode, discard noise with the [gibberish classifier](super::gibberish), and
//!    check for the marker
//!
//! ### Capacity
//! An image can store `(width * height * 3 - 16) / 8` characters after the
//! 16-bit header. Example: a 10x10 image holds 300 bits, i.e. 35 characters.

use image::RgbImage;
use log::debug;
use std::fmt;

use super::bits::{self, Bitstream};
use super::error::WatermarkError;
use super::gibberish::is_gibberish;

/// Carrier pixels: row-major 8-bit RGB triples.
pub type PixelGrid = RgbImage;

/// Marker appended to every watermark we embed.
pub const DEFAULT_MARKER: &str = "Embedded with Markora";

/// Result of scanning a carrier for a watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// Nothing recoverable: no header, a truncated payload, noise, or an oversized image.
    NoWatermark,
    /// Text was recovered but does not carry our marker.
    InvalidWatermark(String),
    /// Text was recovered and carries our marker.
    ValidWatermark(String),
}

impl DetectionOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::ValidWatermark(_))
    }

    /// The recovered text, if any bits decoded into something text-like.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::NoWatermark => None,
            Self::InvalidWatermark(text) | Self::ValidWatermark(text) => Some(text),
        }
    }
}

impl fmt::Display for DetectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWatermark => write!(f, "No watermark detected"),
            Self::InvalidWatermark(_) => write!(f, "No valid watermark found"),
            Self::ValidWatermark(text) => write!(f, "Watermark detected: {}", text),
        }
    }
}

/// Number of payload bits a carrier can hold (one per channel).
pub fn capacity(grid: &PixelGrid) -> usize {
    grid.width() as usize * grid.height() as usize * 3
}

/// Embed `text` into the channel low bits of `grid`.
///
/// The grid is consumed and returned with its low bits rewritten; callers that
/// need the original keep their own copy.
///
/// # Errors
/// - [`WatermarkError::CapacityExceeded`] if the framed text does not fit
/// - Any framing error from [`bits::encode`]
pub fn embed(mut grid: PixelGrid, text: &str) -> Result<PixelGrid, WatermarkError> {
    let stream = bits::encode(text)?;
    let available = capacity(&grid);

    if stream.len() > available {
        return Err(WatermarkError::CapacityExceeded {
            required: stream.len(),
            available,
        });
    }

    let mut payload = stream.bits().iter();

    'outer: for pixel in grid.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            match payload.next() {
                // Clear LSB and set it to our data bit
                Some(&bit) => *channel = (*channel & 0xFE) | bit,
                None => break 'outer,
            }
        }
    }

    debug!(
        "Embedded {} bits into {}x{} carrier ({} available)",
        stream.len(),
        grid.width(),
        grid.height(),
        available
    );

    Ok(grid)
}

/// Collect channel low bits, `chunk_rows` rows at a time.
///
/// Scanning stops after the first chunk that completes the header and the
/// payload it announces; otherwise every row is read. Any chunk size yields a
/// stream with the same header and payload bits.
pub fn scan(grid: &PixelGrid, chunk_rows: u32) -> Bitstream {
    let (width, height) = grid.dimensions();
    let chunk_rows = chunk_rows.max(1);
    let mut stream = Bitstream::new();
    let mut row = 0;

    while row < height {
        let end = row.saturating_add(chunk_rows).min(height);

        for y in row..end {
            for x in 0..width {
                for channel in grid.get_pixel(x, y).0 {
                    stream.push(channel & 1);
                }
            }
        }
        row = end;

        if row < height && stream.is_complete() {
            debug!(
                "Early exit after {} of {} rows ({} bits read)",
                row,
                height,
                stream.len()
            );
            break;
        }
    }

    stream
}

/// Detection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Substring that marks a watermark as ours.
    pub marker: String,
    /// Carriers wider than this are reported as unmarked without scanning.
    pub max_width: u32,
    /// Carriers taller than this are reported as unmarked without scanning.
    pub max_height: u32,
    /// Rows read between early-exit checks.
    pub chunk_rows: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            max_width: 5000,
            max_height: 5000,
            chunk_rows: 1000,
        }
    }
}

/// Recovers and classifies watermarks. Holds no per-scan state.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn marker(&self) -> &str {
        &self.config.marker
    }

    /// Scan `grid` and classify whatever its low bits decode to.
    pub fn detect(&self, grid: &PixelGrid) -> DetectionOutcome {
        let (width, height) = grid.dimensions();
        if width > self.config.max_width || height > self.config.max_height {
            debug!(
                "Skipping {}x{} carrier (limit {}x{})",
                width, height, self.config.max_width, self.config.max_height
            );
            return DetectionOutcome::NoWatermark;
        }

        let stream = scan(grid, self.config.chunk_rows);

        let text = match bits::decode(&stream) {
            Ok(text) => text,
            Err(e) => {
                debug!("No decodable payload: {}", e);
                return DetectionOutcome::NoWatermark;
            }
        };

        if is_gibberish(&text) {
            debug!("Recovered {} characters of noise", text.chars().count());
            return DetectionOutcome::NoWatermark;
        }

        if text.contains(self.config.marker.as_str()) {
            DetectionOutcome::ValidWatermark(text)
        } else {
            DetectionOutcome::InvalidWatermark(text)
        }
    }
}
