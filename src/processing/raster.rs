//! # Raster Codec
//!
//! Bridges encoded image files and [`PixelGrid`]s using the `image` crate.
//! Decoding normalizes every input to 8-bit RGB (alpha is dropped). Encoding
//! keeps the requested format when the encoder accepts it and falls back to PNG
//! otherwise.

use image::ImageFormat;
use log::warn;
use std::io::Cursor;
use std::path::Path;

use super::error::WatermarkError;
use super::steganography::PixelGrid;

/// Format used when the requested encoder is unavailable.
pub const FALLBACK_FORMAT: ImageFormat = ImageFormat::Png;

/// A decoded carrier together with the format it was stored in.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub grid: PixelGrid,
    pub format: ImageFormat,
}

/// Encoded image bytes and the format actually written.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        mime_type(self.format)
    }
}

/// Decode arbitrary image bytes into an RGB pixel grid.
///
/// # Errors
/// - [`WatermarkError::UnreadableImage`] if the format is unknown or the data is corrupt
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, WatermarkError> {
    let format = image::guess_format(bytes).map_err(WatermarkError::UnreadableImage)?;
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(WatermarkError::UnreadableImage)?;

    Ok(DecodedImage {
        grid: img.to_rgb8(),
        format,
    })
}

/// Encode `grid` as `format`, or as PNG if that format cannot be written.
///
/// # Errors
/// - [`WatermarkError::EncodeFailed`] if even the PNG fallback fails
pub fn encode_image(grid: &PixelGrid, format: ImageFormat) -> Result<EncodedImage, WatermarkError> {
    if format == ImageFormat::Jpeg {
        warn!("JPEG output is lossy; the embedded watermark will likely not survive");
    }

    match write_grid(grid, format) {
        Ok(bytes) => Ok(EncodedImage { bytes, format }),
        Err(e) if format != FALLBACK_FORMAT => {
            warn!(
                "Encoding as {:?} failed ({}), falling back to {:?}",
                format, e, FALLBACK_FORMAT
            );
            let bytes = write_grid(grid, FALLBACK_FORMAT).map_err(WatermarkError::EncodeFailed)?;
            Ok(EncodedImage {
                bytes,
                format: FALLBACK_FORMAT,
            })
        }
        Err(e) => Err(WatermarkError::EncodeFailed(e)),
    }
}

fn write_grid(grid: &PixelGrid, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let mut output_bytes = Vec::new();
    grid.write_to(&mut Cursor::new(&mut output_bytes), format)?;
    Ok(output_bytes)
}

/// Pick the output format: the filename's extension when recognised, else `detected`.
pub fn resolve_format(filename: Option<&str>, detected: ImageFormat) -> ImageFormat {
    filename
        .and_then(|name| ImageFormat::from_path(Path::new(name)).ok())
        .unwrap_or(detected)
}

pub fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Tga => "image/x-tga",
        ImageFormat::Pnm => "image/x-portable-anymap",
        _ => "application/octet-stream",
    }
}

pub fn extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Ico => "ico",
        ImageFormat::Tga => "tga",
        ImageFormat::Pnm => "pnm",
        _ => "img",
    }
}

/// Name for a watermarked download, e.g. `photo.jpeg` written as PNG becomes `watermarked_photo.png`.
pub fn output_filename(original: &str, format: ImageFormat) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image");

    let original_ext = Path::new(original)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|ext| ImageFormat::from_extension(ext) == Some(format));

    match original_ext {
        Some(ext) => format!("watermarked_{}.{}", stem, ext),
        None => format!("watermarked_{}.{}", stem, extension(format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    fn sample_grid() -> PixelGrid {
        PixelGrid::from_fn(4, 3, |x, y| Rgb([x as u8 * 40, y as u8 * 60, 200]))
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let grid = sample_grid();
        let encoded = encode_image(&grid, ImageFormat::Png).unwrap();
        assert_eq!(encoded.mime_type(), "image/png");

        let decoded = decode_image(&encoded.bytes).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(decoded.grid, grid);
    }

    #[test]
    fn test_alpha_is_dropped() {
        let rgba = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0]));
        let mut bytes = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.grid.get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(WatermarkError::UnreadableImage(_))
        ));
    }

    #[test]
    fn test_unwritable_format_falls_back_to_png() {
        let encoded = encode_image(&sample_grid(), ImageFormat::Dds).unwrap();
        assert_eq!(encoded.format, ImageFormat::Png);
        assert_eq!(decode_image(&encoded.bytes).unwrap().grid, sample_grid());
    }

    #[test]
    fn test_resolve_format_prefers_extension() {
        assert_eq!(
            resolve_format(Some("photo.bmp"), ImageFormat::Png),
            ImageFormat::Bmp
        );
        assert_eq!(
            resolve_format(Some("no_extension"), ImageFormat::Gif),
            ImageFormat::Gif
        );
        assert_eq!(resolve_format(None, ImageFormat::Png), ImageFormat::Png);
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename("cat.jpeg", ImageFormat::Jpeg),
            "watermarked_cat.jpeg"
        );
        assert_eq!(
            output_filename("cat.dds", ImageFormat::Png),
            "watermarked_cat.png"
        );
        assert_eq!(output_filename("", ImageFormat::Png), "watermarked_image.png");
    }
}
