use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader};
use tracing::debug;

use crate::error::Result;

/// Bilinear, close to what a canvas draw does.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Downscale settings applied when a photo is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConfig {
    /// Largest allowed width or height, in pixels.
    pub max_dimension: u32,
    /// JPEG quality (1-100) for re-encoded copies.
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            jpeg_quality: 90,
        }
    }
}

/// Image bytes ready to store.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub resized: bool,
}

/// Keep the image as-is if it fits, otherwise scale it down proportionally
/// so its larger side equals `max_dimension` and re-encode as JPEG.
///
/// Only the header is read for images that already fit.
pub fn prepare(bytes: Vec<u8>, config: &ImageConfig) -> Result<PreparedImage> {
    let format = image::guess_format(&bytes)?;
    let (width, height) = ImageReader::with_format(Cursor::new(bytes.as_slice()), format)
        .into_dimensions()?;

    if width.max(height) <= config.max_dimension {
        return Ok(PreparedImage {
            data: bytes,
            mime_type: format.to_mime_type().to_string(),
            width,
            height,
            resized: false,
        });
    }

    let decoded = ImageReader::with_format(Cursor::new(bytes.as_slice()), format).decode()?;
    let scaled = decoded.resize(config.max_dimension, config.max_dimension, RESIZE_FILTER);
    // JPEG has no alpha channel
    let rgb = scaled.to_rgb8();

    let mut data = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut data, config.jpeg_quality))?;

    debug!(
        "Downscaled {}x{} {:?} to {}x{} JPEG ({} -> {} bytes)",
        width,
        height,
        format,
        rgb.width(),
        rgb.height(),
        bytes.len(),
        data.len()
    );

    Ok(PreparedImage {
        mime_type: ImageFormat::Jpeg.to_mime_type().to_string(),
        width: rgb.width(),
        height: rgb.height(),
        data,
        resized: true,
    })
}

/// Width and height of encoded image bytes.
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let format = image::guess_format(bytes)?;
    Ok(ImageReader::with_format(Cursor::new(bytes), format).into_dimensions()?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    /// Encode a blank image of the given size in `format`.
    pub(crate) fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let img = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn small_image_is_stored_untouched() {
        let bytes = encoded(800, 600, ImageFormat::Png);
        let prepared = prepare(bytes.clone(), &ImageConfig::default()).unwrap();

        assert!(!prepared.resized);
        assert_eq!(prepared.data, bytes);
        assert_eq!(prepared.mime_type, "image/png");
        assert_eq!((prepared.width, prepared.height), (800, 600));
    }

    #[test]
    fn exact_threshold_is_not_resized() {
        let bytes = encoded(1920, 10, ImageFormat::Png);
        let prepared = prepare(bytes, &ImageConfig::default()).unwrap();
        assert!(!prepared.resized);
    }

    #[test]
    fn oversized_image_is_downscaled_proportionally() {
        let bytes = encoded(4000, 500, ImageFormat::Png);
        let prepared = prepare(bytes, &ImageConfig::default()).unwrap();

        assert!(prepared.resized);
        assert_eq!(prepared.mime_type, "image/jpeg");
        assert_eq!(prepared.width, 1920);
        assert_eq!(prepared.height, 240);
        assert_eq!(dimensions(&prepared.data).unwrap(), (1920, 240));
    }

    #[test]
    fn tall_image_scales_on_height() {
        let bytes = encoded(300, 2400, ImageFormat::Png);
        let config = ImageConfig {
            max_dimension: 1200,
            jpeg_quality: 80,
        };
        let prepared = prepare(bytes, &config).unwrap();

        assert_eq!((prepared.width, prepared.height), (150, 1200));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = prepare(b"definitely not an image".to_vec(), &ImageConfig::default());
        assert!(matches!(err, Err(crate::Error::InvalidImage(_))));
    }
}
