use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

use crate::types::EmbeddedImage;
use crate::PdfError;

/// JPEG quality used for embedded rasters.
pub const JPEG_QUALITY: u8 = 90;

/// Identify a PNG or JPEG raster by its signature.
pub fn detect_raster(bytes: &[u8]) -> Option<image::ImageFormat> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(image::ImageFormat::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(image::ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Decode a PNG or JPEG raster and re-encode it for embedding.
///
/// Transparent pixels are composited onto white, since the embedded stream
/// carries no soft mask.
pub fn prepare_image(bytes: &[u8]) -> Result<EmbeddedImage, PdfError> {
    let format = detect_raster(bytes)
        .ok_or_else(|| PdfError::Image("expected PNG or JPEG data".to_string()))?;

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| PdfError::Image(e.to_string()))?;

    let rgb = flatten_on_white(&decoded);
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(PdfError::Image("image has no pixels".to_string()));
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut Cursor::new(&mut jpeg), JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| PdfError::Image(e.to_string()))?;

    Ok(EmbeddedImage {
        width,
        height,
        jpeg,
    })
}

fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((u16::from(c) * u16::from(a) + 255 * (255 - u16::from(a))) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
