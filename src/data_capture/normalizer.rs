//! Conversion of retrieved image bytes into the canonical stored form.
//!
//! Whatever the camera publishes (static JPEG/PNG/WebP/BMP or an animated GIF
//! shown while the stream loads) is reduced to one RGB frame and re-encoded as
//! JPEG at a fixed quality. The same input always yields the same output bytes,
//! so identical pictures share a fingerprint.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::jpeg::JpegEncoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, Rgb, RgbImage};
use log::trace;

use crate::error_handling::types::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageNormalizer {
    quality: u8,
}

impl ImageNormalizer {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Decodes `raw`, keeps its first frame and encodes it as JPEG.
    ///
    /// Errors
    /// - [`CaptureError::DecodeFailed`] when the bytes are not a supported image.
    pub fn normalize(&self, raw: &[u8]) -> Result<Vec<u8>, CaptureError> {
        let format = image::guess_format(raw).map_err(decode_error)?;
        let frame = match format {
            ImageFormat::Gif => first_gif_frame(raw)?,
            other => image::load_from_memory_with_format(raw, other).map_err(decode_error)?,
        };
        trace!(
            "Decoded {:?} {}x{} ({} bytes)",
            format,
            frame.width(),
            frame.height(),
            raw.len()
        );

        let rgb = flatten_on_white(frame);
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality)
            .encode_image(&rgb)
            .map_err(|e| CaptureError::DecodeFailed(format!("JPEG encoding failed: {}", e)))?;
        Ok(encoded)
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(90)
    }
}

fn first_gif_frame(raw: &[u8]) -> Result<DynamicImage, CaptureError> {
    let decoder = GifDecoder::new(Cursor::new(raw)).map_err(decode_error)?;
    let frame = decoder
        .into_frames()
        .next()
        .ok_or_else(|| CaptureError::DecodeFailed(String::from("GIF holds no frame")))?
        .map_err(decode_error)?;
    Ok(DynamicImage::ImageRgba8(frame.into_buffer()))
}

/// Composites transparent pixels over white; JPEG has no alpha channel.
fn flatten_on_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}

fn decode_error(err: image::ImageError) -> CaptureError {
    CaptureError::DecodeFailed(err.to_string())
}
