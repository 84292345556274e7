//! Contact photo pipeline: decode, cap width, re-encode as JPEG, upload.

pub mod host;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, GenericImageView};
use thiserror::Error;

pub use host::{host_from_config, CloudinaryHost, DisabledImageHost, ImageHost};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("cannot encode image: {0}")]
    Encode(String),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("image host not configured: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub max_width: u32,
    pub quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self { Self { max_width: 800, quality: 90 } }
}

impl From<&configs::ImageConfig> for ImageOptions {
    fn from(cfg: &configs::ImageConfig) -> Self {
        Self { max_width: cfg.max_width, quality: cfg.quality }
    }
}

/// Target size for an image `width`×`height` capped at `max_width`.
/// Aspect ratio is kept and narrower images are never enlarged.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (u64::from(height) * u64::from(max_width) + u64::from(width) / 2) / u64::from(width);
    (max_width, scaled.max(1) as u32)
}

/// Decode `bytes`, shrink to `opts.max_width` and re-encode as JPEG.
///
/// CPU bound; callers on the async runtime should go through
/// `tokio::task::spawn_blocking`.
pub fn optimize(bytes: &[u8], opts: ImageOptions) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();
    let (w, h) = target_dimensions(width, height, opts.max_width);
    let img = if (w, h) == (width, height) { img } else { img.resize_exact(w, h, FilterType::Lanczos3) };

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, opts.quality)
        .encode_image(&rgb)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::png_bytes;

    #[test]
    fn wide_images_are_capped_with_aspect_ratio() {
        assert_eq!(target_dimensions(1600, 400, 800), (800, 200));
        assert_eq!(target_dimensions(1000, 333, 800), (800, 266));
        assert_eq!(target_dimensions(4000, 1, 800), (800, 1));
    }

    #[test]
    fn narrow_images_are_left_alone() {
        assert_eq!(target_dimensions(640, 480, 800), (640, 480));
        assert_eq!(target_dimensions(800, 600, 800), (800, 600));
    }

    #[test]
    fn optimize_resizes_and_outputs_jpeg() {
        let jpeg = optimize(&png_bytes(1600, 400), ImageOptions::default()).expect("optimize");
        assert_eq!(image::guess_format(&jpeg).expect("format"), image::ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&jpeg).expect("decode");
        assert_eq!(decoded.dimensions(), (800, 200));
    }

    #[test]
    fn optimize_keeps_small_images_size() {
        let jpeg = optimize(&png_bytes(120, 90), ImageOptions { max_width: 800, quality: 60 }).expect("optimize");
        let decoded = image::load_from_memory(&jpeg).expect("decode");
        assert_eq!(decoded.dimensions(), (120, 90));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = optimize(b"definitely not an image", ImageOptions::default()).unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }
}
