//! Image transcoding for inline mail attachments.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::{Mail2BlogError, Result};

/// Maximum width of a published image asset, in pixels.
pub const MAX_ASSET_WIDTH: u32 = 600;

/// Decode an image payload, cap its width and re-encode it as JPEG.
///
/// Images wider than `max_width` are resized with Lanczos resampling,
/// keeping the aspect ratio (`new_height = round(h × max_width / w)`).
/// The output is always RGB JPEG, even when no resize happened, so every
/// published asset has a predictable format.
pub fn transcode_to_jpeg(payload: &[u8], max_width: u32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(payload)
        .map_err(|e| Mail2BlogError::ImageDecode(e.to_string()))?;

    let (width, height) = (img.width(), img.height());
    let img = if width > max_width {
        let new_height = (height as f64 * max_width as f64 / width as f64).round() as u32;
        img.resize_exact(max_width, new_height.max(1), FilterType::Lanczos3)
    } else {
        img
    };

    // JPEG has no alpha channel; flatten to RGB first.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| Mail2BlogError::ImageEncode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Encode a solid-color RGBA PNG of the given dimensions, for tests.
#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 120, 200, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode test PNG");
    out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimensions(jpeg: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(jpeg).expect("decode transcoded JPEG");
        (img.width(), img.height())
    }

    #[test]
    fn test_wide_image_is_resized() {
        let jpeg = transcode_to_jpeg(&png_bytes(800, 400), MAX_ASSET_WIDTH).unwrap();
        assert_eq!(dimensions(&jpeg), (600, 300));
    }

    #[test]
    fn test_resize_rounds_height() {
        // 700×467 → 600×round(467 × 600 / 700) = 600×400
        let jpeg = transcode_to_jpeg(&png_bytes(700, 467), MAX_ASSET_WIDTH).unwrap();
        assert_eq!(dimensions(&jpeg), (600, 400));
    }

    #[test]
    fn test_narrow_image_keeps_dimensions() {
        let jpeg = transcode_to_jpeg(&png_bytes(300, 200), MAX_ASSET_WIDTH).unwrap();
        assert_eq!(dimensions(&jpeg), (300, 200));
    }

    #[test]
    fn test_narrow_image_still_reencoded_as_jpeg() {
        let jpeg = transcode_to_jpeg(&png_bytes(300, 200), MAX_ASSET_WIDTH).unwrap();
        let format = image::guess_format(&jpeg).unwrap();
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_exact_width_is_not_resized() {
        let jpeg = transcode_to_jpeg(&png_bytes(600, 100), MAX_ASSET_WIDTH).unwrap();
        assert_eq!(dimensions(&jpeg), (600, 100));
    }

    #[test]
    fn test_undecodable_payload_errors() {
        let err = transcode_to_jpeg(b"definitely not an image", MAX_ASSET_WIDTH).unwrap_err();
        assert!(matches!(err, Mail2BlogError::ImageDecode(_)));
    }
}
