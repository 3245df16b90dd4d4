//! Thumbnail pipeline: resize, encode, embed
//!
//! Thumbnails are small JPEGs stored inline in the catalog as data URIs, so
//! listings can be rendered without touching the library again.

use crate::ThumbnailError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

/// Fixed JPEG quality for every thumbnail
pub const JPEG_QUALITY: u8 = 85;

/// Media-type prefix of an embedded thumbnail
pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Computes thumbnail dimensions for a source image
///
/// The longer side becomes exactly `max_dimension`; the shorter side is scaled
/// by the same factor and rounded, never below one pixel.
pub fn target_dimensions(
    width: u32,
    height: u32,
    max_dimension: u32,
) -> Result<(u32, u32), ThumbnailError> {
    if width == 0 || height == 0 {
        return Err(ThumbnailError::InvalidDimensions { width, height });
    }

    let scale = |side: u32, longest: u32| -> u32 {
        let scaled = (f64::from(side) * f64::from(max_dimension) / f64::from(longest)).round();
        (scaled as u32).max(1)
    };

    if width >= height {
        Ok((max_dimension, scale(height, width)))
    } else {
        Ok((scale(width, height), max_dimension))
    }
}

/// Produces an embeddable JPEG thumbnail of `source`
pub fn generate_thumbnail(
    source: &DynamicImage,
    max_dimension: u32,
) -> Result<String, ThumbnailError> {
    let (width, height) = target_dimensions(source.width(), source.height(), max_dimension)?;

    // Catmull-Rom keeps downscaled line art from aliasing
    let resized = source.resize_exact(width, height, FilterType::CatmullRom);
    let rgb = resized.to_rgb8();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| ThumbnailError::EncodeFailed(e.to_string()))?;

    Ok(to_data_uri(&encoded))
}

/// Wraps encoded JPEG bytes as a data URI
pub fn to_data_uri(jpeg: &[u8]) -> String {
    let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    uri.push_str(DATA_URI_PREFIX);
    STANDARD.encode_string(jpeg, &mut uri);
    uri
}
