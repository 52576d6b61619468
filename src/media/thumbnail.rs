//! Downscaled WebP thumbnails for the gallery.

use std::path::Path;

use crate::error::MediaError;

/// Longest side of a generated thumbnail, in pixels.
pub const THUMBNAIL_MAX_DIMENSION: u32 = 320;

/// Encodes a thumbnail of `bytes` as lossless WebP, at most `max_size` pixels
/// on its longest side. Smaller images keep their size.
#[cfg(feature = "thumbnails")]
pub fn make_thumbnail(name: &str, bytes: &[u8], max_size: u32) -> Result<Vec<u8>, MediaError> {
    // Some decoders panic on hostile input
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        make_thumbnail_inner(name, bytes, max_size)
    }))
    .map_err(|_| MediaError::Decode {
        name: name.to_string(),
        reason: "decoder panicked".to_string(),
    })?
}

#[cfg(feature = "thumbnails")]
fn make_thumbnail_inner(name: &str, bytes: &[u8], max_size: u32) -> Result<Vec<u8>, MediaError> {
    use image::ColorType;
    use image::codecs::webp::WebPEncoder;

    let img = image::load_from_memory(bytes).map_err(|e| MediaError::Decode {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let resized = if img.width() > max_size || img.height() > max_size {
        img.thumbnail(max_size, max_size)
    } else {
        img
    };
    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();

    let mut webp_bytes: Vec<u8> = Vec::new();
    WebPEncoder::new_lossless(&mut webp_bytes)
        .encode(&rgba, w, h, ColorType::Rgba8.into())
        .map_err(|e| MediaError::Thumbnail {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(webp_bytes)
}

#[cfg(not(feature = "thumbnails"))]
pub fn make_thumbnail(name: &str, _bytes: &[u8], _max_size: u32) -> Result<Vec<u8>, MediaError> {
    Err(MediaError::Unsupported(name.to_string()))
}

/// Generates a thumbnail for `bytes` at `dest`.
///
/// An existing file at `dest` is kept as is, so re-runs do not re-encode.
pub fn write_thumbnail(
    name: &str,
    bytes: &[u8],
    dest: &Path,
    max_size: u32,
) -> Result<(), MediaError> {
    if dest.is_file() {
        return Ok(());
    }
    let encoded = make_thumbnail(name, bytes, max_size)?;
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    super::persist_atomically(dir, dest, &encoded).map_err(|e| MediaError::Thumbnail {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
