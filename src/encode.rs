//! JPEG re-encoding into an in-memory buffer.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::ConvertError;

/// Encoder settings. The default leaves everything to the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JpegOptions {
    /// Quality 1-100. `None` uses the encoder's default (75).
    #[serde(default)]
    pub quality: Option<u8>,
}

/// Encode `image` as baseline JPEG.
///
/// JPEG only carries 8-bit grey or RGB, so alpha channels are dropped and
/// deeper or float images are narrowed to RGB8 first.
pub fn encode_jpeg(image: &DynamicImage, options: &JpegOptions) -> Result<Vec<u8>, ConvertError> {
    let image = jpeg_compatible(image);
    let mut buf = Vec::new();
    let encoder = match options.quality {
        Some(q) => JpegEncoder::new_with_quality(&mut buf, q),
        None => JpegEncoder::new(&mut buf),
    };
    image.write_with_encoder(encoder)?;

    log::debug!(
        "Encoded {}x{} JPEG ({} bytes)",
        image.width(),
        image.height(),
        buf.len()
    );
    Ok(buf)
}

fn jpeg_compatible(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(image),
        other => {
            log::debug!("Converting {other:?} to Rgb8 for JPEG");
            Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
        }
    }
}
