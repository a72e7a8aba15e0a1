//! Format-sniffing image decoder.
//!
//! ISO-BMFF containers with a HEIF brand go to libheif; everything else is
//! handed to the `image` crate's own format guesser.

use image::{DynamicImage, ImageFormat, ImageReader, RgbImage, RgbaImage};
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
use std::fmt;
use std::io::Cursor;
use std::path::Path;

use crate::error::ConvertError;

/// Brands of HEVC-coded HEIF images.
const HEIC_BRANDS: &[&[u8; 4]] = &[b"heic", b"heix", b"heim", b"heis", b"hevc", b"hevx"];
/// Brands of AV1-coded HEIF images.
const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];
/// Generic HEIF structural brands.
const HEIF_BRANDS: &[&[u8; 4]] = &[b"mif1", b"msf1"];

/// The format a source image was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Heic,
    Heif,
    Avif,
    /// Anything the `image` crate recognised on its own.
    Other(ImageFormat),
}

impl SourceFormat {
    /// Short lowercase label, e.g. `"heic"` or `"png"`.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Heic => "heic",
            Self::Heif => "heif",
            Self::Avif => "avif",
            Self::Other(f) => f.extensions_str().first().copied().unwrap_or("unknown"),
        }
    }

    /// Whether decoding goes through libheif.
    pub fn is_heif_family(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A decoded raster plus the format it came from.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: SourceFormat,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Classify an ISO-BMFF `ftyp` box by its major and compatible brands.
///
/// Returns `None` for data that does not start with an `ftyp` box or whose
/// brands name no HEIF variant. Specific brands (HEVC, AV1) win over the
/// generic `mif1`/`msf1`.
pub fn sniff_heif(data: &[u8]) -> Option<SourceFormat> {
    if data.len() < 16 || &data[4..8] != b"ftyp" {
        return None;
    }
    // A size of 0 means the box runs to the end of the data
    let box_size = match u32::from_be_bytes([data[0], data[1], data[2], data[3]]) {
        0 => data.len(),
        n => n as usize,
    };
    let end = box_size.clamp(16, data.len());

    // Major brand, then compatible brands after the 4-byte minor version
    let brands: Vec<&[u8]> = std::iter::once(&data[8..12])
        .chain(data[16..end].chunks_exact(4))
        .collect();

    let has = |set: &[&[u8; 4]]| brands.iter().any(|b| set.iter().any(|s| &s[..] == *b));
    if has(HEIC_BRANDS) {
        Some(SourceFormat::Heic)
    } else if has(AVIF_BRANDS) {
        Some(SourceFormat::Avif)
    } else if has(HEIF_BRANDS) {
        Some(SourceFormat::Heif)
    } else {
        None
    }
}

/// Decode a complete source file held in memory.
///
/// `path` only labels errors.
pub fn decode_image(data: &[u8], path: &Path) -> Result<DecodedImage, ConvertError> {
    let decode_err = |reason: String| ConvertError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(format) = sniff_heif(data) {
        log::debug!("Sniffed {format} container, decoding with libheif");
        let image = decode_heif(data).map_err(|e| decode_err(e.to_string()))?;
        return Ok(DecodedImage { image, format });
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?;
    let Some(format) = reader.format() else {
        return Err(decode_err("unrecognised image format".into()));
    };
    log::debug!("Sniffed {format:?}, decoding with the image crate");
    let image = reader.decode().map_err(|e| decode_err(e.to_string()))?;

    Ok(DecodedImage {
        image,
        format: SourceFormat::Other(format),
    })
}

/// Decode the primary image of a HEIF container to 8-bit RGB(A).
fn decode_heif(data: &[u8]) -> Result<DynamicImage, HeifDecodeError> {
    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data)?;
    let handle = ctx.primary_image_handle()?;
    let has_alpha = handle.has_alpha_channel();
    let chroma = if has_alpha {
        RgbChroma::Rgba
    } else {
        RgbChroma::Rgb
    };

    let decoded = lib_heif.decode(&handle, ColorSpace::Rgb(chroma), None)?;
    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or(HeifDecodeError::Layout("no interleaved plane"))?;

    let channels = if has_alpha { 4 } else { 3 };
    let pixels = pack_rows(plane.data, plane.width, plane.height, plane.stride, channels)?;

    let image = if has_alpha {
        RgbaImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgb8)
    };
    image.ok_or(HeifDecodeError::Layout("plane smaller than its dimensions"))
}

/// Copy a strided plane into a tightly packed buffer.
fn pack_rows(
    data: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    channels: usize,
) -> Result<Vec<u8>, HeifDecodeError> {
    let row_len = width as usize * channels;
    if stride < row_len {
        return Err(HeifDecodeError::Layout("stride shorter than a row"));
    }
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for y in 0..height as usize {
        let start = y * stride;
        let row = data
            .get(start..start + row_len)
            .ok_or(HeifDecodeError::Layout("plane truncated"))?;
        pixels.extend_from_slice(row);
    }
    Ok(pixels)
}

#[derive(Debug, thiserror::Error)]
enum HeifDecodeError {
    #[error(transparent)]
    Heif(#[from] libheif_rs::HeifError),
    #[error("unexpected pixel layout: {0}")]
    Layout(&'static str),
}
