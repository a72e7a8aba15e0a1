//! Hand-built image fixtures for the test suite.
//!
//! No HEIC sample ships with the crate, so metadata tests run against JPEGs
//! carrying a small big-endian EXIF block:
//!
//! - IFD0: `Orientation = 6`, plus the pointer to the Exif sub-IFD
//! - Exif IFD: `DateTimeOriginal = "2024:01:02 03:04:05"`

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub const ORIENTATION: u16 = 6;
pub const DATE_TIME_ORIGINAL: &[u8; 20] = b"2024:01:02 03:04:05\0";

const TAG_ORIENTATION: u16 = 0x0112;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;

fn ifd_entry(buf: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: [u8; 4]) {
    buf.extend_from_slice(&tag.to_be_bytes());
    buf.extend_from_slice(&kind.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(&value);
}

/// TIFF-structured EXIF payload (without the `Exif\0\0` prefix).
pub fn exif_tiff_block() -> Vec<u8> {
    // header 8, IFD0 at 8 (2 entries), Exif IFD at 38 (1 entry), date string at 56
    const IFD0: u32 = 8;
    const EXIF_IFD: u32 = 38;
    const DATE: u32 = 56;

    let mut tiff = b"MM\0\x2A".to_vec();
    tiff.extend_from_slice(&IFD0.to_be_bytes());

    tiff.extend_from_slice(&2u16.to_be_bytes());
    let [hi, lo] = ORIENTATION.to_be_bytes();
    ifd_entry(&mut tiff, TAG_ORIENTATION, TYPE_SHORT, 1, [hi, lo, 0, 0]);
    ifd_entry(&mut tiff, TAG_EXIF_IFD, TYPE_LONG, 1, EXIF_IFD.to_be_bytes());
    tiff.extend_from_slice(&0u32.to_be_bytes());

    tiff.extend_from_slice(&1u16.to_be_bytes());
    ifd_entry(
        &mut tiff,
        TAG_DATE_TIME_ORIGINAL,
        TYPE_ASCII,
        DATE_TIME_ORIGINAL.len() as u32,
        DATE.to_be_bytes(),
    );
    tiff.extend_from_slice(&0u32.to_be_bytes());

    debug_assert_eq!(tiff.len(), DATE as usize);
    tiff.extend_from_slice(DATE_TIME_ORIGINAL);
    tiff
}

/// An APP1 segment holding [`exif_tiff_block`].
fn app1_segment() -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&exif_tiff_block());

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

/// A decodable JPEG of the given size with the EXIF block inserted right
/// after SOI.
pub fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut encoded, ImageFormat::Jpeg)
        .unwrap();
    let encoded = encoded.into_inner();

    let mut jpeg = encoded[..2].to_vec();
    jpeg.extend_from_slice(&app1_segment());
    jpeg.extend_from_slice(&encoded[2..]);
    jpeg
}

/// SOI + EXIF APP1 + EOI: the metadata parses, but there is no frame to
/// decode.
pub fn jpeg_with_exif_and_no_frame() -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend_from_slice(&app1_segment());
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}
