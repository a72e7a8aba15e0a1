//! # heic2jpeg
//!
//! Convert a HEIC/HEIF photo to JPEG: print its EXIF metadata, decode the
//! pixels through libheif, and re-encode them with the `image` crate's JPEG
//! encoder.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use heic2jpeg::encode::JpegOptions;
//! use heic2jpeg::pipeline::{codec_version, convert};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     println!("{}", codec_version());
//!
//!     let report = convert(
//!         Path::new("sample.heic"),
//!         Path::new("sample.jpeg"),
//!         &JpegOptions::default(),
//!     )?;
//!
//!     println!("{}", report.metadata);
//!     println!("{}", report.format);
//!     Ok(())
//! }
//! ```
//!
//! ## Stages
//!
//! Each stage is usable on its own:
//!
//! ```rust,no_run
//! use heic2jpeg::{decode, encode, exif};
//! use std::fs::File;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let path = Path::new("sample.heic");
//!
//!     // 1. Metadata from an open handle
//!     let metadata = exif::read_metadata(File::open(path)?, path)?;
//!     println!("Orientation: {:?}", metadata.get("Orientation"));
//!
//!     // 2. Pixels from the whole file
//!     let decoded = decode::decode_image(&std::fs::read(path)?, path)?;
//!
//!     // 3. JPEG bytes in memory
//!     let jpeg = encode::encode_jpeg(&decoded.image, &encode::JpegOptions { quality: Some(85) })?;
//!     std::fs::write("sample.jpeg", jpeg)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Settings file and path resolution
//! - [`decode`] — Format sniffing and HEIF/other decoding
//! - [`encode`] — JPEG encoding
//! - [`error`] — The [`ConvertError`](error::ConvertError) taxonomy and exit codes
//! - [`exif`] — EXIF metadata extraction
//! - [`pipeline`] — The end-to-end conversion

pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod exif;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_helpers;
