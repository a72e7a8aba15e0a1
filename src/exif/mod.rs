//! EXIF metadata extraction.
//!
//! [`read_metadata`] decodes the EXIF block of any container nom-exif
//! understands (HEIC/HEIF, JPEG, TIFF) into a [`MetadataRecord`] whose
//! `Display` output is the text printed by the converter.

mod reader;

pub use reader::{MetadataEntry, MetadataRecord, read_metadata};
