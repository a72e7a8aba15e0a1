use nom_exif::{EntryValue, ExifIter, MediaParser, MediaSource};
use serde::Serialize;
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

use crate::error::ConvertError;

/// EXIF metadata decoded from a source image, in file order.
///
/// Values are kept as rendered strings: the record is printed once and
/// reported, never interpreted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetadataRecord {
    pub entries: Vec<MetadataEntry>,
    /// GPS position in ISO 6709 form, when the image carries one.
    pub gps: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataEntry {
    pub tag: String,
    pub value: String,
}

impl MetadataRecord {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.gps.is_none()
    }

    /// Look up the rendered value of a tag by name (e.g. `"Orientation"`).
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.tag == tag)
            .map(|e| e.value.as_str())
    }
}

impl fmt::Display for MetadataRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(no EXIF entries)");
        }
        let mut first = true;
        for entry in &self.entries {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "{:<32}=> {}", entry.tag, entry.value)?;
        }
        if let Some(ref gps) = self.gps {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{:<32}=> {}", "GpsIso6709", gps)?;
        }
        Ok(())
    }
}

/// Decode the EXIF block of an open, seekable source.
///
/// Reads from the reader's current position; callers that go on to decode
/// pixels from the same handle must rewind it afterwards. `path` only labels
/// errors.
///
/// A container nom-exif does not recognise, a format that cannot carry EXIF,
/// and a missing or malformed EXIF block are all [`ConvertError::Metadata`].
pub fn read_metadata<R: Read + Seek>(
    reader: R,
    path: &Path,
) -> Result<MetadataRecord, ConvertError> {
    let metadata_err = |reason: String| ConvertError::Metadata {
        path: path.to_path_buf(),
        reason,
    };

    let mut parser = MediaParser::new();
    let ms = MediaSource::seekable(reader).map_err(|e| metadata_err(e.to_string()))?;
    if !ms.has_exif() {
        return Err(metadata_err("container has no EXIF-capable layout".into()));
    }

    let iter: ExifIter = parser.parse(ms).map_err(|e| metadata_err(e.to_string()))?;

    // Parse GPS before iterating (the iterator is consumed below)
    let gps = match iter.parse_gps_info() {
        Ok(info) => info.map(|g| g.format_iso6709()),
        Err(e) => {
            log::warn!("Ignoring unreadable GPS block in {}: {e}", path.display());
            None
        }
    };

    let mut record = MetadataRecord {
        entries: Vec::new(),
        gps,
    };

    for entry in iter {
        let tag = entry
            .tag()
            .map(|t| t.to_string())
            .unwrap_or_else(|| format!("Unknown(0x{:04x})", entry.tag_code()));
        match entry.get_value() {
            Some(value) => record.entries.push(MetadataEntry {
                tag,
                value: render_value(value),
            }),
            None => log::debug!("Skipping undecodable EXIF entry {tag}"),
        }
    }

    log::debug!(
        "Decoded {} EXIF entries from {}",
        record.entries.len(),
        path.display()
    );
    Ok(record)
}

/// Render an EntryValue on a single line.
fn render_value(val: &EntryValue) -> String {
    let s = val.to_string();
    s.trim().trim_matches('"').replace(['\n', '\r'], " ")
}
