use serde::Serialize;
use std::fs::{self, File};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use libheif_rs::LibHeif;

use crate::decode::{self, DecodedImage};
use crate::encode::{self, JpegOptions};
use crate::error::ConvertError;
use crate::exif::{self, MetadataRecord};

/// The outcome of one successful conversion.
///
/// # Example
///
/// ```rust,no_run
/// use heic2jpeg::encode::JpegOptions;
/// use heic2jpeg::pipeline::convert;
/// use std::path::Path;
///
/// let report = convert(
///     Path::new("sample.heic"),
///     Path::new("sample.jpeg"),
///     &JpegOptions::default(),
/// )?;
/// println!("{}x{} {}", report.width, report.height, report.format);
/// # Ok::<(), heic2jpeg::error::ConvertError>(())
/// ```
#[derive(Debug, Serialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Version of the linked HEIF codec.
    pub codec_version: String,
    /// Detected source format tag (`"heic"`, `"png"`, ...).
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub bytes_written: u64,
    pub metadata: MetadataRecord,
}

/// Version string of the linked libheif, e.g. `"libheif 1.17.6"`.
pub fn codec_version() -> String {
    let [major, minor, patch] = LibHeif::new().version();
    format!("libheif {major}.{minor}.{patch}")
}

/// Open a source file for reading.
pub fn open_source(path: &Path) -> Result<File, ConvertError> {
    File::open(path).map_err(|source| ConvertError::OpenSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode only the metadata of `source` (stages 1-3).
pub fn inspect(source: &Path) -> Result<MetadataRecord, ConvertError> {
    let mut file = open_source(source)?;
    exif::read_metadata(&mut file, source)
}

/// A stage that has just completed, reported while the conversion runs.
#[derive(Debug)]
pub enum Progress<'a> {
    /// Metadata was decoded; pixels have not been touched yet.
    Metadata(&'a MetadataRecord),
    /// Pixels were decoded; the format tag is known.
    Decoded(&'a DecodedImage),
    /// The JPEG is encoded and about to be written here.
    Writing(&'a Path),
}

/// Convert `source` to a JPEG at `destination`.
///
/// Same as [`convert_with`] without progress reporting.
pub fn convert(
    source: &Path,
    destination: &Path,
    options: &JpegOptions,
) -> Result<ConversionReport, ConvertError> {
    convert_with(source, destination, options, |_| {})
}

/// Convert `source` to a JPEG at `destination`, reporting each stage.
///
/// Runs every stage in order and stops at the first failure:
///
/// 1. **Open** the source
/// 2. **Read metadata** from the stream ([`Progress::Metadata`])
/// 3. **Rewind** and read the whole stream
/// 4. **Decode** pixels through the format sniffer ([`Progress::Decoded`])
/// 5. **Export** as JPEG ([`Progress::Writing`] between encode and write)
///
/// A stage's progress event fires before any later stage runs, so a failure
/// in decoding still leaves the metadata reported. The source handle is
/// closed on every exit path, and no destination file is left behind when a
/// stage fails.
///
/// # Example
///
/// ```rust,no_run
/// use heic2jpeg::encode::JpegOptions;
/// use heic2jpeg::pipeline::{Progress, convert_with};
/// use std::path::Path;
///
/// convert_with(
///     Path::new("sample.heic"),
///     Path::new("sample.jpeg"),
///     &JpegOptions::default(),
///     |progress| match progress {
///         Progress::Metadata(record) => println!("{record}"),
///         Progress::Decoded(image) => println!("{}", image.format),
///         Progress::Writing(path) => println!("writing to {}", path.display()),
///     },
/// )?;
/// # Ok::<(), heic2jpeg::error::ConvertError>(())
/// ```
pub fn convert_with<F>(
    source: &Path,
    destination: &Path,
    options: &JpegOptions,
    mut on_progress: F,
) -> Result<ConversionReport, ConvertError>
where
    F: FnMut(Progress<'_>),
{
    let mut file = open_source(source)?;
    log::debug!("Opened {}", source.display());

    let metadata = exif::read_metadata(&mut file, source)?;
    on_progress(Progress::Metadata(&metadata));

    let data = read_from_start(&mut file, source)?;
    drop(file);

    let decoded = decode::decode_image(&data, source)?;
    log::debug!(
        "Decoded {} as {} ({}x{})",
        source.display(),
        decoded.format,
        decoded.width(),
        decoded.height()
    );
    on_progress(Progress::Decoded(&decoded));

    let bytes_written = write_jpeg(&decoded, destination, options, &mut on_progress)?;

    Ok(ConversionReport {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        codec_version: codec_version(),
        format: decoded.format.tag().to_string(),
        width: decoded.width(),
        height: decoded.height(),
        bytes_written,
        metadata,
    })
}

/// Rewind `file` to offset zero and read it to the end.
fn read_from_start(file: &mut File, path: &Path) -> Result<Vec<u8>, ConvertError> {
    let read_err = |source| ConvertError::ReadSource {
        path: path.to_path_buf(),
        source,
    };
    file.rewind().map_err(read_err)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).map_err(read_err)?;
    Ok(data)
}

/// Create `destination`, encode `decoded` as JPEG and write it out.
///
/// The destination is created (truncating any existing file) before
/// encoding. If encoding or writing fails the half-written file is removed.
/// Returns the number of bytes written.
pub fn export_jpeg(
    decoded: &DecodedImage,
    destination: &Path,
    options: &JpegOptions,
) -> Result<u64, ConvertError> {
    write_jpeg(decoded, destination, options, &mut |_: Progress<'_>| {})
}

fn write_jpeg<F>(
    decoded: &DecodedImage,
    destination: &Path,
    options: &JpegOptions,
    on_progress: &mut F,
) -> Result<u64, ConvertError>
where
    F: FnMut(Progress<'_>),
{
    let mut output = PendingOutput::create(destination)?;
    let jpeg = encode::encode_jpeg(&decoded.image, options)?;
    on_progress(Progress::Writing(destination));
    output.write_all(&jpeg)?;
    output.commit();
    Ok(jpeg.len() as u64)
}

/// A destination file that is deleted on drop unless committed.
struct PendingOutput<'a> {
    path: &'a Path,
    file: File,
    committed: bool,
}

impl<'a> PendingOutput<'a> {
    fn create(path: &'a Path) -> Result<Self, ConvertError> {
        let file = File::create(path).map_err(|source| ConvertError::CreateDestination {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path,
            file,
            committed: false,
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ConvertError> {
        let write_err = |source| ConvertError::Write {
            path: self.path.to_path_buf(),
            source,
        };
        self.file.write_all(bytes).map_err(write_err)?;
        self.file.sync_all().map_err(write_err)
    }

    /// Keep the file. The handle closes when `self` drops.
    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PendingOutput<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_file(self.path) {
            log::warn!("Failed to remove partial {}: {e}", self.path.display());
        } else {
            log::debug!("Removed partial {}", self.path.display());
        }
    }
}
