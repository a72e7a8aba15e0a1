use std::io;
use std::path::PathBuf;

/// Every way a conversion can fail, one variant per pipeline stage.
///
/// Variants carry the path involved so the binary can print a one-line
/// diagnostic without extra context. [`ConvertError::exit_code`] maps each
/// kind to a distinct process exit status.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("cannot open source {}: {source}", path.display())]
    OpenSource { path: PathBuf, source: io::Error },

    #[error("cannot decode metadata of {}: {reason}", path.display())]
    Metadata { path: PathBuf, reason: String },

    #[error("cannot read source {}: {source}", path.display())]
    ReadSource { path: PathBuf, source: io::Error },

    #[error("cannot decode image {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("destination {} is not writable: {source}", path.display())]
    CreateDestination { path: PathBuf, source: io::Error },

    #[error("cannot encode JPEG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl ConvertError {
    /// Process exit status for this failure kind. 1 and 2 are left to
    /// configuration and usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::OpenSource { .. } => 3,
            Self::Metadata { .. } => 4,
            Self::ReadSource { .. } => 5,
            Self::Decode { .. } => 6,
            Self::CreateDestination { .. } => 7,
            Self::Encode(_) => 8,
            Self::Write { .. } => 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn io_err() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "gone")
    }

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let p = PathBuf::from("x.heic");
        let errors = [
            ConvertError::OpenSource { path: p.clone(), source: io_err() },
            ConvertError::Metadata { path: p.clone(), reason: "bad".into() },
            ConvertError::ReadSource { path: p.clone(), source: io_err() },
            ConvertError::Decode { path: p.clone(), reason: "bad".into() },
            ConvertError::CreateDestination { path: p.clone(), source: io_err() },
            ConvertError::Encode(image::ImageError::IoError(io_err())),
            ConvertError::Write { path: p, source: io_err() },
        ];

        let codes: HashSet<u8> = errors.iter().map(ConvertError::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|&c| c > 2));
    }

    #[test]
    fn message_names_the_path() {
        let err = ConvertError::OpenSource {
            path: PathBuf::from("missing.heic"),
            source: io_err(),
        };
        let msg = err.to_string();
        assert!(msg.contains("missing.heic"));
        assert!(msg.contains("gone"));
    }
}
