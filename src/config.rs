use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::encode::JpegOptions;

/// Source used when nothing else names one.
pub const DEFAULT_SOURCE: &str = "sample.heic";

/// File name of the config looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "heic2jpeg.json";

/// Persistent settings for the converter.
///
/// Every field is optional on disk; command-line arguments take precedence
/// over anything set here.
///
/// # Example
///
/// ```rust
/// use heic2jpeg::config::Config;
/// use std::path::Path;
///
/// let config = Config::default();
/// let source = config.resolve_source(None);
/// assert_eq!(source, Path::new("sample.heic"));
/// assert_eq!(config.resolve_destination(&source, None), Path::new("sample.jpeg"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source image. Falls back to [`DEFAULT_SOURCE`].
    pub source: Option<PathBuf>,
    /// Destination JPEG. Falls back to the source with a `.jpeg` extension.
    pub destination: Option<PathBuf>,
    /// JPEG encoder settings.
    pub jpeg: JpegOptions,
    /// Console output behavior.
    pub output: OutputConfig,
}

/// Console output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print the decoded EXIF metadata before converting.
    pub print_metadata: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            print_metadata: true,
        }
    }
}

impl Config {
    /// Resolve the config file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join(CONFIG_FILE_NAME))
    }

    /// Load config from the given path, or from the default location.
    ///
    /// A missing file yields the defaults; an explicitly named file that
    /// does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            if path.is_some() {
                bail!("Config file not found: {}", config_path.display());
            }
            log::debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        log::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if let Some(q) = self.jpeg.quality {
            if !(1..=100).contains(&q) {
                bail!("jpeg.quality must be between 1 and 100, got {q}");
            }
        }
        Ok(())
    }

    /// Pick the source path: explicit argument, then config, then
    /// [`DEFAULT_SOURCE`].
    pub fn resolve_source(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.source.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE))
    }

    /// Pick the destination path: explicit argument, then config, then the
    /// source with its extension replaced by `jpeg`.
    pub fn resolve_destination(&self, source: &Path, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.destination.clone())
            .unwrap_or_else(|| source.with_extension("jpeg"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.source, None);
        assert_eq!(config.jpeg.quality, None);
        assert!(config.output.print_metadata);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.source = Some(PathBuf::from("in.heic"));
        config.jpeg.quality = Some(90);
        config.output.print_metadata = false;
        config.save(Some(&path)).unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "destination": "out/photo.jpg" }"#).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.destination, Some(PathBuf::from("out/photo.jpg")));
        assert!(config.output.print_metadata);
        assert_eq!(config.jpeg, JpegOptions::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.json"))).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn out_of_range_quality_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("q.json");
        fs::write(&path, r#"{ "jpeg": { "quality": 0 } }"#).unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn source_precedence() {
        let mut config = Config::default();
        assert_eq!(config.resolve_source(None), PathBuf::from(DEFAULT_SOURCE));

        config.source = Some(PathBuf::from("config.heic"));
        assert_eq!(config.resolve_source(None), PathBuf::from("config.heic"));
        assert_eq!(
            config.resolve_source(Some(Path::new("cli.heic"))),
            PathBuf::from("cli.heic")
        );
    }

    #[test]
    fn destination_precedence() {
        let mut config = Config::default();
        let source = Path::new("photos/IMG_0001.HEIC");
        assert_eq!(
            config.resolve_destination(source, None),
            PathBuf::from("photos/IMG_0001.jpeg")
        );

        config.destination = Some(PathBuf::from("out.jpg"));
        assert_eq!(config.resolve_destination(source, None), PathBuf::from("out.jpg"));
        assert_eq!(
            config.resolve_destination(source, Some(Path::new("cli.jpg"))),
            PathBuf::from("cli.jpg")
        );
    }
}
