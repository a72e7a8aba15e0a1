use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use heic2jpeg::error::ConvertError;
use heic2jpeg::pipeline::Progress;
use heic2jpeg::{config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "heic2jpeg",
    version,
    about = "Convert a HEIC/HEIF photo to JPEG, printing its EXIF metadata along the way"
)]
struct Cli {
    /// Source image (default: config `source`, then sample.heic)
    #[arg(value_name = "SOURCE", env = "HEIC2JPEG_SOURCE")]
    source: Option<PathBuf>,

    /// Destination JPEG (default: the source with a .jpeg extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// JPEG quality, 1-100 (default: encoder default)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Path to config file (default: heic2jpeg.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config file and exit
    #[arg(long)]
    init: bool,

    /// Display the EXIF metadata and exit without converting
    #[arg(long = "show-exif")]
    show_exif: bool,

    /// Output the conversion report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ConvertError>() {
            // Already carries its cause in the message
            Some(convert_err) => {
                log::error!("{convert_err}");
                ExitCode::from(convert_err.exit_code())
            }
            None => {
                log::error!("{e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    // Load config, then let the command line override it
    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.quality.is_some() {
        config.jpeg.quality = cli.quality;
    }

    let source = config.resolve_source(cli.source.as_deref());

    // Handle --show-exif
    if cli.show_exif {
        let metadata = pipeline::inspect(&source)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        } else {
            println!("{metadata}");
        }
        return Ok(());
    }

    let destination = config.resolve_destination(&source, cli.output.as_deref());
    log::debug!("{} -> {}", source.display(), destination.display());

    // Plain mode prints each stage's output as soon as the stage completes
    let plain = !cli.json;
    if plain {
        println!("{}", pipeline::codec_version());
    }
    let print_metadata = config.output.print_metadata;
    let report = pipeline::convert_with(&source, &destination, &config.jpeg, |progress| {
        if !plain {
            return;
        }
        match progress {
            Progress::Metadata(record) if print_metadata => println!("{record}"),
            Progress::Metadata(_) => {}
            Progress::Decoded(image) => println!("{}", image.format),
            Progress::Writing(path) => println!("writing to {}", path.display()),
        }
    })?;

    if !plain {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    log::info!(
        "Wrote {}x{} JPEG ({} bytes)",
        report.width,
        report.height,
        report.bytes_written
    );
    Ok(())
}
