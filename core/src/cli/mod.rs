pub mod report;

use crate::dataset::{DatasetDecoder, DicomDecoder};
use crate::error::{DicomcatError, Result};
use crate::imaging::{package_frames, ConversionReport};
use crate::metadata::{self, MetadataAnswer};
use crate::server::ServerConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Command-line arguments for dicomcat
#[derive(Parser, Debug)]
#[command(name = "dicomcat")]
#[command(about = "DICOM upload, metadata lookup and PNG conversion service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append log output to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServerConfig),

    /// Print one tag, or every tag, of a DICOM file
    Metadata {
        /// Path to DICOM file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Tag as `(GGGG,EEEE)` or as a decimal number
        #[arg(short, long)]
        tag: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Write every frame of a DICOM file as PNG into a zip archive
    Convert {
        /// Path to DICOM file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Archive to create
        #[arg(short, long, default_value = crate::imaging::ARCHIVE_FILE_NAME)]
        output: PathBuf,
    },
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Answers a metadata query against a file on disk
pub fn inspect_file(file: &Path, tag: Option<&str>) -> Result<MetadataAnswer> {
    let bytes = std::fs::read(file)?;
    let dataset = DicomDecoder.decode(&bytes)?;
    metadata::query(&dataset, tag)
}

/// Converts a file on disk into a zip archive at `output`
pub fn convert_file(file: &Path, output: &Path) -> Result<ConversionReport> {
    let source_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DicomcatError::InvalidFileName(file.display().to_string()))?;
    let bytes = std::fs::read(file)?;
    let dataset = DicomDecoder.decode(&bytes)?;

    let mut archive = BufWriter::new(File::create(output)?);
    let report = package_frames(&dataset, source_name, &mut archive)?;
    archive.flush()?;
    Ok(report)
}
