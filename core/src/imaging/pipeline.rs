use super::contrast::normalize;
use crate::dataset::StudyDataset;
use crate::error::{DicomcatError, Result};
use crate::types::NormalizedImage;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Suggested download name for the archive
pub const ARCHIVE_FILE_NAME: &str = "images.zip";

/// MIME type of the archive
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Prefix of the archive comment listing skipped frames
pub const SKIPPED_FRAMES_COMMENT: &str = "skipped frames: ";

/// Archive entry name for one frame of a source file
pub fn entry_name(source_name: &str, index: u32) -> String {
    format!("image_{}_{}.png", source_name, index)
}

/// Step of the per-frame loop at which a frame was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureStage {
    /// Frame samples could not be decoded
    Decode,
    /// Normalized image could not be encoded as PNG
    Encode,
    /// Archive entry could not be created
    CreateEntry,
    /// Encoded bytes could not be written into the entry
    Write,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureStage::Decode => "decode",
            FailureStage::Encode => "encode",
            FailureStage::CreateEntry => "create-entry",
            FailureStage::Write => "write",
        };
        write!(f, "{}", name)
    }
}

/// A frame that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameFailure {
    pub index: u32,
    pub stage: FailureStage,
    pub message: String,
}

/// Outcome of packaging one dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// Frames announced by the pixel data element
    pub frame_count: u32,
    /// Names of the entries written, in frame order
    pub entries: Vec<String>,
    /// Frames that were skipped, in frame order
    pub failures: Vec<FrameFailure>,
    /// The sink was closed before the archive was complete
    pub interrupted: bool,
}

impl ConversionReport {
    fn record(&mut self, index: u32, stage: FailureStage, error: impl fmt::Display) {
        warn!("Skipping frame {} at {} stage: {}", index, stage, error);
        self.failures.push(FrameFailure {
            index,
            stage,
            message: error.to_string(),
        });
    }

    /// Whether every frame made it into a finished archive
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    /// Comma-separated indices of the skipped frames
    pub fn skipped_frames(&self) -> String {
        self.failures
            .iter()
            .map(|f| f.index.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// A write failed because the reading end went away
fn is_closed_sink(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::BrokenPipe
}

/// Streams every frame of a dataset into `sink` as PNG entries of a zip archive
///
/// Each frame goes through decode, contrast normalization, PNG encoding and
/// entry creation. A frame failing at any step is recorded in the returned
/// report and skipped. The archive is written front to back without seeking,
/// so `sink` can be a socket or a pipe. Skipped frames are listed in the
/// archive comment (see [`SKIPPED_FRAMES_COMMENT`]) and the archive is always
/// finalized, unless `sink` reports [`io::ErrorKind::BrokenPipe`]: the loop
/// then stops and the report is marked `interrupted`.
///
/// # Errors
///
/// - [`DicomcatError::NoPixelData`] / [`DicomcatError::NoFrames`] before anything is written
/// - an archive or I/O error if the archive cannot be finalized
pub fn package_frames<D, W>(dataset: &D, source_name: &str, sink: W) -> Result<ConversionReport>
where
    D: StudyDataset + ?Sized,
    W: Write,
{
    let frame_count = dataset.frame_count()?;
    info!("Packaging {} frame(s) of {}", frame_count, source_name);

    let mut archive = ZipWriter::new_stream(sink);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut report = ConversionReport {
        frame_count,
        ..Default::default()
    };

    for index in 0..frame_count {
        let frame = match dataset.decode_frame(index) {
            Ok(frame) => frame,
            Err(e) => {
                report.record(index, FailureStage::Decode, e);
                continue;
            }
        };

        let png = match encode_png(&normalize(&frame)) {
            Ok(png) => png,
            Err(e) => {
                report.record(index, FailureStage::Encode, e);
                continue;
            }
        };

        let name = entry_name(source_name, index);
        match archive.start_file(name.as_str(), options) {
            Ok(()) => {}
            Err(ZipError::Io(e)) if is_closed_sink(&e) => {
                report.interrupted = true;
                break;
            }
            Err(e) => {
                report.record(index, FailureStage::CreateEntry, e);
                continue;
            }
        }
        match archive.write_all(&png) {
            Ok(()) => {}
            Err(e) if is_closed_sink(&e) => {
                report.interrupted = true;
                break;
            }
            Err(e) => {
                report.record(index, FailureStage::Write, e);
                continue;
            }
        }

        debug!("Wrote {} ({} bytes)", name, png.len());
        report.entries.push(name);
    }

    if report.interrupted {
        warn!(
            "Output of {} closed after {} of {} frame(s)",
            source_name,
            report.entries.len(),
            frame_count
        );
        return Ok(report);
    }

    if !report.failures.is_empty() {
        archive.set_comment(format!("{}{}", SKIPPED_FRAMES_COMMENT, report.skipped_frames()))?;
    }
    archive.finish().map_err(DicomcatError::from)?.flush()?;
    info!(
        "Packaged {} of {} frame(s) of {}",
        report.entries.len(),
        frame_count,
        source_name
    );
    Ok(report)
}

/// Encodes an 8-bit grayscale image as PNG
pub fn encode_png(image: &NormalizedImage) -> Result<Vec<u8>> {
    if image.columns() == 0 || image.rows() == 0 {
        return Err(DicomcatError::EncodeError(format!(
            "cannot encode a {}x{} image",
            image.columns(),
            image.rows()
        )));
    }
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(
        image.pixels(),
        image.columns(),
        image.rows(),
        ExtendedColorType::L8,
    )?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::types::PixelFrame;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn gradient(seed: u16) -> PixelFrame {
        PixelFrame::new(4, 2, (0..8).map(|i| seed + i * 100).collect()).unwrap()
    }

    fn package(dataset: &InMemoryDataset) -> (ConversionReport, Vec<u8>) {
        let mut cursor = Cursor::new(Vec::new());
        let report = package_frames(dataset, "IM0001", &mut cursor).unwrap();
        (report, cursor.into_inner())
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(str::to_string).collect::<Vec<_>>()
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("IM000001", 0), "image_IM000001_0.png");
        assert_eq!(entry_name("scan.dcm", 12), "image_scan.dcm_12.png");
    }

    #[test]
    fn test_broken_frame_is_skipped() {
        let dataset = InMemoryDataset::new()
            .with_frame(gradient(0))
            .with_frame(gradient(10))
            .with_broken_frame("corrupt fragment")
            .with_frame(gradient(20))
            .with_frame(gradient(30));

        let (report, bytes) = package(&dataset);

        assert_eq!(report.frame_count, 5);
        assert_eq!(
            report.entries,
            vec![
                "image_IM0001_0.png",
                "image_IM0001_1.png",
                "image_IM0001_3.png",
                "image_IM0001_4.png",
            ]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].stage, FailureStage::Decode);
        assert!(report.failures[0].message.contains("corrupt fragment"));
        assert!(!report.is_complete());

        let mut names = entry_names(&bytes);
        names.sort();
        assert_eq!(names, report.entries);

        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(std::str::from_utf8(archive.comment()).unwrap(), "skipped frames: 2");
    }

    #[test]
    fn test_entries_are_grayscale_png() {
        let dataset = InMemoryDataset::new().with_frame(gradient(1000));
        let (report, bytes) = package(&dataset);
        assert!(report.is_complete());

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name("image_IM0001_0.png").unwrap();
        let mut png = Vec::new();
        entry.read_to_end(&mut png).unwrap();

        let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .unwrap()
            .to_luma8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [0]);
        assert_eq!(decoded.get_pixel(3, 1).0, [255]);
    }

    #[test]
    fn test_all_frames_broken_still_finalizes() {
        let dataset = InMemoryDataset::new()
            .with_broken_frame("a")
            .with_broken_frame("b");
        let (report, bytes) = package(&dataset);
        assert!(report.entries.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert!(entry_names(&bytes).is_empty());
    }

    #[test]
    fn test_empty_frame_fails_at_encode() {
        let dataset = InMemoryDataset::new()
            .with_frame(PixelFrame::new(0, 0, Vec::new()).unwrap())
            .with_frame(gradient(0));
        let (report, _) = package(&dataset);
        assert_eq!(report.entries, vec!["image_IM0001_1.png"]);
        assert_eq!(report.failures[0].stage, FailureStage::Encode);
    }

    #[test]
    fn test_missing_pixel_data_writes_nothing() {
        let mut cursor = Cursor::new(Vec::new());
        let err = package_frames(&InMemoryDataset::new(), "x", &mut cursor).unwrap_err();
        assert!(matches!(err, DicomcatError::NoPixelData));
        assert!(cursor.into_inner().is_empty());

        let mut cursor = Cursor::new(Vec::new());
        let dataset = InMemoryDataset::new().with_empty_pixel_data();
        let err = package_frames(&dataset, "x", &mut cursor).unwrap_err();
        assert!(matches!(err, DicomcatError::NoFrames));
    }

    /// Accepts `remaining` bytes, then behaves like a closed pipe
    struct ClosingSink {
        remaining: usize,
    }

    impl Write for ClosingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader gone"));
            }
            let n = buf.len().min(self.remaining);
            self.remaining -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closed_sink_stops_the_loop() {
        let dataset = InMemoryDataset::new()
            .with_frame(gradient(0))
            .with_frame(gradient(10))
            .with_frame(gradient(20));

        let report = package_frames(&dataset, "IM0001", ClosingSink { remaining: 0 }).unwrap();

        assert!(report.interrupted);
        assert!(report.entries.is_empty());
        assert!(report.failures.is_empty());
        assert!(!report.is_complete());
    }

    #[test]
    fn test_complete_archive_has_no_comment() {
        let (report, bytes) = package(&InMemoryDataset::new().with_frame(gradient(0)));
        assert_eq!(report.skipped_frames(), "");
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(std::str::from_utf8(archive.comment()).unwrap(), "");
    }
}
