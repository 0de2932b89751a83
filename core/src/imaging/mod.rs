//! Pixel data to viewable images
//!
//! [`contrast`] maps one 16-bit frame onto 8 bits; [`pipeline`] runs every
//! frame of a dataset through it and packages the PNGs into a zip archive.

pub mod contrast;
pub mod pipeline;

pub use contrast::{normalize, Window, MID_GRAY};
pub use pipeline::{
    entry_name, package_frames, ConversionReport, FailureStage, FrameFailure,
    ARCHIVE_CONTENT_TYPE, ARCHIVE_FILE_NAME, SKIPPED_FRAMES_COMMENT,
};
