//! Decoder boundary
//!
//! The service never parses the binary file format itself. A decoded study is
//! reached through [`StudyDataset`], produced by a [`DatasetDecoder`]:
//! - [`DicomDecoder`]: real files, backed by `dicom-object` and `dicom-pixeldata`
//! - [`InMemoryDataset`]: synthetic datasets for tests and library callers

mod dicom;
mod memory;
pub mod tags;

pub use self::dicom::{DicomDataset, DicomDecoder};
pub use memory::InMemoryDataset;

use crate::error::Result;
use crate::types::{AttributeCoordinate, PixelFrame};

/// One attribute of a decoded dataset, with its value rendered for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetElement {
    pub coordinate: AttributeCoordinate,
    pub value: String,
}

impl DatasetElement {
    pub fn new(coordinate: impl Into<AttributeCoordinate>, value: impl Into<String>) -> Self {
        Self {
            coordinate: coordinate.into(),
            value: value.into(),
        }
    }
}

/// Read-only view of one decoded study file
pub trait StudyDataset {
    /// All attributes present in the dataset, in dataset order
    fn elements(&self) -> Vec<DatasetElement>;

    /// Number of frames carried by the pixel data element
    ///
    /// # Errors
    ///
    /// - [`DicomcatError::NoPixelData`](crate::DicomcatError::NoPixelData) if there is no pixel data element
    /// - [`DicomcatError::NoFrames`](crate::DicomcatError::NoFrames) if it carries zero frames
    fn frame_count(&self) -> Result<u32>;

    /// Decodes one frame into 16-bit grayscale samples
    fn decode_frame(&self, index: u32) -> Result<PixelFrame>;
}

/// Turns the raw bytes of a stored file into a dataset
pub trait DatasetDecoder: Send + Sync {
    type Dataset: StudyDataset + Send + 'static;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Dataset>;
}
