use super::{DatasetElement, StudyDataset};
use crate::error::{DicomcatError, Result};
use crate::types::{AttributeCoordinate, PixelFrame};

/// A frame slot that either holds samples or fails to decode
#[derive(Debug, Clone)]
enum FrameSlot {
    Decodable(PixelFrame),
    Broken(String),
}

/// Synthetic dataset assembled in memory
///
/// # Example
///
/// ```
/// use dicomcat_core::dataset::{InMemoryDataset, StudyDataset};
/// use dicomcat_core::PixelFrame;
/// use dicom_core::Tag;
///
/// let dataset = InMemoryDataset::new()
///     .with_element(Tag(0x0010, 0x0010), "DOE^JANE")
///     .with_frame(PixelFrame::new(2, 1, vec![0, 1000]).unwrap())
///     .with_broken_frame("truncated fragment");
///
/// assert_eq!(dataset.frame_count().unwrap(), 2);
/// assert!(dataset.decode_frame(0).is_ok());
/// assert!(dataset.decode_frame(1).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    elements: Vec<DatasetElement>,
    frames: Option<Vec<FrameSlot>>,
}

impl InMemoryDataset {
    /// Creates a dataset with no elements and no pixel data
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element with an already rendered value
    pub fn with_element(
        mut self,
        coordinate: impl Into<AttributeCoordinate>,
        value: impl Into<String>,
    ) -> Self {
        self.elements.push(DatasetElement::new(coordinate, value));
        self
    }

    /// Adds a pixel data element with zero frames
    pub fn with_empty_pixel_data(mut self) -> Self {
        self.frames.get_or_insert_with(Vec::new);
        self
    }

    /// Appends a decodable frame
    pub fn with_frame(mut self, frame: PixelFrame) -> Self {
        self.frames
            .get_or_insert_with(Vec::new)
            .push(FrameSlot::Decodable(frame));
        self
    }

    /// Appends a frame that fails to decode with the given reason
    pub fn with_broken_frame(mut self, reason: impl Into<String>) -> Self {
        self.frames
            .get_or_insert_with(Vec::new)
            .push(FrameSlot::Broken(reason.into()));
        self
    }
}

impl StudyDataset for InMemoryDataset {
    fn elements(&self) -> Vec<DatasetElement> {
        self.elements.clone()
    }

    fn frame_count(&self) -> Result<u32> {
        match &self.frames {
            None => Err(DicomcatError::NoPixelData),
            Some(frames) if frames.is_empty() => Err(DicomcatError::NoFrames),
            Some(frames) => Ok(frames.len() as u32),
        }
    }

    fn decode_frame(&self, index: u32) -> Result<PixelFrame> {
        let slot = self
            .frames
            .as_ref()
            .ok_or(DicomcatError::NoPixelData)?
            .get(index as usize)
            .ok_or_else(|| DicomcatError::FrameDecode {
                index,
                reason: "frame index out of range".to_string(),
            })?;
        match slot {
            FrameSlot::Decodable(frame) => Ok(frame.clone()),
            FrameSlot::Broken(reason) => Err(DicomcatError::FrameDecode {
                index,
                reason: reason.clone(),
            }),
        }
    }
}
