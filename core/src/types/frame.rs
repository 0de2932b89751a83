use crate::error::{DicomcatError, Result};

/// One 2-D grid of 16-bit grayscale samples, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFrame {
    columns: u32,
    rows: u32,
    samples: Vec<u16>,
}

impl PixelFrame {
    /// Creates a frame from row-major samples
    ///
    /// # Errors
    ///
    /// Returns an error if `samples.len()` does not equal `columns * rows`
    pub fn new(columns: u32, rows: u32, samples: Vec<u16>) -> Result<Self> {
        let expected = columns as usize * rows as usize;
        if samples.len() != expected {
            return Err(DicomcatError::DecodeError(format!(
                "frame of {}x{} needs {} samples, got {}",
                columns,
                rows,
                expected,
                samples.len()
            )));
        }
        Ok(Self {
            columns,
            rows,
            samples,
        })
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }
}

/// An 8-bit grayscale raster with the same layout as its source frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    columns: u32,
    rows: u32,
    pixels: Vec<u8>,
}

impl NormalizedImage {
    pub(crate) fn new(columns: u32, rows: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), columns as usize * rows as usize);
        Self {
            columns,
            rows,
            pixels,
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Value at column `x`, row `y`
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        self.pixels
            .get(y as usize * self.columns as usize + x as usize)
            .copied()
    }
}
