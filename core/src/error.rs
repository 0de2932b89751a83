use thiserror::Error;

/// Result type for dicomcat operations
pub type Result<T> = std::result::Result<T, DicomcatError>;

/// Error types for dicomcat operations
#[derive(Error, Debug)]
pub enum DicomcatError {
    /// Tag expression is neither `(GGGG,EEEE)` nor a decimal number
    #[error("Invalid tag address format: {0}")]
    InvalidAddressFormat(String),

    /// Tag not found in the dataset
    #[error("Tag not found in DICOM file: {0}")]
    TagNotFound(String),

    /// Dataset has no pixel data element
    #[error("No pixel data found")]
    NoPixelData,

    /// Pixel data element carries zero frames
    #[error("No pixel frame found")]
    NoFrames,

    /// Input file could not be decoded as a DICOM dataset
    #[error("Unable to decode DICOM file: {0}")]
    DecodeError(String),

    /// A single frame could not be decoded into samples
    #[error("Frame {index} could not be decoded: {reason}")]
    FrameDecode { index: u32, reason: String },

    /// Uploaded file has no content
    #[error("Uploaded file is empty")]
    EmptyUpload,

    /// Upload body could not be read
    #[error("Unable to read upload: {0}")]
    MalformedUpload(String),

    /// Required request field was not supplied
    #[error("Missing field: {0}")]
    MissingField(String),

    /// File name cannot be used as a storage key
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    /// Requested file does not exist in storage
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Storage directory or file I/O failed
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] std::io::Error),

    /// Archive container error
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// Raster encoding error
    #[error("Image encoding error: {0}")]
    EncodeError(String),

    /// Worker task failed before producing a result
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for DicomcatError {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io) => DicomcatError::StorageFailure(io),
            other => DicomcatError::ArchiveError(format!("{}", other)),
        }
    }
}

impl From<image::ImageError> for DicomcatError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => DicomcatError::StorageFailure(io),
            other => DicomcatError::EncodeError(format!("{}", other)),
        }
    }
}
