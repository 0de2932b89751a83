pub mod cli;
pub mod dataset;
pub mod error;
pub mod imaging;
pub mod metadata;
pub mod server;
pub mod storage;
pub mod types;

pub use dataset::{DatasetDecoder, DicomDecoder, InMemoryDataset, StudyDataset};
pub use error::{DicomcatError, Result};
pub use imaging::{normalize, package_frames, ConversionReport};
pub use metadata::MetadataAnswer;
pub use storage::Storage;
pub use types::*;
